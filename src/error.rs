//! Error types for AutoCut core operations.
//!
//! This module defines the `AutoCutError` enum covering all error conditions
//! that can occur during media probing, audio extraction, silence detection,
//! edit-decision export, and rendering.
//!
//! It also provides helper methods to construct errors and generate
//! user-friendly messages.
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Represents all possible errors in the AutoCut application.
///
/// Each variant provides specific context to facilitate debugging and
/// user-friendly reporting.
///
/// # Examples
///
/// ```rust
/// use autocut_cli::error::{AutoCutError, AutoCutResult};
///
/// fn example() -> AutoCutResult<()> {
///     Err(AutoCutError::invalid_audio("zero samples in PCM stream"))
/// }
/// ```
///
/// # Exit Codes
///
/// Each error variant maps to an exit code via `AutoCutError::exit_code`.
#[derive(Error, Debug)]
pub enum AutoCutError {
    /// I/O operation failed during file system access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error due to invalid or missing settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// The external media tool (ffmpeg/ffprobe) could not be located.
    ///
    /// Fatal for every job; reported once at startup.
    #[error("Media tool not found: {0}")]
    MediaToolMissing(String),

    /// The file probed successfully but carries no usable video or audio,
    /// or its declared duration is zero.
    #[error("Invalid media file: {message}")]
    InvalidMedia {
        /// Why the media is unusable
        message: String,
    },

    /// The PCM stream could not be read or produced zero samples.
    #[error("Invalid audio: {message}")]
    InvalidAudio {
        /// Why the audio stream is unusable
        message: String,
    },

    /// A detector knob is non-finite or outside its documented range.
    #[error("Analysis config out of range: {message}")]
    ConfigOutOfRange {
        /// Which knob failed validation and why
        message: String,
    },

    /// Render was asked to write its output over the source file.
    #[error("Output path equals input path: {0}")]
    SameFileRefused(PathBuf),

    /// The external tool exited non-zero or produced no output file.
    #[error("Render failed: {message}")]
    RenderFailed {
        /// Failure description, including trailing tool output when available
        message: String,
    },

    /// A job observed cancellation at a checkpoint.
    #[error("Operation cancelled")]
    Cancelled,

    /// A stage exceeded its wall-clock budget.
    #[error("{stage} timed out (limit: {limit:?})")]
    Timeout {
        /// Which pipeline stage hit the limit
        stage: String,
        /// The elapsed-time budget that was exceeded
        limit: Duration,
    },

    /// A waveform cache archive failed to decode.
    ///
    /// Callers treat this as a cache miss and recompute.
    #[error("Waveform cache corrupt: {0}")]
    CacheCorrupt(PathBuf),

    /// Generic job execution error.
    #[error("{0}")]
    JobExecution(String),

    /// Catch-all error variant wrapping any other failure.
    #[error("Unknown error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for AutoCutError {
    fn from(err: serde_json::Error) -> Self {
        AutoCutError::Config {
            message: format!("JSON serialization/deserialization error: {}", err),
        }
    }
}

impl From<config::ConfigError> for AutoCutError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => AutoCutError::Config {
                message: format!("Configuration file not found: {}", path),
            },
            config::ConfigError::Message(msg) => AutoCutError::Config { message: msg },
            _ => AutoCutError::Config {
                message: format!("Configuration error: {}", err),
            },
        }
    }
}

impl From<hound::Error> for AutoCutError {
    fn from(err: hound::Error) -> Self {
        AutoCutError::invalid_audio(err.to_string())
    }
}

/// Specialized `Result` type for AutoCut operations.
pub type AutoCutResult<T> = Result<T, AutoCutError>;

impl AutoCutError {
    /// Create a configuration error with the given message.
    pub fn config<S: Into<String>>(message: S) -> Self {
        AutoCutError::Config {
            message: message.into(),
        }
    }

    /// Create a media-tool-missing error listing the searched locations.
    pub fn media_tool_missing<S: Into<String>>(message: S) -> Self {
        AutoCutError::MediaToolMissing(message.into())
    }

    /// Create an invalid-media error with the given message.
    pub fn invalid_media<S: Into<String>>(message: S) -> Self {
        AutoCutError::InvalidMedia {
            message: message.into(),
        }
    }

    /// Create an invalid-audio error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use autocut_cli::error::AutoCutError;
    /// let err = AutoCutError::invalid_audio("decode failed");
    /// assert_eq!(err.to_string(), "Invalid audio: decode failed");
    /// ```
    pub fn invalid_audio<S: Into<String>>(message: S) -> Self {
        AutoCutError::InvalidAudio {
            message: message.into(),
        }
    }

    /// Create a config-out-of-range error naming the offending knob.
    pub fn config_out_of_range<S: Into<String>>(message: S) -> Self {
        AutoCutError::ConfigOutOfRange {
            message: message.into(),
        }
    }

    /// Create a render failure with the given message.
    pub fn render_failed<S: Into<String>>(message: S) -> Self {
        AutoCutError::RenderFailed {
            message: message.into(),
        }
    }

    /// Create a timeout error for the given stage and limit.
    pub fn timeout<S: Into<String>>(stage: S, limit: Duration) -> Self {
        AutoCutError::Timeout {
            stage: stage.into(),
            limit,
        }
    }

    /// Create a job execution failure with job ID and reason.
    pub fn job_execution_failed(job_id: String, reason: String) -> Self {
        AutoCutError::JobExecution(format!("Job {} execution failed: {}", job_id, reason))
    }

    /// Return the corresponding exit code for this error variant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use autocut_cli::error::AutoCutError;
    /// assert_eq!(AutoCutError::config("x").exit_code(), 2);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            AutoCutError::Io(_) => 1,
            AutoCutError::Config { .. } => 2,
            AutoCutError::ConfigOutOfRange { .. } => 2,
            AutoCutError::MediaToolMissing(_) => 3,
            AutoCutError::InvalidMedia { .. } => 4,
            AutoCutError::InvalidAudio { .. } => 5,
            AutoCutError::SameFileRefused(_) => 6,
            AutoCutError::RenderFailed { .. } => 7,
            AutoCutError::Timeout { .. } => 8,
            AutoCutError::Cancelled => 9,
            _ => 1,
        }
    }

    /// Return a user-friendly error message with suggested remedies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use autocut_cli::error::AutoCutError;
    /// let msg = AutoCutError::config("missing key").user_friendly_message();
    /// assert!(msg.contains("Configuration error:"));
    /// ```
    pub fn user_friendly_message(&self) -> String {
        match self {
            AutoCutError::Io(e) => format!("File operation error: {}", e),
            AutoCutError::Config { message } => format!(
                "Configuration error: {}\nHint: run 'autocut config --help' for details",
                message
            ),
            AutoCutError::MediaToolMissing(msg) => format!(
                "FFmpeg not found: {}\nHint: install FFmpeg and ensure it is on your PATH",
                msg
            ),
            AutoCutError::InvalidMedia { message } => format!(
                "Invalid media file: {}\nHint: the file must contain at least one audio or video stream",
                message
            ),
            AutoCutError::InvalidAudio { message } => format!(
                "Audio processing error: {}\nHint: ensure media file integrity and support",
                message
            ),
            AutoCutError::ConfigOutOfRange { message } => format!(
                "Analysis configuration error: {}\nHint: check threshold and duration values",
                message
            ),
            AutoCutError::SameFileRefused(path) => format!(
                "Refusing to overwrite the source file: {}\nHint: choose a different output path",
                path.display()
            ),
            AutoCutError::RenderFailed { message } => format!(
                "Render failed: {}\nHint: re-run with --debug for the full FFmpeg log",
                message
            ),
            AutoCutError::Cancelled => "Operation cancelled".to_string(),
            AutoCutError::Timeout { stage, limit } => {
                format!("{} timed out after {:?}", stage, limit)
            }
            AutoCutError::CacheCorrupt(path) => {
                format!("Waveform cache corrupt (will recompute): {}", path.display())
            }
            AutoCutError::JobExecution(msg) => msg.clone(),
            AutoCutError::Other(err) => {
                format!("Unknown error: {}\nHint: please report this issue", err)
            }
        }
    }
}

// Unit test: AutoCutError error types and helper methods
#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_error_creation() {
        let error = AutoCutError::config("test config error");
        assert!(matches!(error, AutoCutError::Config { .. }));
        assert_eq!(error.to_string(), "Configuration error: test config error");
    }

    #[test]
    fn test_invalid_audio_error_creation() {
        let error = AutoCutError::invalid_audio("decode failed");
        assert!(matches!(error, AutoCutError::InvalidAudio { .. }));
        assert_eq!(error.to_string(), "Invalid audio: decode failed");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: AutoCutError = io_error.into();
        assert!(matches!(err, AutoCutError::Io(_)));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(AutoCutError::config("x").exit_code(), 2);
        assert_eq!(AutoCutError::media_tool_missing("x").exit_code(), 3);
        assert_eq!(AutoCutError::invalid_media("x").exit_code(), 4);
        assert_eq!(AutoCutError::invalid_audio("x").exit_code(), 5);
        assert_eq!(
            AutoCutError::SameFileRefused(PathBuf::from("/a")).exit_code(),
            6
        );
        assert_eq!(AutoCutError::render_failed("x").exit_code(), 7);
        assert_eq!(AutoCutError::Cancelled.exit_code(), 9);
    }

    #[test]
    fn test_user_friendly_messages() {
        let config_error = AutoCutError::config("missing key");
        let message = config_error.user_friendly_message();
        assert!(message.contains("Configuration error:"));
        assert!(message.contains("autocut config --help"));

        let tool_error = AutoCutError::media_tool_missing("searched bin/, PATH");
        let message = tool_error.user_friendly_message();
        assert!(message.contains("FFmpeg not found:"));
        assert!(message.contains("install FFmpeg"));
    }

    #[test]
    fn test_timeout_carries_stage_and_limit() {
        let err = AutoCutError::timeout("Probe", Duration::from_secs(30));
        assert!(err.to_string().contains("Probe"));
        assert_eq!(err.exit_code(), 8);
    }
}
