//! Core data model: media descriptors, cuts, and analysis configuration.
//!
//! All time values are kept in seconds (`f64`). Frame-accurate work happens
//! at export time, where seconds are quantized to the target timebase.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::AutoCutError;
use crate::Result;

/// Classification of a timeline cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CutType {
    /// Detected silence, removed by default.
    Silence,
    /// Detected breath, optionally removed.
    Breath,
    /// Explicitly kept speech.
    Keep,
    /// User-defined cut.
    Manual,
}

/// Immutable metadata descriptor for a probed media file.
///
/// Created once by the media probe and never mutated afterwards.
///
/// # Examples
///
/// ```rust
/// use autocut_cli::core::model::MediaInfo;
///
/// let info = MediaInfo {
///     duration: 120.0,
///     fps: 30.0,
///     sample_rate: 48_000,
///     ..MediaInfo::default()
/// };
/// assert_eq!(info.total_frames(), 3600);
/// assert_eq!(info.time_to_samples(0.5), 24_000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    /// Absolute path of the source file.
    pub file_path: PathBuf,
    /// Duration in seconds.
    pub duration: f64,
    /// Video frame rate; 0 when the file has no video stream.
    pub fps: f64,
    /// Video width in pixels.
    pub width: u32,
    /// Video height in pixels.
    pub height: u32,
    /// Video codec label as reported by the probe.
    pub video_codec: String,
    /// Audio codec label as reported by the probe.
    pub audio_codec: String,
    /// Audio sample rate in Hz; 0 when the file has no audio stream.
    pub sample_rate: u32,
    /// Audio channel count.
    pub channels: u16,
    /// Audio bit depth.
    pub bit_depth: u16,
    /// File size in bytes.
    pub file_size: u64,
}

impl MediaInfo {
    /// Whether the file carries a video stream.
    pub fn has_video(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Whether the file carries an audio stream.
    pub fn has_audio(&self) -> bool {
        self.sample_rate > 0
    }

    /// Total video frame count.
    pub fn total_frames(&self) -> u64 {
        if self.fps > 0.0 {
            (self.duration * self.fps) as u64
        } else {
            0
        }
    }

    /// Total audio sample count.
    pub fn total_samples(&self) -> u64 {
        (self.duration * self.sample_rate as f64) as u64
    }

    /// Convert a time in seconds to a frame index.
    pub fn time_to_frame(&self, time_sec: f64) -> u64 {
        (time_sec * self.fps) as u64
    }

    /// Convert a frame index to a time in seconds.
    pub fn frame_to_time(&self, frame: u64) -> f64 {
        if self.fps > 0.0 {
            frame as f64 / self.fps
        } else {
            0.0
        }
    }

    /// Convert a time in seconds to a sample index.
    pub fn time_to_samples(&self, time_sec: f64) -> u64 {
        (time_sec * self.sample_rate as f64) as u64
    }

    /// Convert a sample index to a time in seconds.
    pub fn samples_to_time(&self, samples: u64) -> f64 {
        if self.sample_rate > 0 {
            samples as f64 / self.sample_rate as f64
        } else {
            0.0
        }
    }
}

/// A contiguous region classified by the silence detector.
///
/// Detector-internal: segments exist only during a detector invocation and
/// are converted to [`Cut`]s before they escape.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Start in seconds.
    pub start: f64,
    /// End in seconds; `end >= start`.
    pub end: f64,
    /// Mean dBFS over the segment's frames.
    pub avg_db: f64,
    /// Peak dBFS over the segment's frames; `peak_db >= avg_db`.
    pub peak_db: f64,
    /// Whether the segment was classified as silence.
    pub is_silence: bool,
}

impl AudioSegment {
    /// Segment length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether two segments overlap in time.
    pub fn overlaps(&self, other: &AudioSegment) -> bool {
        self.start < other.end && self.end > other.start
    }

    /// Fuse two segments into their union span.
    ///
    /// Average levels are averaged, peak levels take the max.
    pub fn merge_with(&self, other: &AudioSegment) -> AudioSegment {
        AudioSegment {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            avg_db: (self.avg_db + other.avg_db) / 2.0,
            peak_db: self.peak_db.max(other.peak_db),
            is_silence: self.is_silence && other.is_silence,
        }
    }
}

/// A stable, user-editable cut interval on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cut {
    /// Opaque short identifier (first 8 hex chars of a UUIDv4).
    pub id: String,
    /// Start in seconds.
    pub start: f64,
    /// End in seconds; `end > start`.
    pub end: f64,
    /// Classification of the interval.
    pub cut_type: CutType,
    /// When false this cut is ignored by every derivation.
    pub enabled: bool,
    /// Optional free-form label.
    #[serde(default)]
    pub label: String,
    /// Mean dBFS at detection time.
    #[serde(default = "default_source_db")]
    pub source_avg_db: f64,
    /// Peak dBFS at detection time.
    #[serde(default = "default_source_db")]
    pub source_peak_db: f64,
}

fn default_source_db() -> f64 {
    -60.0
}

impl Cut {
    /// Create a new cut with a fresh short id.
    pub fn new(start: f64, end: f64, cut_type: CutType) -> Self {
        Self {
            id: new_cut_id(),
            start,
            end,
            cut_type,
            enabled: true,
            label: String::new(),
            source_avg_db: -60.0,
            source_peak_db: -60.0,
        }
    }

    /// Cut length in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether this cut will be removed from the program.
    ///
    /// Only enabled silence and breath cuts are removable; keep and manual
    /// cuts mark regions without removing them.
    pub fn is_removable(&self) -> bool {
        self.enabled && matches!(self.cut_type, CutType::Silence | CutType::Breath)
    }
}

/// Generate an opaque short cut identifier.
pub fn new_cut_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()[..8].to_string()
}

/// Silence analysis configuration.
///
/// A closed value type: every recognized knob is a field, validated at use
/// sites through [`AnalysisConfig::validate`]. Compared structurally.
///
/// # Examples
///
/// ```rust
/// use autocut_cli::core::model::AnalysisConfig;
///
/// let config = AnalysisConfig::default();
/// assert_eq!(config.silence_threshold_db, -30.0);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Absolute dBFS below which a frame is candidate silent.
    pub silence_threshold_db: f64,
    /// Half-width of the Schmitt-trigger band around the threshold.
    pub hysteresis_db: f64,

    /// Minimum length of a detected silent run, in milliseconds.
    pub silence_min_duration_ms: u32,
    /// Gaps up to this long between adjacent silent runs are fused.
    pub merge_gap_ms: u32,
    /// Runs shorter than this are preserved as natural speech pauses;
    /// 0 disables the filter.
    pub keep_short_pauses_ms: u32,

    /// Trimmed from the start of each silent run before emitting.
    pub pre_pad_ms: u32,
    /// Trimmed from the end of each silent run before emitting.
    pub post_pad_ms: u32,

    /// Analysis window size in milliseconds.
    pub frame_ms: u32,

    /// Re-admit short low-level runs as breath cuts.
    pub breath_detection: bool,
    /// Peak dBFS ceiling for a run to qualify as a breath.
    pub breath_threshold_db: f64,
    /// Minimum breath length in milliseconds.
    pub breath_min_duration_ms: u32,
    /// Maximum breath length in milliseconds.
    pub breath_max_duration_ms: u32,

    /// Gate the energy pipeline with a voice-activity detector.
    pub use_vad: bool,
    /// VAD aggressiveness, 0..=3; higher labels more frames non-speech.
    pub vad_aggressiveness: u8,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: -30.0,
            hysteresis_db: 3.0,
            silence_min_duration_ms: 500,
            merge_gap_ms: 300,
            keep_short_pauses_ms: 150,
            pre_pad_ms: 100,
            post_pad_ms: 150,
            frame_ms: 10,
            breath_detection: false,
            breath_threshold_db: -45.0,
            breath_min_duration_ms: 100,
            breath_max_duration_ms: 400,
            use_vad: false,
            vad_aggressiveness: 2,
        }
    }
}

impl AnalysisConfig {
    /// Validate every knob, rejecting non-finite thresholds and
    /// out-of-range durations.
    ///
    /// # Errors
    ///
    /// Returns [`AutoCutError::ConfigOutOfRange`] naming the first
    /// offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.silence_threshold_db.is_finite() {
            return Err(AutoCutError::config_out_of_range(
                "silence_threshold_db must be finite",
            ));
        }
        if !self.hysteresis_db.is_finite() || self.hysteresis_db < 0.0 {
            return Err(AutoCutError::config_out_of_range(
                "hysteresis_db must be finite and non-negative",
            ));
        }
        if !self.breath_threshold_db.is_finite() {
            return Err(AutoCutError::config_out_of_range(
                "breath_threshold_db must be finite",
            ));
        }
        if self.frame_ms == 0 {
            return Err(AutoCutError::config_out_of_range(
                "frame_ms must be at least 1",
            ));
        }
        if self.vad_aggressiveness > 3 {
            return Err(AutoCutError::config_out_of_range(
                "vad_aggressiveness must be in 0..=3",
            ));
        }
        if self.breath_detection && self.breath_min_duration_ms > self.breath_max_duration_ms {
            return Err(AutoCutError::config_out_of_range(
                "breath_min_duration_ms must not exceed breath_max_duration_ms",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_info_derived_accessors() {
        let info = MediaInfo {
            duration: 10.0,
            fps: 25.0,
            width: 1280,
            height: 720,
            sample_rate: 48_000,
            ..MediaInfo::default()
        };
        assert!(info.has_video());
        assert!(info.has_audio());
        assert_eq!(info.total_frames(), 250);
        assert_eq!(info.total_samples(), 480_000);
        assert_eq!(info.time_to_frame(2.0), 50);
        assert!((info.frame_to_time(50) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_media_info_audio_only() {
        let info = MediaInfo {
            duration: 5.0,
            sample_rate: 44_100,
            ..MediaInfo::default()
        };
        assert!(!info.has_video());
        assert!(info.has_audio());
        assert_eq!(info.total_frames(), 0);
        assert_eq!(info.frame_to_time(100), 0.0);
    }

    #[test]
    fn test_segment_merge_takes_union_and_peak() {
        let a = AudioSegment {
            start: 1.0,
            end: 2.0,
            avg_db: -50.0,
            peak_db: -40.0,
            is_silence: true,
        };
        let b = AudioSegment {
            start: 2.2,
            end: 3.0,
            avg_db: -46.0,
            peak_db: -36.0,
            is_silence: true,
        };
        let merged = a.merge_with(&b);
        assert_eq!(merged.start, 1.0);
        assert_eq!(merged.end, 3.0);
        assert_eq!(merged.peak_db, -36.0);
        assert_eq!(merged.avg_db, -48.0);
        assert!(merged.is_silence);
    }

    #[test]
    fn test_cut_removability() {
        let mut cut = Cut::new(1.0, 2.0, CutType::Silence);
        assert!(cut.is_removable());

        cut.enabled = false;
        assert!(!cut.is_removable());

        cut.enabled = true;
        cut.cut_type = CutType::Keep;
        assert!(!cut.is_removable());

        cut.cut_type = CutType::Breath;
        assert!(cut.is_removable());
    }

    #[test]
    fn test_cut_id_is_short_token() {
        let cut = Cut::new(0.0, 1.0, CutType::Manual);
        assert_eq!(cut.id.len(), 8);
        assert!(cut.id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_cut_serde_roundtrip() {
        let cut = Cut::new(1.5, 3.25, CutType::Silence);
        let json = serde_json::to_string(&cut).unwrap();
        let back: Cut = serde_json::from_str(&json).unwrap();
        assert_eq!(cut, back);
        assert!(json.contains("\"silence\""));
    }

    #[test]
    fn test_analysis_config_defaults_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn test_analysis_config_rejects_nan_threshold() {
        let config = AnalysisConfig {
            silence_threshold_db: f64::NAN,
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(AutoCutError::ConfigOutOfRange { .. })
        ));
    }

    #[test]
    fn test_analysis_config_rejects_unknown_fields() {
        let parsed: std::result::Result<AnalysisConfig, _> =
            serde_json::from_str(r#"{"silence_threshold_db": -30.0, "bogus_knob": 1}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_analysis_config_rejects_bad_vad_aggressiveness() {
        let config = AnalysisConfig {
            vad_aggressiveness: 4,
            ..AnalysisConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
