//! Arguments for the `analyze` subcommand.

use std::path::PathBuf;

use clap::Args;

use crate::core::model::AnalysisConfig;

/// Silence analysis over a media file.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Media file to analyze
    pub media: PathBuf,

    /// Silence threshold in dBFS
    #[arg(long, allow_hyphen_values = true)]
    pub threshold: Option<f64>,

    /// Minimum silence duration in milliseconds
    #[arg(long)]
    pub min_duration: Option<u32>,

    /// Merge silences separated by gaps up to this many milliseconds
    #[arg(long)]
    pub merge_gap: Option<u32>,

    /// Padding trimmed from the start of each silence, milliseconds
    #[arg(long)]
    pub pre_pad: Option<u32>,

    /// Padding trimmed from the end of each silence, milliseconds
    #[arg(long)]
    pub post_pad: Option<u32>,

    /// Preserve pauses shorter than this many milliseconds (0 disables)
    #[arg(long)]
    pub keep_short: Option<u32>,

    /// Gate detection with the voice-activity model
    #[arg(long)]
    pub use_vad: bool,

    /// Delegate detection to the external tool's silencedetect filter
    #[arg(long)]
    pub ffmpeg_detect: bool,

    /// Also admit short low-level runs as breath cuts
    #[arg(long)]
    pub breath: bool,

    /// Where to write the project document (default: next to the media)
    #[arg(long)]
    pub project: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Overlay the CLI overrides onto a base configuration.
    pub fn apply_overrides(&self, mut config: AnalysisConfig) -> AnalysisConfig {
        if let Some(v) = self.threshold {
            config.silence_threshold_db = v;
        }
        if let Some(v) = self.min_duration {
            config.silence_min_duration_ms = v;
        }
        if let Some(v) = self.merge_gap {
            config.merge_gap_ms = v;
        }
        if let Some(v) = self.pre_pad {
            config.pre_pad_ms = v;
        }
        if let Some(v) = self.post_pad {
            config.post_pad_ms = v;
        }
        if let Some(v) = self.keep_short {
            config.keep_short_pauses_ms = v;
        }
        if self.use_vad {
            config.use_vad = true;
        }
        if self.breath {
            config.breath_detection = true;
        }
        config
    }

    /// Project output path, defaulting to `<media stem>.autocut`.
    pub fn project_path(&self) -> PathBuf {
        self.project
            .clone()
            .unwrap_or_else(|| self.media.with_extension("autocut"))
    }
}
