//! Application configuration for AutoCut.
//!
//! [`AppConfig`] aggregates general runtime options, detector defaults,
//! and render parameters. Configuration access goes through the
//! [`ConfigService`] trait so commands can be tested against a
//! [`TestConfigService`] while production loads a TOML file plus
//! `AUTOCUT_*` environment overrides.

pub mod service;
pub mod validation;

pub use service::{ConfigService, ProductionConfigService, TestConfigService};

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::model::AnalysisConfig;
use crate::Result;

/// Full application configuration.
///
/// # Examples
///
/// ```rust
/// use autocut_cli::config::AppConfig;
///
/// let config = AppConfig::default();
/// assert_eq!(config.general.audio_sample_rate, 48_000);
/// assert_eq!(config.render.video_crf, 18);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// General runtime options.
    pub general: GeneralConfig,
    /// Default detector knobs applied when the CLI does not override them.
    pub analysis: AnalysisConfig,
    /// Render encoding parameters.
    pub render: RenderConfig,
}

/// General runtime options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Worker pool size; clamped to the CPU count at runtime.
    pub max_concurrent_jobs: usize,
    /// Cache directory override; platform user-cache location when unset.
    pub cache_dir: Option<PathBuf>,
    /// Sample rate for extracted analysis audio.
    pub audio_sample_rate: u32,
    /// Default waveform bucket width in samples.
    pub waveform_bucket: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: num_cpus::get(),
            cache_dir: None,
            audio_sample_rate: 48_000,
            waveform_bucket: 256,
        }
    }
}

/// Render encoding parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// x264 constant rate factor.
    pub video_crf: u8,
    /// x264 preset name.
    pub video_preset: String,
    /// AAC bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            video_crf: 18,
            video_preset: "fast".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

impl AppConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        validation::validate_usize_range(
            "general.max_concurrent_jobs",
            self.general.max_concurrent_jobs,
            1,
            64,
        )?;
        validation::validate_enum(
            "general.audio_sample_rate",
            &self.general.audio_sample_rate.to_string(),
            &["8000", "16000", "22050", "32000", "44100", "48000"],
        )?;
        validation::validate_uint_range(
            "general.waveform_bucket",
            self.general.waveform_bucket,
            1,
            65_536,
        )?;
        validation::validate_uint_range("render.video_crf", self.render.video_crf as u32, 0, 51)?;
        validation::validate_enum(
            "render.video_preset",
            &self.render.video_preset,
            &[
                "ultrafast", "superfast", "veryfast", "faster", "fast", "medium", "slow",
                "slower", "veryslow",
            ],
        )?;
        self.analysis.validate()?;
        Ok(())
    }

    /// Resolve the effective cache directory.
    ///
    /// Falls back to the platform user-cache location when no override is
    /// configured.
    pub fn cache_dir(&self) -> PathBuf {
        self.general.cache_dir.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("autocut")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(AppConfig::default().validate().is_ok());
    }

    #[test]
    fn test_bad_crf_rejected() {
        let mut config = AppConfig::default();
        config.render.video_crf = 99;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_sample_rate_rejected() {
        let mut config = AppConfig::default();
        config.general.audio_sample_rate = 12_345;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = AppConfig::default();
        let text = toml::to_string(&config).unwrap();
        assert!(text.contains("[general]"));
        assert!(text.contains("[analysis]"));
        assert!(text.contains("[render]"));
        let back: AppConfig = toml::from_str(&text).unwrap();
        assert_eq!(config, back);
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = AppConfig::default();
        config.general.cache_dir = Some(PathBuf::from("/tmp/custom-cache"));
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/custom-cache"));
    }
}
