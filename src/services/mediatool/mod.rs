//! External media tool capability.
//!
//! The core never decodes media containers itself; everything container-
//! shaped goes through the [`MediaTool`] trait, normally backed by
//! [`FfmpegTool`]. Injecting the capability keeps the pipelines testable
//! (see the mock) and keeps process plumbing out of the algorithms.

pub mod ffmpeg;
mod probe;

pub use ffmpeg::FfmpegTool;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::core::model::MediaInfo;
use crate::core::render::FilterGraph;
use crate::Result;

/// Progress sink for long tool invocations: receives elapsed media
/// seconds as the tool reports them.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// A progress sink that discards every report.
pub fn noop_progress() -> ProgressFn {
    Arc::new(|_| {})
}

/// Proxy output resolutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyResolution {
    P480,
    P720,
    P1080,
}

impl ProxyResolution {
    /// The ffmpeg scale target for this resolution.
    pub fn scale(&self) -> &'static str {
        match self {
            ProxyResolution::P480 => "854:480",
            ProxyResolution::P720 => "1280:720",
            ProxyResolution::P1080 => "1920:1080",
        }
    }
}

impl std::str::FromStr for ProxyResolution {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "480p" => Ok(ProxyResolution::P480),
            "720p" => Ok(ProxyResolution::P720),
            "1080p" => Ok(ProxyResolution::P1080),
            other => Err(format!("unknown proxy resolution: {}", other)),
        }
    }
}

/// Capability interface over the external transcoder/probe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Probe a media file for its stream metadata.
    async fn probe(&self, path: &Path) -> Result<MediaInfo>;

    /// Decode the audio track to a PCM WAV file at the requested rate.
    async fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        sample_rate: u32,
        mono: bool,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()>;

    /// Produce a lower-resolution preview copy.
    async fn generate_proxy(
        &self,
        input: &Path,
        output: &Path,
        resolution: ProxyResolution,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()>;

    /// Extract a single frame as an image, scaled to `width`.
    async fn extract_thumbnail(
        &self,
        input: &Path,
        time_sec: f64,
        output: &Path,
        width: u32,
    ) -> Result<()>;

    /// Run the `silencedetect` filter and return raw `(start, end)` pairs.
    async fn detect_silence_raw(
        &self,
        input: &Path,
        threshold_db: f64,
        min_duration_s: f64,
    ) -> Result<Vec<(f64, f64)>>;

    /// Run a trim/concat filter graph and re-encode to `output`.
    async fn render_concat(
        &self,
        input: &Path,
        output: &Path,
        graph: &FilterGraph,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()>;
}

/// Host OS key used by the statically-linked package layout.
pub(crate) fn platform_key() -> &'static str {
    if cfg!(target_os = "macos") {
        "darwin"
    } else if cfg!(target_os = "windows") {
        "win32"
    } else {
        "linux"
    }
}

pub(crate) fn binary_name(name: &str) -> String {
    if cfg!(target_os = "windows") {
        format!("{}.exe", name)
    } else {
        name.to_string()
    }
}

/// Locate a tool binary: bundled `bin/` beside the executable first, then
/// the static package directory keyed by host OS, then the system path.
pub fn find_tool_binary(name: &str) -> Option<PathBuf> {
    let file_name = binary_name(name);

    if let Ok(exe) = std::env::current_exe() {
        if let Some(exe_dir) = exe.parent() {
            let bundled = exe_dir.join("bin").join(&file_name);
            if bundled.is_file() {
                return Some(bundled);
            }
            let packaged = exe_dir
                .join("static-ffmpeg")
                .join(platform_key())
                .join(&file_name);
            if packaged.is_file() {
                return Some(packaged);
            }
        }
    }

    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .map(|dir| dir.join(&file_name))
        .find(|candidate| candidate.is_file())
}
