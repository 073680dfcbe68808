//! FFmpeg/FFprobe implementation of the [`MediaTool`] capability.
//!
//! Every invocation is a child process driven through tokio: simple
//! commands run to completion under a stage timeout, long-running
//! commands stream progress (`-progress pipe:1` on stdout, `time=` stats
//! on stderr) and honor cooperative cancellation by killing the child.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::probe::parse_probe_output;
use super::{find_tool_binary, MediaTool, ProgressFn, ProxyResolution};
use crate::core::model::MediaInfo;
use crate::core::render::FilterGraph;
use crate::error::AutoCutError;
use crate::Result;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const THUMBNAIL_TIMEOUT: Duration = Duration::from_secs(30);
const DETECT_TIMEOUT: Duration = Duration::from_secs(300);
const EXTRACT_TIMEOUT: Duration = Duration::from_secs(3600);

/// How many trailing tool-output lines errors carry.
const ERROR_TAIL_LINES: usize = 20;

static SILENCE_START_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_start:\s*(-?[\d.]+)").unwrap());
static SILENCE_END_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"silence_end:\s*(-?[\d.]+)").unwrap());
static OUT_TIME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^out_time_ms=(\d+)").unwrap());
static STATS_TIME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"time=(\d+):(\d{2}):(\d{2}(?:\.\d+)?)").unwrap());

/// Render encoding settings applied by [`FfmpegTool::render_concat`].
#[derive(Debug, Clone)]
pub struct RenderSettings {
    /// x264 constant rate factor.
    pub video_crf: u8,
    /// x264 preset name.
    pub video_preset: String,
    /// AAC bitrate in kbit/s.
    pub audio_bitrate_kbps: u32,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            video_crf: 18,
            video_preset: "fast".to_string(),
            audio_bitrate_kbps: 192,
        }
    }
}

/// Command-line FFmpeg/FFprobe wrapper.
pub struct FfmpegTool {
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    render: RenderSettings,
}

impl FfmpegTool {
    /// Locate the binaries through the standard search order.
    ///
    /// # Errors
    ///
    /// Returns [`AutoCutError::MediaToolMissing`] naming the searched
    /// locations; callers report this once at startup.
    pub fn discover() -> Result<Self> {
        let ffmpeg = find_tool_binary("ffmpeg").ok_or_else(|| {
            AutoCutError::media_tool_missing(
                "ffmpeg (searched bundled bin/, static package dir, system PATH)",
            )
        })?;
        let ffprobe = find_tool_binary("ffprobe").ok_or_else(|| {
            AutoCutError::media_tool_missing(
                "ffprobe (searched bundled bin/, static package dir, system PATH)",
            )
        })?;
        info!("FFmpeg: {}", ffmpeg.display());
        info!("FFprobe: {}", ffprobe.display());
        Ok(Self {
            ffmpeg,
            ffprobe,
            render: RenderSettings::default(),
        })
    }

    /// Build a tool over explicit binary paths.
    pub fn with_paths(ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        Self {
            ffmpeg,
            ffprobe,
            render: RenderSettings::default(),
        }
    }

    /// Override the render encoding settings.
    pub fn set_render_settings(&mut self, settings: RenderSettings) {
        self.render = settings;
    }

    /// Run a short command to completion under a stage timeout.
    async fn run_to_completion(
        &self,
        program: &Path,
        args: &[String],
        stage: &str,
        timeout: Duration,
    ) -> Result<std::process::Output> {
        debug!("Running {} {}", program.display(), args.join(" "));
        let output = tokio::time::timeout(
            timeout,
            Command::new(program)
                .args(args)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| AutoCutError::timeout(stage, timeout))??;
        Ok(output)
    }

    /// Spawn a long-running ffmpeg invocation, streaming stdout/stderr
    /// through the given line handlers until exit, cancellation, or
    /// timeout.
    async fn run_streaming(
        &self,
        args: &[String],
        stage: &str,
        timeout: Option<Duration>,
        on_stdout_line: impl Fn(&str) + Send + 'static,
        on_stderr_line: impl Fn(&str) + Send + 'static,
        cancel: CancellationToken,
    ) -> Result<std::process::ExitStatus> {
        debug!("Running {} {}", self.ffmpeg.display(), args.join(" "));
        let mut child = Command::new(&self.ffmpeg)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_task = tokio::spawn(async move {
            if let Some(stream) = stdout {
                consume_lines(stream, on_stdout_line).await;
            }
        });
        let stderr_task = tokio::spawn(async move {
            if let Some(stream) = stderr {
                consume_lines(stream, on_stderr_line).await;
            }
        });

        // Resolve the select before touching the child again so its
        // mutable borrow inside the wait future has been released.
        let outcome = tokio::select! {
            _ = cancel.cancelled() => None,
            status = wait_with_optional_timeout(&mut child, timeout) => Some(status),
        };
        let status = match outcome {
            None => {
                warn!("{} cancelled, killing child process", stage);
                let _ = child.kill().await;
                return Err(AutoCutError::Cancelled);
            }
            Some(Err(limit)) => {
                let _ = child.kill().await;
                return Err(AutoCutError::timeout(stage, limit));
            }
            Some(Ok(status)) => status?,
        };

        let _ = stdout_task.await;
        let _ = stderr_task.await;
        Ok(status)
    }
}

async fn wait_with_optional_timeout(
    child: &mut tokio::process::Child,
    timeout: Option<Duration>,
) -> std::result::Result<std::io::Result<std::process::ExitStatus>, Duration> {
    match timeout {
        Some(limit) => tokio::time::timeout(limit, child.wait())
            .await
            .map_err(|_| limit),
        None => Ok(child.wait().await),
    }
}

/// Feed a stream to a line handler, splitting on both `\n` and `\r`
/// (ffmpeg stats lines are carriage-return terminated).
async fn consume_lines<R>(mut stream: R, on_line: impl Fn(&str))
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut buf = [0u8; 4096];
    let mut pending: Vec<u8> = Vec::new();
    loop {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for &byte in &buf[..n] {
                    if byte == b'\n' || byte == b'\r' {
                        if !pending.is_empty() {
                            on_line(&String::from_utf8_lossy(&pending));
                            pending.clear();
                        }
                    } else {
                        pending.push(byte);
                    }
                }
            }
        }
    }
    if !pending.is_empty() {
        on_line(&String::from_utf8_lossy(&pending));
    }
}

/// Parse a `time=HH:MM:SS.ff` stats fragment into seconds.
fn parse_stats_time(line: &str) -> Option<f64> {
    let caps = STATS_TIME_RE.captures(line)?;
    let hours: f64 = caps[1].parse().ok()?;
    let minutes: f64 = caps[2].parse().ok()?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

/// Parse an `out_time_ms=` progress line into seconds.
///
/// Despite the name the value is in microseconds.
fn parse_out_time(line: &str) -> Option<f64> {
    let caps = OUT_TIME_RE.captures(line)?;
    let micros: f64 = caps[1].parse().ok()?;
    Some(micros / 1_000_000.0)
}

fn tail_collector() -> (Arc<Mutex<VecDeque<String>>>, impl Fn(&str) + Send + 'static) {
    let tail = Arc::new(Mutex::new(VecDeque::with_capacity(ERROR_TAIL_LINES)));
    let sink = Arc::clone(&tail);
    let collect = move |line: &str| {
        let mut tail = sink.lock().unwrap();
        if tail.len() == ERROR_TAIL_LINES {
            tail.pop_front();
        }
        tail.push_back(line.to_string());
    };
    (tail, collect)
}

fn drain_tail(tail: &Arc<Mutex<VecDeque<String>>>) -> String {
    tail.lock()
        .unwrap()
        .iter()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

#[async_trait]
impl MediaTool for FfmpegTool {
    async fn probe(&self, path: &Path) -> Result<MediaInfo> {
        std::fs::metadata(path)?;
        let args = vec![
            "-v".to_string(),
            "quiet".to_string(),
            "-print_format".to_string(),
            "json".to_string(),
            "-show_format".to_string(),
            "-show_streams".to_string(),
            path.to_string_lossy().into_owned(),
        ];
        let output = self
            .run_to_completion(&self.ffprobe, &args, "Probe", PROBE_TIMEOUT)
            .await?;
        if !output.status.success() {
            return Err(AutoCutError::invalid_media(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        parse_probe_output(path, &String::from_utf8_lossy(&output.stdout))
    }

    async fn extract_audio(
        &self,
        input: &Path,
        output: &Path,
        sample_rate: u32,
        mono: bool,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec![
            "-y".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-stats_period".to_string(),
            "0.5".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vn".to_string(),
            "-acodec".to_string(),
            "pcm_s16le".to_string(),
            "-ar".to_string(),
            sample_rate.to_string(),
            "-ac".to_string(),
            if mono { "1" } else { "2" }.to_string(),
            "-f".to_string(),
            "wav".to_string(),
            output.to_string_lossy().into_owned(),
        ];

        let (tail, collect) = tail_collector();
        let status = self
            .run_streaming(
                &args,
                "Audio extraction",
                Some(EXTRACT_TIMEOUT),
                move |line| {
                    if let Some(seconds) = parse_out_time(line) {
                        progress(seconds);
                    }
                },
                collect,
                cancel,
            )
            .await?;

        if !status.success() {
            return Err(AutoCutError::invalid_audio(format!(
                "ffmpeg extraction failed (code {:?}):\n{}",
                status.code(),
                drain_tail(&tail)
            )));
        }
        Ok(())
    }

    async fn generate_proxy(
        &self,
        input: &Path,
        output: &Path,
        resolution: ProxyResolution,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec![
            "-y".to_string(),
            "-progress".to_string(),
            "pipe:1".to_string(),
            "-stats_period".to_string(),
            "0.5".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vf".to_string(),
            format!(
                "scale={}:force_original_aspect_ratio=decrease",
                resolution.scale()
            ),
            "-c:v".to_string(),
            "libx264".to_string(),
            "-preset".to_string(),
            "ultrafast".to_string(),
            "-crf".to_string(),
            "28".to_string(),
            "-c:a".to_string(),
            "aac".to_string(),
            "-b:a".to_string(),
            "128k".to_string(),
            output.to_string_lossy().into_owned(),
        ];

        let (tail, collect) = tail_collector();
        let status = self
            .run_streaming(
                &args,
                "Proxy generation",
                Some(EXTRACT_TIMEOUT),
                move |line| {
                    if let Some(seconds) = parse_out_time(line) {
                        progress(seconds);
                    }
                },
                collect,
                cancel,
            )
            .await?;

        if !status.success() {
            return Err(AutoCutError::render_failed(format!(
                "proxy generation failed (code {:?}):\n{}",
                status.code(),
                drain_tail(&tail)
            )));
        }
        Ok(())
    }

    async fn extract_thumbnail(
        &self,
        input: &Path,
        time_sec: f64,
        output: &Path,
        width: u32,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = vec![
            "-y".to_string(),
            "-ss".to_string(),
            time_sec.to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-vframes".to_string(),
            "1".to_string(),
            "-vf".to_string(),
            format!("scale={}:-1", width),
            output.to_string_lossy().into_owned(),
        ];
        let result = self
            .run_to_completion(&self.ffmpeg, &args, "Thumbnail", THUMBNAIL_TIMEOUT)
            .await?;
        if !result.status.success() {
            return Err(AutoCutError::render_failed(format!(
                "frame extraction failed: {}",
                String::from_utf8_lossy(&result.stderr).trim()
            )));
        }
        Ok(())
    }

    async fn detect_silence_raw(
        &self,
        input: &Path,
        threshold_db: f64,
        min_duration_s: f64,
    ) -> Result<Vec<(f64, f64)>> {
        let args = vec![
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-af".to_string(),
            format!("silencedetect=n={}dB:d={}", threshold_db, min_duration_s),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ];
        let output = self
            .run_to_completion(&self.ffmpeg, &args, "Silence detection", DETECT_TIMEOUT)
            .await?;
        if !output.status.success() {
            return Err(AutoCutError::invalid_audio(format!(
                "silencedetect failed: {}",
                String::from_utf8_lossy(&output.stderr)
                    .lines()
                    .last()
                    .unwrap_or_default()
            )));
        }

        // The filter logs on stderr.
        let log = String::from_utf8_lossy(&output.stderr);
        Ok(parse_silencedetect_log(&log))
    }

    async fn render_concat(
        &self,
        input: &Path,
        output: &Path,
        graph: &FilterGraph,
        progress: ProgressFn,
        cancel: CancellationToken,
    ) -> Result<()> {
        if let Some(parent) = output.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut args = vec![
            "-y".to_string(),
            "-i".to_string(),
            input.to_string_lossy().into_owned(),
            "-filter_complex".to_string(),
            graph.filter_complex.clone(),
        ];
        let has_video = graph.maps.iter().any(|m| m == "[outv]");
        let has_audio = graph.maps.iter().any(|m| m == "[outa]");
        for map in &graph.maps {
            args.push("-map".to_string());
            args.push(map.clone());
        }
        if has_video {
            args.extend([
                "-c:v".to_string(),
                "libx264".to_string(),
                "-preset".to_string(),
                self.render.video_preset.clone(),
                "-crf".to_string(),
                self.render.video_crf.to_string(),
            ]);
        }
        if has_audio {
            args.extend([
                "-c:a".to_string(),
                "aac".to_string(),
                "-b:a".to_string(),
                format!("{}k", self.render.audio_bitrate_kbps),
            ]);
        }
        args.push(output.to_string_lossy().into_owned());

        let (tail, collect) = tail_collector();
        let stderr_progress = Arc::clone(&progress);
        // Render is unbounded; cancellation is the only way out.
        let status = self
            .run_streaming(
                &args,
                "Render",
                None,
                |_line| {},
                move |line| {
                    if let Some(seconds) = parse_stats_time(line) {
                        stderr_progress(seconds);
                    }
                    collect(line);
                },
                cancel,
            )
            .await?;

        if !status.success() {
            return Err(AutoCutError::render_failed(format!(
                "ffmpeg exited with code {:?}:\n{}",
                status.code(),
                drain_tail(&tail)
            )));
        }
        Ok(())
    }
}

/// Extract `(silence_start, silence_end)` pairs from the filter log.
///
/// A trailing unmatched `silence_start` (stream ended inside silence) is
/// dropped; the detector's local stages have no end to work with.
fn parse_silencedetect_log(log: &str) -> Vec<(f64, f64)> {
    let mut starts = Vec::new();
    let mut ends = Vec::new();
    for line in log.lines() {
        if let Some(caps) = SILENCE_START_RE.captures(line) {
            if let Ok(v) = caps[1].parse::<f64>() {
                starts.push(v.max(0.0));
            }
        }
        if let Some(caps) = SILENCE_END_RE.captures(line) {
            if let Ok(v) = caps[1].parse::<f64>() {
                ends.push(v);
            }
        }
    }
    starts
        .into_iter()
        .zip(ends)
        .filter(|(start, end)| end > start)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_silencedetect_log() {
        let log = "\
[silencedetect @ 0x7f8] silence_start: 1.234\n\
frame=  100 fps=0.0\n\
[silencedetect @ 0x7f8] silence_end: 5.678 | silence_duration: 4.444\n\
[silencedetect @ 0x7f8] silence_start: 10.5\n\
[silencedetect @ 0x7f8] silence_end: 12 | silence_duration: 1.5\n";
        let pairs = parse_silencedetect_log(log);
        assert_eq!(pairs, vec![(1.234, 5.678), (10.5, 12.0)]);
    }

    #[test]
    fn test_parse_silencedetect_dangling_start_dropped() {
        let log = "\
[silencedetect @ 0x7f8] silence_start: 1.0\n\
[silencedetect @ 0x7f8] silence_end: 2.0 | silence_duration: 1.0\n\
[silencedetect @ 0x7f8] silence_start: 9.0\n";
        let pairs = parse_silencedetect_log(log);
        assert_eq!(pairs, vec![(1.0, 2.0)]);
    }

    #[test]
    fn test_parse_silencedetect_negative_start_clamped() {
        let log = "[silencedetect @ 0x7f8] silence_start: -0.01\n\
[silencedetect @ 0x7f8] silence_end: 3.0 | silence_duration: 3.01\n";
        let pairs = parse_silencedetect_log(log);
        assert_eq!(pairs, vec![(0.0, 3.0)]);
    }

    #[test]
    fn test_parse_stats_time() {
        assert_eq!(parse_stats_time("frame=1 time=00:00:10.50 bitrate=x"), Some(10.5));
        assert_eq!(
            parse_stats_time("time=01:02:03.04"),
            Some(3723.04)
        );
        assert_eq!(parse_stats_time("no time here"), None);
    }

    #[test]
    fn test_parse_out_time() {
        assert_eq!(parse_out_time("out_time_ms=1500000"), Some(1.5));
        assert_eq!(parse_out_time("out_time=00:00:01.5"), None);
        assert_eq!(parse_out_time("progress=continue"), None);
    }

    #[tokio::test]
    async fn test_consume_lines_splits_cr_and_lf() {
        let data: &[u8] = b"line one\nframe=1 time=00:00:01.00\rline three";
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        consume_lines(data, move |line| sink.lock().unwrap().push(line.to_string())).await;
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["line one", "frame=1 time=00:00:01.00", "line three"]
        );
    }
}
