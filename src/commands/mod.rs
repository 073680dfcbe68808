//! Executable command implementations behind the CLI.

pub mod analyze_command;
pub mod cache_command;
pub mod config_command;
pub mod dispatcher;
pub mod export_command;
pub mod generate_completion_command;
pub mod probe_command;
pub mod proxy_command;
pub mod render_command;
pub mod thumbnail_command;
pub mod waveform_command;

pub use dispatcher::dispatch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;

use crate::cli::ui;
use crate::core::jobs::{JobHandle, JobRunner};
use crate::core::model::MediaInfo;
use crate::services::mediatool::{MediaTool, ProgressFn};
use crate::Result;

/// Cache location of the extracted analysis WAV for a media file.
pub(crate) fn extracted_audio_path(cache_dir: &Path, media: &Path) -> PathBuf {
    let stem = media
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio".to_string());
    cache_dir.join(format!("{}_audio.wav", stem))
}

/// Make sure a mono PCM WAV exists for the given media, extracting it
/// through the job runner when needed.
///
/// WAV sources are used as-is. Extracted files are reused while they are
/// newer than the source (written once, read many).
pub(crate) async fn ensure_extracted_wav(
    tool: Arc<dyn MediaTool>,
    info: &MediaInfo,
    cache_dir: &Path,
    sample_rate: u32,
    runner: &JobRunner,
) -> Result<PathBuf> {
    let is_wav = info
        .file_path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if is_wav {
        return Ok(info.file_path.clone());
    }

    std::fs::create_dir_all(cache_dir)?;
    let wav_path = extracted_audio_path(cache_dir, &info.file_path);
    if is_fresh(&wav_path, &info.file_path) {
        log::debug!("Reusing extracted audio {}", wav_path.display());
        return Ok(wav_path);
    }

    let input = info.file_path.clone();
    let output = wav_path.clone();
    let duration = info.duration;
    let handle = runner.submit("extract", move |ctx| async move {
        let progress_ctx = ctx.clone();
        let progress: ProgressFn = Arc::new(move |elapsed| {
            let percent = (elapsed / duration * 100.0).clamp(0.0, 100.0) as f32;
            progress_ctx.report(percent, "extracting audio");
        });
        tool.extract_audio(
            &input,
            &output,
            sample_rate,
            true,
            progress,
            ctx.cancellation_token(),
        )
        .await
    });

    run_with_progress_bar(handle, "Extracting audio").await?;
    Ok(wav_path)
}

fn is_fresh(derived: &Path, source: &Path) -> bool {
    let derived_mtime = std::fs::metadata(derived).and_then(|m| m.modified());
    let source_mtime = std::fs::metadata(source).and_then(|m| m.modified());
    matches!((derived_mtime, source_mtime), (Ok(d), Ok(s)) if d >= s)
}

/// Await a job while mirroring its progress channel onto a terminal bar.
/// Ctrl-C cancels the job cooperatively.
pub(crate) async fn run_with_progress_bar<T: Send + 'static>(
    handle: JobHandle<T>,
    message: &str,
) -> Result<T> {
    let bar = ui::create_progress_bar(message);
    let bar_task = spawn_bar_updater(&handle, bar);

    let cancel_token = handle.cancellation_token();
    let ctrlc = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel_token.cancel();
        }
    });

    let result = handle.wait().await;
    ctrlc.abort();
    let _ = bar_task.await;
    result
}

fn spawn_bar_updater<T>(handle: &JobHandle<T>, bar: ProgressBar) -> tokio::task::JoinHandle<()> {
    let mut rx = handle.subscribe_progress();
    tokio::spawn(async move {
        while let Ok(update) = rx.recv().await {
            bar.set_position(update.percent as u64);
            bar.set_message(update.message);
        }
        bar.finish_and_clear();
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracted_audio_path_uses_stem() {
        let path = extracted_audio_path(Path::new("/cache"), Path::new("/media/talk.mp4"));
        assert_eq!(path, PathBuf::from("/cache/talk_audio.wav"));
    }
}
