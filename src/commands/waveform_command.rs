//! Waveform materialization command.

use std::sync::Arc;

use crate::cli::ui;
use crate::cli::WaveformArgs;
use crate::config::ConfigService;
use crate::core::jobs::JobRunner;
use crate::core::waveform::WaveformBuilder;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Execute waveform generation, via the cache when possible.
pub async fn execute(args: WaveformArgs, config_service: &dyn ConfigService) -> Result<()> {
    let config = config_service.config()?;
    let cache_dir = config.cache_dir();

    let tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::discover()?);
    let runner = JobRunner::new(config.general.max_concurrent_jobs);

    let info = tool.probe(&args.media).await?;
    let wav_path = super::ensure_extracted_wav(
        Arc::clone(&tool),
        &info,
        &cache_dir,
        config.general.audio_sample_rate,
        &runner,
    )
    .await?;

    let builder = WaveformBuilder::new(args.bucket, Some(cache_dir))?;
    if args.multi {
        let handle = runner.submit("waveform", move |ctx| async move {
            builder.generate_multi_resolution(&wav_path, &ctx)
        });
        let levels = super::run_with_progress_bar(handle, "Building waveforms").await?;
        for (resolution, data) in &levels {
            ui::print_success(&format!(
                "bucket {:>4}: {} buckets over {}",
                resolution,
                data.num_buckets(),
                ui::format_time(data.duration)
            ));
        }
    } else {
        let handle = runner.submit("waveform", move |ctx| async move {
            builder.generate(&wav_path, &ctx)
        });
        let data = super::run_with_progress_bar(handle, "Building waveform").await?;
        ui::print_success(&format!(
            "{} buckets ({} samples each) over {}",
            data.num_buckets(),
            data.samples_per_bucket,
            ui::format_time(data.duration)
        ));
    }
    Ok(())
}
