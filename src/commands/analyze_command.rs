//! Silence analysis command: probe, extract, detect, save a project.
//!
//! This is also the behavior behind the bare `autocut <media>` invocation,
//! with every knob at its configured default.

use std::sync::Arc;

use log::debug;

use crate::cli::ui;
use crate::cli::AnalyzeArgs;
use crate::config::ConfigService;
use crate::core::detector::{detect_silence_ffmpeg, detect_silence_vad, SilenceDetector};
use crate::core::jobs::JobRunner;
use crate::core::model::Cut;
use crate::core::project::Project;
use crate::core::timeline::Timeline;
use crate::core::waveform::WaveformBuilder;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Execute silence analysis over a media file.
pub async fn execute(args: AnalyzeArgs, config_service: &dyn ConfigService) -> Result<()> {
    let config = config_service.config()?;
    let analysis = args.apply_overrides(config.analysis.clone());
    analysis.validate()?;

    let tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::discover()?);
    let runner = JobRunner::new(config.general.max_concurrent_jobs);

    let info = tool.probe(&args.media).await?;
    ui::display_media_info(&info);

    let wav_path = super::ensure_extracted_wav(
        Arc::clone(&tool),
        &info,
        &config.cache_dir(),
        config.general.audio_sample_rate,
        &runner,
    )
    .await?;

    debug!("Running detection over {}", wav_path.display());
    let use_ffmpeg = args.ffmpeg_detect;
    let detect_info = info.clone();
    let detect_config = analysis.clone();
    let detect_wav = wav_path.clone();
    let detect_tool = Arc::clone(&tool);
    let handle = runner.submit("detect", move |ctx| async move {
        if use_ffmpeg {
            detect_silence_ffmpeg(
                detect_tool.as_ref(),
                &detect_info,
                &detect_wav,
                &detect_config,
                &ctx,
            )
            .await
        } else if detect_config.use_vad {
            detect_silence_vad(&detect_wav, &detect_config, &ctx)
        } else {
            SilenceDetector::new(detect_config)?.detect_with_context(&detect_wav, &ctx)
        }
    });
    // Warm the waveform cache concurrently; it reads the same PCM and
    // shares no state with the detector.
    let waveform_builder =
        WaveformBuilder::new(config.general.waveform_bucket, Some(config.cache_dir()))?;
    let waveform_wav = wav_path.clone();
    let waveform_handle = runner.submit("waveform", move |ctx| async move {
        waveform_builder.generate(&waveform_wav, &ctx)
    });

    let (detect_result, waveform_result) = futures::future::join(
        super::run_with_progress_bar(handle, "Detecting silence"),
        waveform_handle.wait(),
    )
    .await;
    if let Err(e) = waveform_result {
        log::warn!("Waveform cache warm-up failed: {}", e);
    }
    let cuts: Vec<Cut> = detect_result?;

    let timeline = Timeline::with_cuts(info.clone(), cuts.clone());
    ui::display_cuts(timeline.cuts());
    ui::display_stats(&timeline.stats());

    let project_path = args.project_path();
    let mut project = Project::new(info.file_path.clone());
    project.config = analysis;
    project.cuts = cuts;
    project.save(&project_path)?;
    ui::print_success(&format!("Project saved to {}", project_path.display()));

    Ok(())
}
