//! Re-render command: concatenate the kept segments into a new file.

use std::sync::Arc;

use crate::cli::ui;
use crate::cli::RenderArgs;
use crate::config::ConfigService;
use crate::core::jobs::JobRunner;
use crate::core::project::Project;
use crate::core::render::RenderOrchestrator;
use crate::core::timeline::Timeline;
use crate::services::mediatool::ffmpeg::RenderSettings;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Execute a render from a saved project.
pub async fn execute(args: RenderArgs, config_service: &dyn ConfigService) -> Result<()> {
    let config = config_service.config()?;
    let project = Project::load(&args.project)?;

    let mut ffmpeg = FfmpegTool::discover()?;
    ffmpeg.set_render_settings(RenderSettings {
        video_crf: config.render.video_crf,
        video_preset: config.render.video_preset.clone(),
        audio_bitrate_kbps: config.render.audio_bitrate_kbps,
    });
    let tool: Arc<dyn MediaTool> = Arc::new(ffmpeg);
    let info = tool.probe(&project.media_path).await?;

    let timeline = Timeline::with_cuts(info.clone(), project.cuts.clone());
    let keep_segments = timeline.keep_segments();
    ui::print_success(&format!(
        "Rendering {} segments ({})",
        keep_segments.len(),
        ui::format_time(timeline.final_duration())
    ));

    let runner = JobRunner::new(config.general.max_concurrent_jobs);
    let orchestrator = RenderOrchestrator::new(Arc::clone(&tool));
    let output = args.output.clone();
    let handle = runner.submit("render", move |ctx| async move {
        orchestrator.render(&info, &keep_segments, &output, &ctx).await
    });
    super::run_with_progress_bar(handle, "Rendering").await?;

    ui::print_success(&format!("Rendered to {}", args.output.display()));
    Ok(())
}
