//! Proxy generation command.

use std::sync::Arc;

use crate::cli::ui;
use crate::cli::ProxyArgs;
use crate::config::ConfigService;
use crate::core::jobs::JobRunner;
use crate::error::AutoCutError;
use crate::services::mediatool::{FfmpegTool, MediaTool, ProgressFn, ProxyResolution};
use crate::Result;

/// Execute a proxy render.
pub async fn execute(args: ProxyArgs, config_service: &dyn ConfigService) -> Result<()> {
    let config = config_service.config()?;
    let resolution: ProxyResolution = args
        .resolution
        .parse()
        .map_err(AutoCutError::config)?;

    let tool: Arc<dyn MediaTool> = Arc::new(FfmpegTool::discover()?);
    let info = tool.probe(&args.media).await?;
    if !info.has_video() {
        return Err(AutoCutError::invalid_media("source has no video stream"));
    }

    let runner = JobRunner::new(config.general.max_concurrent_jobs);
    let output = args.output_path();
    let job_output = output.clone();
    let duration = info.duration;
    let handle = runner.submit("proxy", move |ctx| async move {
        let progress_ctx = ctx.clone();
        let progress: ProgressFn = Arc::new(move |elapsed| {
            let percent = (elapsed / duration * 100.0).clamp(0.0, 100.0) as f32;
            progress_ctx.report(percent, "encoding proxy");
        });
        tool.generate_proxy(
            &info.file_path,
            &job_output,
            resolution,
            progress,
            ctx.cancellation_token(),
        )
        .await
    });
    super::run_with_progress_bar(handle, "Generating proxy").await?;

    ui::print_success(&format!("Proxy written to {}", output.display()));
    Ok(())
}
