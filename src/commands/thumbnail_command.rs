//! Thumbnail extraction command.

use crate::cli::ui;
use crate::cli::ThumbnailArgs;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Extract a single scaled frame.
pub async fn execute(args: ThumbnailArgs) -> Result<()> {
    let tool = FfmpegTool::discover()?;
    let output = args.output_path();
    tool.extract_thumbnail(&args.media, args.time, &output, args.width)
        .await?;
    ui::print_success(&format!("Thumbnail written to {}", output.display()));
    Ok(())
}
