//! Media metadata inspection command.

use crate::cli::ui;
use crate::cli::ProbeArgs;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Execute a probe and print the descriptor.
pub async fn execute(args: ProbeArgs) -> Result<()> {
    let tool = FfmpegTool::discover()?;
    let info = tool.probe(&args.media).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        ui::display_media_info(&info);
    }
    Ok(())
}
