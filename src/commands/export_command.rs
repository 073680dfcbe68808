//! Edit-decision export command.

use crate::cli::ui;
use crate::cli::{ExportArgs, ExportFormat};
use crate::core::export::{EdlWriter, FcpXmlWriter, XmemlWriter};
use crate::core::project::Project;
use crate::core::timeline::Timeline;
use crate::services::mediatool::{FfmpegTool, MediaTool};
use crate::Result;

/// Execute an edit-decision export from a saved project.
pub async fn execute(args: ExportArgs) -> Result<()> {
    let project = Project::load(&args.project)?;
    project.config.validate()?;

    // Re-probe so timing reflects the file as it exists now.
    let tool = FfmpegTool::discover()?;
    let info = tool.probe(&project.media_path).await?;

    let timeline = Timeline::with_cuts(info.clone(), project.cuts.clone());
    let keep_segments = timeline.keep_segments();

    let output = args.output.clone().unwrap_or_else(|| {
        let stem = info
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "export".to_string());
        args.project
            .with_file_name(format!("{}_edited.{}", stem, args.format.extension()))
    });

    let content = match args.format {
        ExportFormat::Fcpxml => FcpXmlWriter::new().write(&info, &keep_segments, &project.name)?,
        ExportFormat::Xmeml => XmemlWriter::new().write(&info, &keep_segments, &project.name)?,
        ExportFormat::Edl => {
            EdlWriter::new(args.drop_frame).write(&info, &keep_segments, &project.name)?
        }
    };

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&output, content)?;
    ui::print_success(&format!(
        "{} segments exported to {}",
        keep_segments.len(),
        output.display()
    ));
    Ok(())
}
