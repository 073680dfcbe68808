//! Arguments for the `export` subcommand.

use std::path::PathBuf;

use clap::{Args, ValueEnum};

/// Edit-decision export from a saved project.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Project document produced by `analyze`
    pub project: PathBuf,

    /// Interchange format to write
    #[arg(long, value_enum)]
    pub format: ExportFormat,

    /// Output path (default: `<media stem>_edited.<ext>` next to the project)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Use drop-frame timecodes (EDL only, 29.97 fps sources)
    #[arg(long)]
    pub drop_frame: bool,
}

/// Supported edit-decision formats.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    /// FCPXML 1.10 for Final Cut Pro
    Fcpxml,
    /// FCP7 XML for Premiere Pro / After Effects
    Xmeml,
    /// CMX 3600 EDL for DaVinci Resolve and others
    Edl,
}

impl ExportFormat {
    /// Conventional file extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Fcpxml => "fcpxml",
            ExportFormat::Xmeml => "xml",
            ExportFormat::Edl => "edl",
        }
    }
}
