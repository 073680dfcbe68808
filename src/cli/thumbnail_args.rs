//! Arguments for the `thumbnail` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Single-frame extraction.
#[derive(Args, Debug)]
pub struct ThumbnailArgs {
    /// Source media file
    pub media: PathBuf,

    /// Frame time in seconds
    #[arg(long, default_value_t = 0.0)]
    pub time: f64,

    /// Thumbnail width in pixels (height keeps the aspect ratio)
    #[arg(long, default_value_t = 320)]
    pub width: u32,

    /// Output image path (default: `<stem>_thumb.jpg` next to the source)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl ThumbnailArgs {
    /// Output path, defaulting to a sibling `<stem>_thumb.jpg`.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .media
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "frame".to_string());
            self.media.with_file_name(format!("{}_thumb.jpg", stem))
        })
    }
}
