//! Arguments for the `proxy` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Low-resolution preview generation.
#[derive(Args, Debug)]
pub struct ProxyArgs {
    /// Source media file
    pub media: PathBuf,

    /// Proxy resolution: 480p, 720p, or 1080p
    #[arg(long, default_value = "720p")]
    pub resolution: String,

    /// Output path (default: `<stem>_proxy.mp4` next to the source)
    #[arg(long)]
    pub output: Option<PathBuf>,
}

impl ProxyArgs {
    /// Output path, defaulting to a sibling `<stem>_proxy.mp4`.
    pub fn output_path(&self) -> PathBuf {
        self.output.clone().unwrap_or_else(|| {
            let stem = self
                .media
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "proxy".to_string());
            self.media.with_file_name(format!("{}_proxy.mp4", stem))
        })
    }
}
