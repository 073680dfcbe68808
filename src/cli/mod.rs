//! Command-line interface for the AutoCut silence-removal tool.
//!
//! The CLI is built using `clap` and follows a subcommand pattern:
//! - `analyze` - detect silences in a media file and save a project
//! - `export` - write FCPXML / XMEML / EDL edit decisions from a project
//! - `render` - re-render the kept segments into a new container
//! - `probe` - inspect media metadata
//! - `waveform` - materialize peak data for visualizers
//! - `cache` - inspect and clear the waveform/audio cache
//! - `config` - show the effective configuration
//! - `generate-completion` - shell completion script generation
//!
//! Running `autocut <media>` with no subcommand opens the file: probe,
//! extract, detect with the configured defaults, and save a project
//! next to the source.
//!
//! # Examples
//!
//! ```bash
//! # Open a recording with the configured defaults
//! autocut talk.mp4
//!
//! # Tighter detection, then export an EDL for Resolve
//! autocut analyze talk.mp4 --threshold -40 --min-duration 300
//! autocut export talk.autocut --format edl
//! ```

mod analyze_args;
mod cache_args;
mod config_args;
mod export_args;
mod generate_completion_args;
mod probe_args;
mod proxy_args;
mod render_args;
mod thumbnail_args;
mod waveform_args;
pub mod ui;

pub use analyze_args::AnalyzeArgs;
pub use cache_args::{CacheAction, CacheArgs};
use clap::{Parser, Subcommand};
pub use config_args::{ConfigAction, ConfigArgs};
pub use export_args::{ExportArgs, ExportFormat};
pub use generate_completion_args::GenerateCompletionArgs;
pub use probe_args::ProbeArgs;
pub use proxy_args::ProxyArgs;
pub use render_args::RenderArgs;
pub use thumbnail_args::ThumbnailArgs;
pub use waveform_args::WaveformArgs;

use std::path::PathBuf;

/// Main CLI application structure defining the top-level interface.
#[derive(Parser, Debug)]
#[command(name = "autocut")]
#[command(about = "Remove silent regions from spoken-audio video recordings")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Raise log verbosity to debug
    #[arg(long, global = true)]
    pub debug: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Media file to open with the configured defaults
    #[arg(value_name = "MEDIA")]
    pub media: Option<PathBuf>,
}

/// Available subcommands for the AutoCut CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect silences in a media file and save a project document
    Analyze(AnalyzeArgs),

    /// Export edit decisions (FCPXML, XMEML, EDL) from a project
    Export(ExportArgs),

    /// Re-render the kept segments into a new media file
    Render(RenderArgs),

    /// Inspect media metadata
    Probe(ProbeArgs),

    /// Materialize waveform peak data
    Waveform(WaveformArgs),

    /// Generate a low-resolution preview copy
    Proxy(ProxyArgs),

    /// Extract a single scaled frame
    Thumbnail(ThumbnailArgs),

    /// Manage the waveform and extracted-audio cache
    Cache(CacheArgs),

    /// Show the effective application configuration
    Config(ConfigArgs),

    /// Generate shell completion scripts
    GenerateCompletion(GenerateCompletionArgs),
}
