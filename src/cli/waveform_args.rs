//! Arguments for the `waveform` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Waveform peak materialization.
#[derive(Args, Debug)]
pub struct WaveformArgs {
    /// Media or WAV file to process
    pub media: PathBuf,

    /// Samples per peak bucket
    #[arg(long, default_value_t = 256)]
    pub bucket: u32,

    /// Produce all standard resolutions (64, 256, 1024, 4096)
    #[arg(long)]
    pub multi: bool,
}
