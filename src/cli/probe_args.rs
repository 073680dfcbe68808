//! Arguments for the `probe` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Media metadata inspection.
#[derive(Args, Debug)]
pub struct ProbeArgs {
    /// Media file to inspect
    pub media: PathBuf,

    /// Print the raw descriptor as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
