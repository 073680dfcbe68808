//! Arguments for the `cache` subcommand.

use clap::{Args, Subcommand};

/// Cache directory management.
#[derive(Args, Debug)]
pub struct CacheArgs {
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache operations.
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List cached waveform archives and extracted audio
    List,
    /// Delete every cache entry
    Clear,
}
