//! Arguments for the `render` subcommand.

use std::path::PathBuf;

use clap::Args;

/// Re-render the kept segments of a project into a new container.
#[derive(Args, Debug)]
pub struct RenderArgs {
    /// Project document produced by `analyze`
    pub project: PathBuf,

    /// Output media path; must differ from the source file
    #[arg(long)]
    pub output: PathBuf,
}
