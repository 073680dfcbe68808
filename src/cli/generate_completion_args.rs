//! Arguments for the `generate-completion` subcommand.

use clap::Args;
use clap_complete::Shell;

/// Shell completion script generation.
#[derive(Args, Debug)]
pub struct GenerateCompletionArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}
