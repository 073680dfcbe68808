//! Shell completion script generation command.

use clap::CommandFactory;
use clap_complete::generate;

use crate::cli::{Cli, GenerateCompletionArgs};
use crate::Result;

/// Write a completion script for the requested shell to stdout.
pub fn execute(args: GenerateCompletionArgs) -> Result<()> {
    let mut command = Cli::command();
    generate(args.shell, &mut command, "autocut", &mut std::io::stdout());
    Ok(())
}
