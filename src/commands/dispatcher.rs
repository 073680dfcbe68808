//! Routes parsed CLI arguments to their command implementations.

use crate::cli::{AnalyzeArgs, Cli, Commands};
use crate::config::ConfigService;
use crate::error::AutoCutError;
use crate::Result;

use super::{
    analyze_command, cache_command, config_command, export_command, generate_completion_command,
    probe_command, proxy_command, render_command, thumbnail_command, waveform_command,
};

/// Dispatch a parsed invocation.
///
/// `autocut <media>` without a subcommand opens the file with the
/// configured defaults.
pub async fn dispatch(cli: Cli, config_service: &dyn ConfigService) -> Result<()> {
    match cli.command {
        Some(Commands::Analyze(args)) => analyze_command::execute(args, config_service).await,
        Some(Commands::Export(args)) => export_command::execute(args).await,
        Some(Commands::Render(args)) => render_command::execute(args, config_service).await,
        Some(Commands::Probe(args)) => probe_command::execute(args).await,
        Some(Commands::Waveform(args)) => waveform_command::execute(args, config_service).await,
        Some(Commands::Proxy(args)) => proxy_command::execute(args, config_service).await,
        Some(Commands::Thumbnail(args)) => thumbnail_command::execute(args).await,
        Some(Commands::Cache(args)) => cache_command::execute(args, config_service).await,
        Some(Commands::Config(args)) => config_command::execute(args, config_service).await,
        Some(Commands::GenerateCompletion(args)) => generate_completion_command::execute(args),
        None => match cli.media {
            Some(media) => {
                let args = AnalyzeArgs {
                    media,
                    threshold: None,
                    min_duration: None,
                    merge_gap: None,
                    pre_pad: None,
                    post_pad: None,
                    keep_short: None,
                    use_vad: false,
                    ffmpeg_detect: false,
                    breath: false,
                    project: None,
                };
                analyze_command::execute(args, config_service).await
            }
            None => Err(AutoCutError::config(
                "no media file or subcommand specified; run 'autocut --help'",
            )),
        },
    }
}
