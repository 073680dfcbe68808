// src/main.rs
use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = autocut_cli::cli::Cli::parse();

    let mut log_builder = env_logger::Builder::from_default_env();
    if cli.debug {
        log_builder.filter_level(log::LevelFilter::Debug);
    }
    log_builder.init();

    let config_service = match autocut_cli::config::ProductionConfigService::new() {
        Ok(service) => service,
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    };

    match autocut_cli::commands::dispatch(cli, &config_service).await {
        Ok(_) => std::process::exit(0),
        Err(e) => {
            eprintln!("{}", e.user_friendly_message());
            std::process::exit(e.exit_code());
        }
    }
}
