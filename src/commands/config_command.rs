//! Configuration inspection command.

use crate::cli::{ConfigAction, ConfigArgs};
use crate::config::{ConfigService, ProductionConfigService};
use crate::Result;

/// Execute a configuration operation.
pub async fn execute(args: ConfigArgs, config_service: &dyn ConfigService) -> Result<()> {
    match args.action {
        ConfigAction::Show => {
            let config = config_service.config()?;
            let text = toml::to_string_pretty(&config)
                .map_err(|e| crate::error::AutoCutError::config(e.to_string()))?;
            print!("{}", text);
        }
        ConfigAction::Path => {
            println!("{}", ProductionConfigService::default_config_path().display());
        }
    }
    Ok(())
}
