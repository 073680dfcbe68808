//! Configuration services with dependency injection support.
//!
//! Production loads `config.toml` from the platform config directory and
//! layers `AUTOCUT_*` environment overrides on top; tests inject an
//! [`AppConfig`] directly through [`TestConfigService`].

use std::path::PathBuf;

use log::debug;

use super::AppConfig;
use crate::Result;

/// Read access to the application configuration.
pub trait ConfigService: Send + Sync {
    /// The effective, validated configuration.
    fn config(&self) -> Result<AppConfig>;
}

/// File + environment backed configuration service.
pub struct ProductionConfigService {
    config_path: PathBuf,
}

impl ProductionConfigService {
    /// Create a service reading the default config location.
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_path: Self::default_config_path(),
        })
    }

    /// Create a service reading an explicit file path.
    pub fn with_config_path(config_path: PathBuf) -> Self {
        Self { config_path }
    }

    /// The default `config.toml` location.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("autocut")
            .join("config.toml")
    }

    /// Where this service reads its file from.
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }
}

impl ConfigService for ProductionConfigService {
    fn config(&self) -> Result<AppConfig> {
        debug!("Loading configuration from {}", self.config_path.display());
        let settings = config::Config::builder()
            .add_source(config::File::from(self.config_path.clone()).required(false))
            .add_source(
                config::Environment::with_prefix("AUTOCUT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let app_config: AppConfig = settings.try_deserialize()?;
        app_config.validate()?;
        Ok(app_config)
    }
}

/// In-memory configuration service for tests.
pub struct TestConfigService {
    config: AppConfig,
}

impl TestConfigService {
    /// Wrap a configuration value.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// A service over the defaults.
    pub fn with_defaults() -> Self {
        Self::new(AppConfig::default())
    }
}

impl ConfigService for TestConfigService {
    fn config(&self) -> Result<AppConfig> {
        self.config.validate()?;
        Ok(self.config.clone())
    }
}
