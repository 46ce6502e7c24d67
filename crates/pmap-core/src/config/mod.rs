//! Configuration types for the pmap service.
//!
//! Configuration is loaded once at startup from a TOML file (`pmap.toml`, or
//! the path in `PMAP_SERVER_CONFIG`) and validated eagerly. Every check that
//! can be made before the first request is made here, so a misconfigured
//! service fails at startup instead of per request.

pub mod enrichment;
pub mod messenger;
pub mod server;
pub mod storage;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub use enrichment::EnrichmentConfig;
pub use messenger::{MessengerBackend, MessengerConfig};
pub use server::ServerConfig;
pub use storage::StorageConfig;

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "PMAP_SERVER_CONFIG";

/// Environment variable overriding `server.port`.
pub const PORT_ENV: &str = "PORT";

/// Complete service configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    /// Enrichment settings. When absent the enrichment processor is not run.
    #[serde(default)]
    pub enrichment: Option<EnrichmentConfig>,

    #[serde(default)]
    pub validation: ValidationConfig,

    /// Destination for records that passed every processor.
    #[serde(default)]
    pub success_messenger: Option<MessengerConfig>,

    /// Destination for records a processor rejected.
    #[serde(default)]
    pub failure_messenger: Option<MessengerConfig>,
}

/// Whether the validator runs as the first step of the chain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

/// Error type for configuration loading and construction-time checks.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("an object store is required")]
    MissingObjectStore,

    #[error("a success messenger is required")]
    MissingSuccessMessenger,

    #[error("a failure messenger is required when {processors} processor(s) are configured")]
    MissingFailureMessenger { processors: usize },
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML content.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(ConfigError::from)
    }

    /// Load from the default location, apply environment overrides and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file(config_path())?;
        if let Ok(port) = env::var(PORT_ENV) {
            config.server.port = port
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { name: PORT_ENV, value: port })?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Number of processors this configuration enables.
    pub fn processor_count(&self) -> usize {
        usize::from(self.validation.enabled) + usize::from(self.enrichment.is_some())
    }

    /// Check every setting and report all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut problems = Vec::new();

        match &self.success_messenger {
            Some(messenger) => problems.extend(messenger.problems("success_messenger")),
            None => problems.push("success_messenger is required".to_string()),
        }

        match &self.failure_messenger {
            Some(messenger) => problems.extend(messenger.problems("failure_messenger")),
            None if self.processor_count() > 0 => problems.push(format!(
                "failure_messenger is required when {} processor(s) are enabled",
                self.processor_count()
            )),
            None => {}
        }

        if let Some(enrichment) = &self.enrichment {
            problems.extend(enrichment.problems());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(problems))
        }
    }
}

fn config_path() -> PathBuf {
    if let Ok(p) = env::var(CONFIG_PATH_ENV) {
        return PathBuf::from(p);
    }
    PathBuf::from("pmap.toml")
}
