// logs2influx-config - Configuration for the sink and the ingest binary
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from LOGS2INFLUX_CONFIG env var
// 3. Config file contents from LOGS2INFLUX_CONFIG_CONTENT env var
// 4. Default config file location (./logs2influx.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};

mod env_overrides;
mod options;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use options::{ConnectionInfo, SinkOptions};
pub use sources::{
    load_config, load_from_file_path, read_config, read_config_from_path, StdEnvSource,
};
pub use validation::{validate_sink_options, ConfigError};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Sink options, keyed in PascalCase.
    #[serde(default)]
    pub sink: SinkOptions,
}

/// Batch configuration for the ingest binary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Events handed to the sink per write.
    pub max_events: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self { max_events: 1_000 }
    }
}

/// Diagnostic logging of the process itself
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => anyhow::bail!("Unsupported log format: {}. Supported: text, json", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Parse a TOML document; missing sections take their defaults.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}
