// Configuration source loading.
//
// Priority order:
// 1. Environment variables (LOGS2INFLUX_* prefix, then INFLUX_* CLI variables)
// 2. Config file path from LOGS2INFLUX_CONFIG
// 3. Inline config content from LOGS2INFLUX_CONFIG_CONTENT
// 4. Default config file (./logs2influx.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_PATH: &str = "./logs2influx.toml";

/// Load configuration using process environment and file access.
pub fn load_config() -> Result<RuntimeConfig> {
    let config = read_config()?;
    config.validate()?;
    Ok(config)
}

/// Like [`load_config`] but without validation, for callers that apply
/// further overrides (or install logging) first.
pub fn read_config() -> Result<RuntimeConfig> {
    let mut config = load_from_file()?.unwrap_or_default();

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

fn load_from_file() -> Result<Option<RuntimeConfig>> {
    if let Ok(path) = env::var("LOGS2INFLUX_CONFIG") {
        return read_config_file(Path::new(&path)).map(Some);
    }

    if let Ok(content) = env::var("LOGS2INFLUX_CONFIG_CONTENT") {
        let config = RuntimeConfig::from_toml_str(&content)
            .context("Failed to parse inline config from LOGS2INFLUX_CONFIG_CONTENT")?;
        return Ok(Some(config));
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        return read_config_file(default_path).map(Some);
    }

    Ok(None)
}

fn read_config_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    RuntimeConfig::from_toml_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
/// Environment overrides still apply on top of the file.
pub fn load_from_file_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let config = read_config_from_path(path)?;
    config.validate()?;
    Ok(config)
}

/// Read a specific file and apply environment overrides, without validation.
pub fn read_config_from_path(path: impl AsRef<Path>) -> Result<RuntimeConfig> {
    let mut config = read_config_file(path.as_ref())?;

    env_overrides::apply_env_overrides(&mut config, &StdEnvSource)?;
    Ok(config)
}

/// Reads the process environment.
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}
