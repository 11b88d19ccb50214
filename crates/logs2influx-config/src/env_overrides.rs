use crate::{ConnectionInfo, LogFormat, RuntimeConfig};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "LOGS2INFLUX_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the LOGS2INFLUX_ prefix
    /// Used for the InfluxDB CLI variables (INFLUX_HOST, INFLUX_TOKEN, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Batch / logging
    if let Some(val) = get_env_usize(env, "BATCH_MAX_EVENTS")? {
        config.batch.max_events = val;
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL")? {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT")? {
        config.logging.format = format
            .parse::<LogFormat>()
            .context("Invalid LOGS2INFLUX_LOG_FORMAT value")?;
    }

    // Point shaping
    let sink = &mut config.sink;
    if let Some(name) = get_env_string(env, "MEASUREMENT_NAME")? {
        sink.measurement_name = name;
    }
    if let Some(name) = get_env_string(env, "APPLICATION_NAME")? {
        sink.application_name = Some(name);
    }
    if let Some(name) = get_env_string(env, "INSTANCE_NAME")? {
        sink.instance_name = Some(name);
    }
    if let Some(val) = get_env_bool(env, "INCLUDE_DEFAULT_FIELDS")? {
        sink.include_default_fields = val;
    }
    if let Some(val) = get_env_bool(env, "INCLUDE_FULL_EXCEPTION")? {
        sink.include_full_exception = Some(val);
    }
    if let Some(val) = get_env_bool(env, "INCLUDE_HOSTNAME")? {
        sink.include_hostname = Some(val);
    }
    if let Some(val) = get_env_bool(env, "INCLUDE_LEVEL")? {
        sink.include_level = Some(val);
    }
    if let Some(val) = get_env_bool(env, "INCLUDE_SEVERITY")? {
        sink.include_severity = Some(val);
    }
    if let Some(list) = get_env_list(env, "EXTENDED_TAGS")? {
        sink.extended_tags = list;
    }
    if let Some(list) = get_env_list(env, "EXTENDED_FIELDS")? {
        sink.extended_fields = list;
    }

    // InfluxDB CLI variables (without LOGS2INFLUX_ prefix), overridden by
    // the prefixed ones below
    if let Some(host) = get_raw_env_string(env, "INFLUX_HOST")? {
        ensure_connection(config).uri = host;
    }
    if let Some(token) = get_raw_env_string(env, "INFLUX_TOKEN")? {
        ensure_connection(config).token = Some(token);
    }
    if let Some(org_id) = get_raw_env_string(env, "INFLUX_ORG_ID")? {
        ensure_connection(config).organization_id = org_id;
    }

    // Connection
    if let Some(uri) = get_env_string(env, "INFLUX_URI")? {
        ensure_connection(config).uri = uri;
    }
    if let Some(bucket) = get_env_string(env, "INFLUX_BUCKET")? {
        ensure_connection(config).bucket_name = bucket;
    }
    if let Some(org_id) = get_env_string(env, "INFLUX_ORG_ID")? {
        ensure_connection(config).organization_id = org_id;
    }
    if let Some(token) = get_env_string(env, "INFLUX_TOKEN")? {
        ensure_connection(config).token = Some(token);
    }
    if let Some(token) = get_env_string(env, "INFLUX_ALL_ACCESS_TOKEN")? {
        ensure_connection(config).all_access_token = Some(token);
    }
    if let Some(username) = get_env_string(env, "INFLUX_USERNAME")? {
        ensure_connection(config).username = Some(username);
    }
    if let Some(password) = get_env_string(env, "INFLUX_PASSWORD")? {
        ensure_connection(config).password = Some(password);
    }
    if let Some(val) = get_env_bool(env, "CREATE_BUCKET")? {
        ensure_connection(config).create_bucket_if_not_exists = val;
    }
    if let Some(val) = get_env_u64(env, "BUCKET_RETENTION_SECS")? {
        ensure_connection(config).bucket_retention_period = val;
    }

    Ok(())
}

fn ensure_connection(config: &mut RuntimeConfig) -> &mut ConnectionInfo {
    config
        .sink
        .connection_info
        .get_or_insert_with(ConnectionInfo::default)
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get(key))
}

/// Get a raw environment variable without the LOGS2INFLUX_ prefix
fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Result<Option<String>> {
    Ok(env.get_raw(key))
}

/// Comma-separated list; empty entries are dropped.
fn get_env_list<E: EnvSource>(env: &E, key: &str) -> Result<Option<Vec<String>>> {
    Ok(get_env_string(env, key)?.map(|val| {
        val.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    }))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_u64<E: EnvSource>(env: &E, key: &str) -> Result<Option<u64>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val
                .parse::<u64>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key)? {
        Some(val) => {
            let parsed = val.to_lowercase().parse::<bool>().map_err(|e| {
                anyhow!(
                    "Failed to parse {}{} (expected bool): {}",
                    ENV_PREFIX,
                    key,
                    e
                )
            })?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
