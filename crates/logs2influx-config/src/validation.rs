// Configuration validation
//
// Validates that required fields are present and values are sensible

use crate::*;
use anyhow::{bail, Result};
use thiserror::Error;
use tracing::warn;

/// Invalid sink options. Field names use the configuration key path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} is required\n\nHow to fix: set {field} in the [sink] section or via the matching LOGS2INFLUX_ variable")]
    MissingField { field: String },

    #[error("{field} is invalid: {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigError {
    pub fn field(&self) -> &str {
        match self {
            ConfigError::MissingField { field } | ConfigError::InvalidValue { field, .. } => field,
        }
    }

    fn missing(field: &str) -> Self {
        ConfigError::MissingField {
            field: field.to_string(),
        }
    }

    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_batch_config(&config.batch)?;
    validate_sink_options(&config.sink)?;
    Ok(())
}

fn validate_batch_config(config: &BatchConfig) -> Result<()> {
    if config.max_events == 0 {
        bail!("batch.max_events must be greater than 0");
    }

    if config.max_events > 100_000 {
        warn!(
            max_events = config.max_events,
            "batch.max_events is very large; InfluxDB may reject the request body"
        );
    }

    Ok(())
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !is_blank(v))
}

/// Check sink options before any network call is made.
pub fn validate_sink_options(options: &SinkOptions) -> std::result::Result<(), ConfigError> {
    let conn = options
        .connection_info
        .as_ref()
        .ok_or_else(|| ConfigError::missing("ConnectionInfo"))?;

    if is_blank(&conn.uri) {
        return Err(ConfigError::missing("ConnectionInfo.Uri"));
    }
    match url::Url::parse(conn.uri.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => {
            return Err(ConfigError::invalid(
                "ConnectionInfo.Uri",
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            ))
        }
        Err(e) => return Err(ConfigError::invalid("ConnectionInfo.Uri", e.to_string())),
    }

    if is_blank(&conn.bucket_name) {
        return Err(ConfigError::missing("ConnectionInfo.BucketName"));
    }
    if is_blank(&conn.organization_id) {
        return Err(ConfigError::missing("ConnectionInfo.OrganizationId"));
    }

    if !is_set(&conn.token) && !is_set(&conn.all_access_token) && !is_set(&conn.username) {
        return Err(ConfigError::invalid(
            "ConnectionInfo.Token",
            "one of Token, AllAccessToken or Username must be set",
        ));
    }
    if is_set(&conn.username) && !is_set(&conn.password) {
        return Err(ConfigError::missing("ConnectionInfo.Password"));
    }

    if conn.create_bucket_if_not_exists
        && conn.bucket_retention_period > 0
        && conn.bucket_retention_period < 3_600
    {
        warn!(
            retention_seconds = conn.bucket_retention_period,
            "ConnectionInfo.BucketRetentionPeriod is below one hour; InfluxDB will likely reject it"
        );
    }

    // Parsing the specs surfaces blank entries with their index.
    options.to_builder_options()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_options() -> SinkOptions {
        SinkOptions {
            connection_info: Some(ConnectionInfo {
                uri: "http://localhost:8086".to_string(),
                bucket_name: "logs".to_string(),
                organization_id: "org-1".to_string(),
                token: Some("write-token".to_string()),
                ..ConnectionInfo::default()
            }),
            ..SinkOptions::default()
        }
    }

    fn with_conn(f: impl FnOnce(&mut ConnectionInfo)) -> SinkOptions {
        let mut options = valid_options();
        if let Some(conn) = options.connection_info.as_mut() {
            f(conn);
        }
        options
    }

    #[test]
    fn test_valid_options_pass() {
        assert!(validate_sink_options(&valid_options()).is_ok());
    }

    #[test]
    fn test_missing_connection_info() {
        let err = validate_sink_options(&SinkOptions::default()).unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo");
    }

    #[test]
    fn test_blank_required_fields_named() {
        let err = validate_sink_options(&with_conn(|c| c.bucket_name = " ".to_string())).unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo.BucketName");

        let err = validate_sink_options(&with_conn(|c| c.organization_id.clear())).unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo.OrganizationId");

        let err = validate_sink_options(&with_conn(|c| c.uri.clear())).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField { .. }));
        assert_eq!(err.field(), "ConnectionInfo.Uri");
    }

    #[test]
    fn test_uri_must_be_http() {
        let err = validate_sink_options(&with_conn(|c| c.uri = "ftp://influx".to_string())).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = validate_sink_options(&with_conn(|c| c.uri = "not a url".to_string())).unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo.Uri");
    }

    #[test]
    fn test_requires_some_credential() {
        let err = validate_sink_options(&with_conn(|c| c.token = None)).unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo.Token");

        let all_access = with_conn(|c| {
            c.token = None;
            c.all_access_token = Some("admin".to_string());
        });
        assert!(validate_sink_options(&all_access).is_ok());
    }

    #[test]
    fn test_username_requires_password() {
        let err = validate_sink_options(&with_conn(|c| {
            c.token = None;
            c.username = Some("admin".to_string());
        }))
        .unwrap_err();
        assert_eq!(err.field(), "ConnectionInfo.Password");

        let ok = with_conn(|c| {
            c.token = None;
            c.username = Some("admin".to_string());
            c.password = Some("secret".to_string());
        });
        assert!(validate_sink_options(&ok).is_ok());
    }

    #[test]
    fn test_blank_extended_spec_rejected() {
        let mut options = valid_options();
        options.extended_tags = vec![String::new()];
        let err = validate_sink_options(&options).unwrap_err();
        assert_eq!(err.field(), "ExtendedTags[0]");
    }

    #[test]
    fn test_validate_batch_config() {
        assert!(validate_batch_config(&BatchConfig { max_events: 100 }).is_ok());
        assert!(validate_batch_config(&BatchConfig { max_events: 0 }).is_err());
    }
}
