//! Sink options as written in configuration files.

use std::fmt;

use logs2influx_core::{redact_secret, BuilderOptions, ExtendedSpec, DEFAULT_MEASUREMENT_NAME};
use serde::{Deserialize, Serialize};

use crate::validation::ConfigError;

/// Point shaping and connection options for one sink.
///
/// The `include_*` flags other than `include_default_fields` are optional and
/// fall back to `include_default_fields` when unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SinkOptions {
    #[serde(default = "default_measurement_name")]
    pub measurement_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_name: Option<String>,

    /// Value of the `facility` tag; defaults to the application name. An
    /// empty string suppresses the tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_full_exception: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_hostname: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_level: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_severity: Option<bool>,

    #[serde(default = "default_true")]
    pub include_default_fields: bool,

    #[serde(default)]
    pub extended_fields: Vec<String>,

    #[serde(default)]
    pub extended_tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_info: Option<ConnectionInfo>,
}

fn default_measurement_name() -> String {
    DEFAULT_MEASUREMENT_NAME.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SinkOptions {
    fn default() -> Self {
        Self {
            measurement_name: default_measurement_name(),
            application_name: None,
            instance_name: None,
            include_full_exception: None,
            include_hostname: None,
            include_level: None,
            include_severity: None,
            include_default_fields: true,
            extended_fields: Vec::new(),
            extended_tags: Vec::new(),
            connection_info: None,
        }
    }
}

impl SinkOptions {
    pub fn include_full_exception(&self) -> bool {
        self.include_full_exception
            .unwrap_or(self.include_default_fields)
    }

    pub fn include_hostname(&self) -> bool {
        self.include_hostname.unwrap_or(self.include_default_fields)
    }

    pub fn include_level(&self) -> bool {
        self.include_level.unwrap_or(self.include_default_fields)
    }

    pub fn include_severity(&self) -> bool {
        self.include_severity.unwrap_or(self.include_default_fields)
    }

    /// Instance name after defaulting to the application name.
    pub fn effective_instance_name(&self) -> Option<&str> {
        self.instance_name
            .as_deref()
            .or(self.application_name.as_deref())
    }

    /// Resolve flags and parse extended specs into builder options.
    pub fn to_builder_options(&self) -> Result<BuilderOptions, ConfigError> {
        Ok(BuilderOptions {
            measurement_name: self.measurement_name.clone(),
            application_name: self.application_name.clone(),
            instance_name: self.effective_instance_name().map(str::to_string),
            include_hostname: self.include_hostname(),
            include_level: self.include_level(),
            include_severity: self.include_severity(),
            include_default_fields: self.include_default_fields,
            include_full_exception: self.include_full_exception(),
            extended_tags: parse_specs("ExtendedTags", &self.extended_tags)?,
            extended_fields: parse_specs("ExtendedFields", &self.extended_fields)?,
        })
    }
}

fn parse_specs(field: &str, specs: &[String]) -> Result<Vec<ExtendedSpec>, ConfigError> {
    specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            ExtendedSpec::parse(spec).map_err(|e| ConfigError::InvalidValue {
                field: format!("{}[{}]", field, i),
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Where and how to write.
#[derive(Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ConnectionInfo {
    #[serde(default)]
    pub uri: String,

    #[serde(default)]
    pub bucket_name: String,

    #[serde(default)]
    pub organization_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Privileged token used only for bucket and token provisioning.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub all_access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default)]
    pub create_bucket_if_not_exists: bool,

    /// Retention in seconds; 0 keeps data forever.
    #[serde(default)]
    pub bucket_retention_period: u64,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("uri", &self.uri)
            .field("bucket_name", &self.bucket_name)
            .field("organization_id", &self.organization_id)
            .field("token", &self.token.as_deref().map(redact_secret))
            .field(
                "all_access_token",
                &self.all_access_token.as_deref().map(redact_secret),
            )
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "****"))
            .field(
                "create_bucket_if_not_exists",
                &self.create_bucket_if_not_exists,
            )
            .field("bucket_retention_period", &self.bucket_retention_period)
            .finish()
    }
}
