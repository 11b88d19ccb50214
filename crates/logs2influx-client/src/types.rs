//! InfluxDB v2 API types.

use std::fmt;

use chrono::{DateTime, Utc};
use logs2influx_core::redact_secret;
use serde::{Deserialize, Serialize};

/// How a connection authenticates.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Token(String),
    UsernamePassword { username: String, password: String },
}

impl Credentials {
    pub fn token(token: impl Into<String>) -> Self {
        Credentials::Token(token.into())
    }

    pub fn username_password(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::UsernamePassword {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn is_token(&self) -> bool {
        matches!(self, Credentials::Token(_))
    }

    /// Short label for logs; never includes the secret.
    pub fn kind(&self) -> &'static str {
        match self {
            Credentials::Token(_) => "token",
            Credentials::UsernamePassword { .. } => "username/password",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::Token(token) => f.debug_tuple("Token").field(&redact_secret(token)).finish(),
            Credentials::UsernamePassword { username, .. } => f
                .debug_struct("UsernamePassword")
                .field("username", username)
                .field("password", &"****")
                .finish(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRule {
    #[serde(rename = "type", default = "default_retention_type")]
    pub rule_type: String,
    #[serde(rename = "everySeconds")]
    pub every_seconds: u64,
}

fn default_retention_type() -> String {
    "expire".to_string()
}

impl RetentionRule {
    pub fn expire(every_seconds: u64) -> Self {
        Self {
            rule_type: default_retention_type(),
            every_seconds,
        }
    }
}

/// A bucket as returned by `/api/v2/buckets`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    #[serde(rename = "orgID", default)]
    pub org_id: String,
    #[serde(rename = "retentionRules", default)]
    pub retention_rules: Vec<RetentionRule>,
    #[serde(rename = "createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Bucket {
    /// Retention in seconds; 0 means infinite.
    pub fn retention_seconds(&self) -> u64 {
        self.retention_rules
            .iter()
            .find(|r| r.rule_type == "expire")
            .map_or(0, |r| r.every_seconds)
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct BucketsResponse {
    #[serde(default)]
    pub buckets: Vec<Bucket>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateBucketRequest<'a> {
    #[serde(rename = "orgID")]
    pub org_id: &'a str,
    pub name: &'a str,
    #[serde(rename = "retentionRules")]
    pub retention_rules: Vec<RetentionRule>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionAction {
    Read,
    Write,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionResource {
    #[serde(rename = "type")]
    pub resource_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "orgID", default, skip_serializing_if = "Option::is_none")]
    pub org_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    pub action: PermissionAction,
    pub resource: PermissionResource,
}

impl Permission {
    /// Write access to a single bucket.
    pub fn write_bucket(bucket_id: impl Into<String>, org_id: impl Into<String>) -> Self {
        Self {
            action: PermissionAction::Write,
            resource: PermissionResource {
                resource_type: "buckets".to_string(),
                id: Some(bucket_id.into()),
                org_id: Some(org_id.into()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct CreateAuthorizationRequest<'a> {
    #[serde(rename = "orgID")]
    pub org_id: &'a str,
    pub description: &'a str,
    pub permissions: &'a [Permission],
}

/// An authorization (API token) as returned by `/api/v2/authorizations`.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct Authorization {
    #[serde(default)]
    pub id: String,
    pub token: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "orgID", default)]
    pub org_id: String,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl fmt::Debug for Authorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authorization")
            .field("id", &self.id)
            .field("token", &redact_secret(&self.token))
            .field("status", &self.status)
            .field("description", &self.description)
            .field("org_id", &self.org_id)
            .field("permissions", &self.permissions)
            .finish()
    }
}

/// InfluxDB error body: `{"code": "...", "message": "..."}`
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message: String,
}
