//! Credential resolution from connection settings.

use logs2influx_client::Credentials;
use logs2influx_config::{ConfigError, ConnectionInfo};

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

/// Credentials for the write connection: username/password when a username
/// is configured, else the token, else the all-access token.
pub fn write_credentials(conn: &ConnectionInfo) -> Result<Credentials, ConfigError> {
    if let Some(username) = non_blank(&conn.username) {
        let password = non_blank(&conn.password).ok_or_else(|| ConfigError::MissingField {
            field: "ConnectionInfo.Password".to_string(),
        })?;
        return Ok(Credentials::username_password(username, password));
    }

    non_blank(&conn.token)
        .or_else(|| non_blank(&conn.all_access_token))
        .map(Credentials::token)
        .ok_or_else(|| ConfigError::InvalidValue {
            field: "ConnectionInfo.Token".to_string(),
            reason: "one of Token, AllAccessToken or Username must be set".to_string(),
        })
}

/// Credentials for provisioning: the all-access token when present,
/// otherwise the write credentials.
pub fn privileged_credentials(conn: &ConnectionInfo, write: &Credentials) -> Credentials {
    match non_blank(&conn.all_access_token) {
        Some(token) => Credentials::token(token),
        None => write.clone(),
    }
}
