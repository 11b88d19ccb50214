//! Error types for the InfluxDB client

use thiserror::Error;

/// Errors raised while talking to InfluxDB
#[derive(Debug, Error)]
pub enum ClientError {
    /// The request never produced a response
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Transport failure without an underlying reqwest error
    #[error("HTTP transport error: {0}")]
    Transport(String),

    /// InfluxDB answered with a non-2xx status
    #[error("InfluxDB API error (HTTP {status}, code '{code}'): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// A 2xx response body did not match the expected shape
    #[error("Failed to decode {what} response: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid InfluxDB URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Username/password sign-in did not yield a session
    #[error("Sign-in failed: {0}")]
    SignIn(String),
}

impl ClientError {
    /// HTTP status of an API error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

/// Result type alias for ClientError
pub type Result<T> = std::result::Result<T, ClientError>;
