//! Error types for the sink

use logs2influx_client::ClientError;
use logs2influx_config::ConfigError;
use thiserror::Error;

use crate::provision::ProvisionStage;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E101: Sink options missing or invalid
    E101InvalidConfig,
    /// E102: Bucket or write token could not be provisioned
    E102Provisioning,
    /// E103: Batch write rejected or not delivered
    E103WriteFailure,
    /// E104: Sink used after close
    E104Closed,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E101InvalidConfig => "E101",
            Self::E102Provisioning => "E102",
            Self::E103WriteFailure => "E103",
            Self::E104Closed => "E104",
        }
    }

    pub fn docs_url(&self) -> String {
        format!(
            "https://github.com/logs2influx/logs2influx/blob/main/docs/troubleshooting.md#{}",
            self.as_str().to_lowercase()
        )
    }
}

/// Errors that can occur while opening or using the sink
#[derive(Debug, Error)]
pub enum SinkError {
    /// Options failed validation; no network call was made
    #[error("[{code}] Invalid sink configuration: {source}\n\nSee: {docs_url}")]
    Configuration {
        code: &'static str,
        #[source]
        source: ConfigError,
        docs_url: String,
    },

    /// Bucket lookup, creation or token minting failed
    #[error("[{code}] Provisioning failed at stage '{stage}' for bucket '{bucket}' in organization '{organization}': {source}\n\nTroubleshooting:\n  • Check that the provisioning token may read and create buckets and authorizations\n  • Set ConnectionInfo.AllAccessToken when the write token is scoped to a single bucket\n  • Verify ConnectionInfo.OrganizationId is the organization ID, not its name\n\nSee: {docs_url}")]
    Provisioning {
        code: &'static str,
        stage: ProvisionStage,
        bucket: String,
        organization: String,
        #[source]
        source: ClientError,
        docs_url: String,
    },

    /// The single write of a batch failed
    #[error("[{code}] Write of {points} points to bucket '{bucket}' in organization '{organization}' failed: {source}\n\nSee: {docs_url}")]
    Write {
        code: &'static str,
        bucket: String,
        organization: String,
        points: usize,
        #[source]
        source: ClientError,
        docs_url: String,
    },

    #[error("[{code}] Sink is closed\n\nSee: {docs_url}")]
    Closed { code: &'static str, docs_url: String },
}

impl SinkError {
    /// Create a configuration error with error code
    pub fn configuration(source: ConfigError) -> Self {
        let code_enum = ErrorCode::E101InvalidConfig;
        Self::Configuration {
            code: code_enum.as_str(),
            source,
            docs_url: code_enum.docs_url(),
        }
    }

    /// Create a provisioning error with error code
    pub fn provisioning(
        stage: ProvisionStage,
        bucket: &str,
        organization: &str,
        source: ClientError,
    ) -> Self {
        let code_enum = ErrorCode::E102Provisioning;
        Self::Provisioning {
            code: code_enum.as_str(),
            stage,
            bucket: bucket.to_string(),
            organization: organization.to_string(),
            source,
            docs_url: code_enum.docs_url(),
        }
    }

    /// Create a write failure error with error code
    pub fn write(bucket: &str, organization: &str, points: usize, source: ClientError) -> Self {
        let code_enum = ErrorCode::E103WriteFailure;
        Self::Write {
            code: code_enum.as_str(),
            bucket: bucket.to_string(),
            organization: organization.to_string(),
            points,
            source,
            docs_url: code_enum.docs_url(),
        }
    }

    pub fn closed() -> Self {
        let code_enum = ErrorCode::E104Closed;
        Self::Closed {
            code: code_enum.as_str(),
            docs_url: code_enum.docs_url(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Configuration { .. } => ErrorCode::E101InvalidConfig,
            Self::Provisioning { .. } => ErrorCode::E102Provisioning,
            Self::Write { .. } => ErrorCode::E103WriteFailure,
            Self::Closed { .. } => ErrorCode::E104Closed,
        }
    }
}

impl From<ConfigError> for SinkError {
    fn from(source: ConfigError) -> Self {
        Self::configuration(source)
    }
}

/// Result type alias for SinkError
pub type Result<T> = std::result::Result<T, SinkError>;
