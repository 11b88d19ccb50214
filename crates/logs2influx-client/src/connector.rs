//! Opening authenticated connections.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::client::{InfluxApi, InfluxClient};
use crate::error::Result;
use crate::http::{ReqwestHttpClient, DEFAULT_TIMEOUT};
use crate::types::Credentials;

/// Opens an [`InfluxApi`] connection for a server and a set of credentials.
///
/// The sink opens at most two connections through this seam: a privileged
/// one for provisioning and the long-lived write connection.
#[async_trait]
pub trait Connector: Send + Sync {
    type Api: InfluxApi + 'static;

    async fn connect(&self, uri: &str, credentials: &Credentials) -> Result<Self::Api>;
}

/// Connector backed by reqwest.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for HttpConnector {
    type Api = InfluxClient<ReqwestHttpClient>;

    async fn connect(&self, uri: &str, credentials: &Credentials) -> Result<Self::Api> {
        debug!(uri, auth = credentials.kind(), "Opening InfluxDB connection");
        let http = ReqwestHttpClient::with_timeout(self.timeout)?;
        InfluxClient::connect(http, uri, credentials).await
    }
}
