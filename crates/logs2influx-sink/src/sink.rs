//! Sink lifecycle: validate, provision, connect, emit, close.

use std::sync::Arc;

use async_trait::async_trait;
use logs2influx_client::{Connector, InfluxApi};
use logs2influx_config::{validate_sink_options, ConfigError, SinkOptions};
use logs2influx_core::{HostInfo, HostSnapshot, LogEvent, PointBuilder};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::credentials::write_credentials;
use crate::emitter::BatchEmitter;
use crate::error::{Result, SinkError};
use crate::provision::{provision, ProvisionStage, Provisioned};

/// Flush callback driven by an external batching scheduler.
///
/// Callers serialize invocations; one batch is in flight at a time.
#[async_trait]
pub trait BatchSink: Send + Sync {
    async fn emit_batch(&self, events: &[LogEvent]) -> Result<()>;

    async fn emit_empty_batch(&self) -> Result<()>;
}

/// A ready-to-use InfluxDB sink owning its write connection.
pub struct InfluxSink<A: InfluxApi> {
    emitter: BatchEmitter,
    connection: Mutex<Option<Arc<A>>>,
    provisioned: Provisioned,
}

impl<A: InfluxApi + 'static> InfluxSink<A> {
    /// Validate options, provision the bucket if asked to, and open the write
    /// connection. Host metadata is captured from the running process.
    pub async fn open<C>(options: &SinkOptions, connector: &C) -> Result<Self>
    where
        C: Connector<Api = A> + ?Sized,
    {
        Self::open_with_host(options, connector, Arc::new(HostSnapshot::current())).await
    }

    pub async fn open_with_host<C>(
        options: &SinkOptions,
        connector: &C,
        host: Arc<dyn HostInfo>,
    ) -> Result<Self>
    where
        C: Connector<Api = A> + ?Sized,
    {
        validate_sink_options(options)?;
        let builder_options = options.to_builder_options()?;
        let conn = options
            .connection_info
            .as_ref()
            .ok_or_else(|| ConfigError::MissingField {
                field: "ConnectionInfo".to_string(),
            })?;

        let mut credentials = write_credentials(conn)?;

        let provisioned = provision(connector, conn, &credentials).await?;
        if let Some(token) = provisioned.minted_token() {
            debug!(bucket = %conn.bucket_name, "Using minted write token");
            credentials = token.clone().into_credentials();
        }

        let api = connector
            .connect(&conn.uri, &credentials)
            .await
            .map_err(|e| {
                SinkError::provisioning(
                    ProvisionStage::Connect,
                    &conn.bucket_name,
                    &conn.organization_id,
                    e,
                )
            })?;

        info!(
            uri = %conn.uri,
            bucket = %conn.bucket_name,
            org = %conn.organization_id,
            auth = credentials.kind(),
            measurement = %builder_options.measurement_name,
            "InfluxDB sink opened"
        );

        let builder = PointBuilder::new(builder_options, host);
        Ok(Self {
            emitter: BatchEmitter::new(builder, &conn.bucket_name, &conn.organization_id),
            connection: Mutex::new(Some(Arc::new(api))),
            provisioned,
        })
    }

    pub fn provisioned(&self) -> &Provisioned {
        &self.provisioned
    }

    pub fn is_closed(&self) -> bool {
        self.connection.lock().is_none()
    }

    /// Release the write connection. Returns `true` only for the call that
    /// actually released it; an in-flight write keeps its own handle.
    pub fn close(&self) -> bool {
        let released = self.connection.lock().take().is_some();
        if released {
            info!(bucket = %self.emitter.bucket(), "InfluxDB sink closed");
        }
        released
    }

    fn connection(&self) -> Result<Arc<A>> {
        self.connection.lock().clone().ok_or_else(SinkError::closed)
    }
}

#[async_trait]
impl<A: InfluxApi + 'static> BatchSink for InfluxSink<A> {
    async fn emit_batch(&self, events: &[LogEvent]) -> Result<()> {
        if events.is_empty() {
            return self.emit_empty_batch().await;
        }
        let api = self.connection()?;
        self.emitter.emit(api.as_ref(), events).await?;
        Ok(())
    }

    async fn emit_empty_batch(&self) -> Result<()> {
        self.emitter.emit_empty()
    }
}

impl<A: InfluxApi> std::fmt::Debug for InfluxSink<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxSink")
            .field("emitter", &self.emitter)
            .field("closed", &self.connection.lock().is_none())
            .field("provisioned", &self.provisioned)
            .finish()
    }
}
