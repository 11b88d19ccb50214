//! Batch emission: one point per event, one write per batch.

use logs2influx_client::InfluxApi;
use logs2influx_core::{LogEvent, PointBuilder};
use tracing::{debug, warn};

use crate::error::{Result, SinkError};

/// Converts events to points and submits them for one bucket.
#[derive(Debug, Clone)]
pub struct BatchEmitter {
    builder: PointBuilder,
    bucket: String,
    organization_id: String,
}

impl BatchEmitter {
    pub fn new(
        builder: PointBuilder,
        bucket: impl Into<String>,
        organization_id: impl Into<String>,
    ) -> Self {
        Self {
            builder,
            bucket: bucket.into(),
            organization_id: organization_id.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn organization_id(&self) -> &str {
        &self.organization_id
    }

    /// Build points in input order and write them in a single call.
    ///
    /// Write errors are returned as-is inside [`SinkError::Write`]; retrying
    /// is left to the caller. An empty batch makes no call.
    pub async fn emit<A: InfluxApi + ?Sized>(&self, api: &A, events: &[LogEvent]) -> Result<usize> {
        if events.is_empty() {
            return Ok(0);
        }

        let points = self.builder.build_all(events);

        let empty = points.iter().filter(|p| !p.has_fields()).count();
        if empty > 0 {
            warn!(
                points_without_fields = empty,
                bucket = %self.bucket,
                "Submitting points without fields; InfluxDB will reject them. Enable IncludeDefaultFields or configure ExtendedFields"
            );
        }

        debug!(
            points = points.len(),
            bucket = %self.bucket,
            "Writing batch"
        );

        api.write_points(&points, &self.bucket, &self.organization_id)
            .await
            .map_err(|e| SinkError::write(&self.bucket, &self.organization_id, points.len(), e))?;

        Ok(points.len())
    }

    /// Nothing to send; never touches the connection.
    pub fn emit_empty(&self) -> Result<()> {
        Ok(())
    }
}
