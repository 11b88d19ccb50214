//! InfluxDB batch sink for structured log events.
//!
//! [`InfluxSink::open`] validates [`SinkOptions`](logs2influx_config::SinkOptions),
//! optionally provisions the bucket and a write-scoped token, and opens the
//! write connection. Each [`BatchSink::emit_batch`] call then converts its
//! events to points and performs exactly one write.

pub mod credentials;
pub mod emitter;
pub mod error;
pub mod provision;
pub mod sink;

#[cfg(test)]
mod test_support;

pub use credentials::{privileged_credentials, write_credentials};
pub use emitter::BatchEmitter;
pub use error::{ErrorCode, Result, SinkError};
pub use provision::{ensure_bucket, provision, BucketRequest, ProvisionStage, Provisioned, WriteToken};
pub use sink::{BatchSink, InfluxSink};
