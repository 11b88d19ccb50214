//! Core log event to InfluxDB point conversion.
//!
//! This crate is pure: it maps structured log events onto syslog-style
//! InfluxDB points and encodes them as line protocol. It performs no I/O
//! beyond the host lookup done by [`HostSnapshot::current`].
//!
//! ```text
//! LogEvent --> PointBuilder (severity + escape + extended specs) --> Point --> line protocol
//! ```

pub mod builder;
pub mod escape;
pub mod event;
pub mod extended;
pub mod host;
pub mod line_protocol;
pub mod point;
pub mod redact;
pub mod severity;

pub use builder::{BuilderOptions, PointBuilder, DEFAULT_MEASUREMENT_NAME};
pub use escape::escape;
pub use event::{ExceptionInfo, Level, LogEvent, ParseLevelError, PropertyValue};
pub use extended::{ExtendedSpec, ExtendedSpecError};
pub use host::{HostInfo, HostSnapshot};
pub use line_protocol::{encode_batch, escape_tag_value};
pub use point::{FieldValue, Point, WritePrecision};
pub use redact::redact_secret;
pub use severity::{severity, Severity};
