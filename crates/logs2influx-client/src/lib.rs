//! InfluxDB v2 client for logs2influx.
//!
//! [`InfluxApi`] is the seam the sink talks through; [`InfluxClient`] implements
//! it over any [`HttpClient`], and [`HttpConnector`] opens reqwest-backed
//! clients for token or username/password credentials.

pub mod client;
pub mod connector;
pub mod error;
pub mod http;
pub mod types;

pub use client::{InfluxApi, InfluxClient};
pub use connector::{Connector, HttpConnector};
pub use error::{ClientError, Result};
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use types::{
    Authorization, Bucket, Credentials, Permission, PermissionAction, PermissionResource,
    RetentionRule,
};
