//! Recording fakes for the client seams.

use std::sync::Arc;

use async_trait::async_trait;
use logs2influx_client::{
    Authorization, Bucket, ClientError, Connector, Credentials, InfluxApi, Permission,
    Result as ClientResult,
};
use logs2influx_core::Point;
use parking_lot::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FindBucket { name: String, org_id: String },
    CreateBucket { name: String, retention_seconds: u64, org_id: String },
    CreateAuthorization { org_id: String, permissions: Vec<Permission>, description: String },
    Write { points: Vec<Point>, bucket: String, org_id: String },
}

/// Scripted InfluxApi. Unscripted calls succeed with plausible defaults.
#[derive(Default)]
pub struct MockApi {
    pub existing_bucket: Mutex<Option<Bucket>>,
    pub fail_lookup: Mutex<Option<u16>>,
    pub fail_create: Mutex<Option<u16>>,
    pub fail_authorization: Mutex<Option<u16>>,
    pub fail_write: Mutex<Option<u16>>,
    pub calls: Mutex<Vec<Call>>,
}

pub fn bucket(id: &str, name: &str, org_id: &str) -> Bucket {
    Bucket {
        id: id.to_string(),
        name: name.to_string(),
        org_id: org_id.to_string(),
        retention_rules: Vec::new(),
        created_at: None,
    }
}

fn api_error(status: u16) -> ClientError {
    ClientError::Api {
        status,
        code: "forbidden".to_string(),
        message: "insufficient permissions".to_string(),
    }
}

impl MockApi {
    pub fn with_existing_bucket(bucket: Bucket) -> Self {
        let api = Self::default();
        *api.existing_bucket.lock() = Some(bucket);
        api
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn writes(&self) -> Vec<Vec<Point>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Write { points, .. } => Some(points),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl InfluxApi for MockApi {
    async fn find_bucket_by_name(&self, name: &str, org_id: &str) -> ClientResult<Option<Bucket>> {
        self.calls.lock().push(Call::FindBucket {
            name: name.to_string(),
            org_id: org_id.to_string(),
        });
        if let Some(status) = *self.fail_lookup.lock() {
            return Err(api_error(status));
        }
        Ok(self.existing_bucket.lock().clone())
    }

    async fn create_bucket(
        &self,
        name: &str,
        retention_seconds: u64,
        org_id: &str,
    ) -> ClientResult<Bucket> {
        self.calls.lock().push(Call::CreateBucket {
            name: name.to_string(),
            retention_seconds,
            org_id: org_id.to_string(),
        });
        if let Some(status) = *self.fail_create.lock() {
            return Err(api_error(status));
        }
        Ok(bucket("new-bucket-id", name, org_id))
    }

    async fn create_authorization(
        &self,
        org_id: &str,
        permissions: &[Permission],
        description: &str,
    ) -> ClientResult<Authorization> {
        self.calls.lock().push(Call::CreateAuthorization {
            org_id: org_id.to_string(),
            permissions: permissions.to_vec(),
            description: description.to_string(),
        });
        if let Some(status) = *self.fail_authorization.lock() {
            return Err(api_error(status));
        }
        Ok(Authorization {
            id: "auth-1".to_string(),
            token: "minted-write-token".to_string(),
            status: Some("active".to_string()),
            description: Some(description.to_string()),
            org_id: org_id.to_string(),
            permissions: permissions.to_vec(),
        })
    }

    async fn write_points(&self, points: &[Point], bucket: &str, org_id: &str) -> ClientResult<()> {
        self.calls.lock().push(Call::Write {
            points: points.to_vec(),
            bucket: bucket.to_string(),
            org_id: org_id.to_string(),
        });
        if let Some(status) = *self.fail_write.lock() {
            return Err(api_error(status));
        }
        Ok(())
    }
}

/// Hands out one shared MockApi and records the credentials of each connect.
pub struct MockConnector {
    pub api: Arc<MockApi>,
    pub connections: Mutex<Vec<Credentials>>,
}

impl MockConnector {
    pub fn new(api: MockApi) -> Self {
        Self {
            api: Arc::new(api),
            connections: Mutex::new(Vec::new()),
        }
    }

    pub fn connections(&self) -> Vec<Credentials> {
        self.connections.lock().clone()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Api = Arc<MockApi>;

    async fn connect(&self, _uri: &str, credentials: &Credentials) -> ClientResult<Self::Api> {
        self.connections.lock().push(credentials.clone());
        Ok(Arc::clone(&self.api))
    }
}
