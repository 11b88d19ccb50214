//! InfluxDB v2 REST client.
//!
//! Implements just the calls the sink needs: bucket lookup and creation,
//! authorization minting and line protocol writes.

use std::sync::Arc;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use logs2influx_core::{encode_batch, Point, WritePrecision};
use tracing::{debug, instrument};
use url::Url;

use crate::error::{ClientError, Result};
use crate::http::{HttpClient, HttpResponse};
use crate::types::{
    Authorization, Bucket, BucketsResponse, CreateAuthorizationRequest, CreateBucketRequest,
    Credentials, ErrorBody, Permission, RetentionRule,
};

/// Operations the sink performs against InfluxDB.
#[async_trait]
pub trait InfluxApi: Send + Sync {
    /// Look a bucket up by exact name within an organization.
    async fn find_bucket_by_name(&self, name: &str, org_id: &str) -> Result<Option<Bucket>>;

    /// Create a bucket. `retention_seconds == 0` keeps data forever.
    async fn create_bucket(&self, name: &str, retention_seconds: u64, org_id: &str)
        -> Result<Bucket>;

    async fn create_authorization(
        &self,
        org_id: &str,
        permissions: &[Permission],
        description: &str,
    ) -> Result<Authorization>;

    /// Write all points in a single request.
    async fn write_points(&self, points: &[Point], bucket: &str, org_id: &str) -> Result<()>;
}

#[async_trait]
impl<A: InfluxApi + ?Sized> InfluxApi for Arc<A> {
    async fn find_bucket_by_name(&self, name: &str, org_id: &str) -> Result<Option<Bucket>> {
        (**self).find_bucket_by_name(name, org_id).await
    }

    async fn create_bucket(
        &self,
        name: &str,
        retention_seconds: u64,
        org_id: &str,
    ) -> Result<Bucket> {
        (**self).create_bucket(name, retention_seconds, org_id).await
    }

    async fn create_authorization(
        &self,
        org_id: &str,
        permissions: &[Permission],
        description: &str,
    ) -> Result<Authorization> {
        (**self)
            .create_authorization(org_id, permissions, description)
            .await
    }

    async fn write_points(&self, points: &[Point], bucket: &str, org_id: &str) -> Result<()> {
        (**self).write_points(points, bucket, org_id).await
    }
}

/// Header sent with every API call.
#[derive(Clone)]
enum AuthHeader {
    Token(String),
    Session(String),
}

impl AuthHeader {
    fn to_header(&self) -> (String, String) {
        match self {
            AuthHeader::Token(token) => ("Authorization".to_string(), format!("Token {}", token)),
            AuthHeader::Session(cookie) => ("Cookie".to_string(), cookie.clone()),
        }
    }
}

/// InfluxDB v2 client
///
/// Generic over HttpClient implementation so tests can script responses.
pub struct InfluxClient<T: HttpClient> {
    http: T,
    base_url: Url,
    auth: AuthHeader,
}

/// Parse the server URI, keeping any path prefix as a directory.
fn parse_base_url(uri: &str) -> Result<Url> {
    let trimmed = uri.trim();
    let with_slash = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{}/", trimmed)
    };
    Url::parse(&with_slash).map_err(|source| ClientError::InvalidUrl {
        url: uri.to_string(),
        source,
    })
}

impl<T: HttpClient> InfluxClient<T> {
    /// Client authenticating with an API token.
    pub fn with_token(http: T, uri: &str, token: impl Into<String>) -> Result<Self> {
        Ok(Self {
            http,
            base_url: parse_base_url(uri)?,
            auth: AuthHeader::Token(token.into()),
        })
    }

    /// Sign in with username and password and keep the session cookie.
    ///
    /// Calls: POST /api/v2/signin
    #[instrument(skip(http, password))]
    pub async fn sign_in(http: T, uri: &str, username: &str, password: &str) -> Result<Self> {
        let base_url = parse_base_url(uri)?;
        let url = join(&base_url, "api/v2/signin", &[])?;
        let basic = BASE64.encode(format!("{}:{}", username, password));

        let response = http
            .post(
                &url,
                vec![("Authorization".to_string(), format!("Basic {}", basic))],
                Vec::new(),
            )
            .await?;

        if !response.is_success() {
            return Err(api_error(&response));
        }

        let cookie = response
            .header("set-cookie")
            .and_then(|c| c.split(';').next())
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ClientError::SignIn("response carried no session cookie".to_string()))?
            .to_string();

        debug!("Signed in to InfluxDB");

        Ok(Self {
            http,
            base_url,
            auth: AuthHeader::Session(cookie),
        })
    }

    /// Authenticate with whichever credentials were resolved.
    pub async fn connect(http: T, uri: &str, credentials: &Credentials) -> Result<Self> {
        match credentials {
            Credentials::Token(token) => Self::with_token(http, uri, token.clone()),
            Credentials::UsernamePassword { username, password } => {
                Self::sign_in(http, uri, username, password).await
            }
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn headers(&self, extra: &[(&str, &str)]) -> Vec<(String, String)> {
        let mut headers = vec![self.auth.to_header()];
        headers.extend(extra.iter().map(|(k, v)| (k.to_string(), v.to_string())));
        headers
    }
}

fn join(base: &Url, path: &str, query: &[(&str, &str)]) -> Result<String> {
    let mut url = base.join(path).map_err(|source| ClientError::InvalidUrl {
        url: format!("{}{}", base, path),
        source,
    })?;
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url.into())
}

/// Map a non-2xx response, preferring InfluxDB's JSON error body.
fn api_error(response: &HttpResponse) -> ClientError {
    match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) if !body.message.is_empty() => ClientError::Api {
            status: response.status,
            code: body.code,
            message: body.message,
        },
        _ => ClientError::Api {
            status: response.status,
            code: String::new(),
            message: response.body_string(),
        },
    }
}

const JSON_HEADERS: &[(&str, &str)] = &[
    ("Content-Type", "application/json"),
    ("Accept", "application/json"),
];

#[async_trait]
impl<T: HttpClient> InfluxApi for InfluxClient<T> {
    /// Calls: GET /api/v2/buckets?name={name}&orgID={org_id}
    #[instrument(skip(self))]
    async fn find_bucket_by_name(&self, name: &str, org_id: &str) -> Result<Option<Bucket>> {
        let url = join(
            &self.base_url,
            "api/v2/buckets",
            &[("name", name), ("orgID", org_id)],
        )?;
        debug!("Looking up bucket");

        let response = self
            .http
            .get(&url, self.headers(&[("Accept", "application/json")]))
            .await?;

        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(api_error(&response));
        }

        let buckets: BucketsResponse = response.json("bucket list")?;
        Ok(buckets.buckets.into_iter().find(|b| b.name == name))
    }

    /// Calls: POST /api/v2/buckets
    #[instrument(skip(self))]
    async fn create_bucket(
        &self,
        name: &str,
        retention_seconds: u64,
        org_id: &str,
    ) -> Result<Bucket> {
        let url = join(&self.base_url, "api/v2/buckets", &[])?;
        let retention_rules = if retention_seconds == 0 {
            Vec::new()
        } else {
            vec![RetentionRule::expire(retention_seconds)]
        };
        let request = CreateBucketRequest {
            org_id,
            name,
            retention_rules,
        };
        let body = serde_json::to_vec(&request).map_err(|source| ClientError::Decode {
            what: "create bucket request",
            source,
        })?;

        let response = self.http.post(&url, self.headers(JSON_HEADERS), body).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }

        response.json("created bucket")
    }

    /// Calls: POST /api/v2/authorizations
    #[instrument(skip(self, permissions), fields(permissions = permissions.len()))]
    async fn create_authorization(
        &self,
        org_id: &str,
        permissions: &[Permission],
        description: &str,
    ) -> Result<Authorization> {
        let url = join(&self.base_url, "api/v2/authorizations", &[])?;
        let request = CreateAuthorizationRequest {
            org_id,
            description,
            permissions,
        };
        let body = serde_json::to_vec(&request).map_err(|source| ClientError::Decode {
            what: "create authorization request",
            source,
        })?;

        let response = self.http.post(&url, self.headers(JSON_HEADERS), body).await?;
        if !response.is_success() {
            return Err(api_error(&response));
        }

        response.json("created authorization")
    }

    /// Calls: POST /api/v2/write?orgID={org_id}&bucket={bucket}&precision={precision}
    #[instrument(skip(self, points), fields(points = points.len()))]
    async fn write_points(&self, points: &[Point], bucket: &str, org_id: &str) -> Result<()> {
        let precision = points
            .first()
            .map(Point::precision)
            .unwrap_or(WritePrecision::Ms);
        let url = join(
            &self.base_url,
            "api/v2/write",
            &[
                ("orgID", org_id),
                ("bucket", bucket),
                ("precision", precision.as_str()),
            ],
        )?;
        let body = encode_batch(points);
        debug!(bytes = body.len(), "Writing points");

        let response = self
            .http
            .post(
                &url,
                self.headers(&[("Content-Type", "text/plain; charset=utf-8")]),
                body.into_bytes(),
            )
            .await?;

        if !response.is_success() {
            return Err(api_error(&response));
        }

        Ok(())
    }
}
