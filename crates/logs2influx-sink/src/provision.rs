//! Bucket provisioning.
//!
//! Runs once while the sink opens. With auto-create disabled nothing is
//! contacted. Otherwise a privileged connection looks the bucket up by name,
//! creates it when absent and, for token-authenticated sinks, mints a token
//! scoped to writing that one bucket:
//!
//! ```text
//! Start --disabled--> Ready
//! Start --enabled--> Lookup --found--> Ready
//!                    Lookup --absent--> Create --token auth--> MintToken --> Ready
//!                                       Create --password auth--> Ready
//! any stage --error--> SinkError::Provisioning
//! ```

use std::fmt;

use logs2influx_client::{Bucket, Connector, Credentials, InfluxApi, Permission};
use logs2influx_config::ConnectionInfo;
use logs2influx_core::redact_secret;
use tracing::{debug, info};

use crate::credentials::privileged_credentials;
use crate::error::{Result, SinkError};

/// Where provisioning was when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionStage {
    Connect,
    Lookup,
    Create,
    MintToken,
}

impl ProvisionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProvisionStage::Connect => "connect",
            ProvisionStage::Lookup => "lookup",
            ProvisionStage::Create => "create",
            ProvisionStage::MintToken => "mint-token",
        }
    }
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A freshly minted write-scoped token.
#[derive(Clone, PartialEq, Eq)]
pub struct WriteToken(String);

impl WriteToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_credentials(self) -> Credentials {
        Credentials::Token(self.0)
    }
}

impl fmt::Debug for WriteToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("WriteToken")
            .field(&redact_secret(&self.0))
            .finish()
    }
}

/// Outcome of provisioning.
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    /// Auto-create disabled; nothing was contacted.
    Skipped,
    /// The bucket already existed and was left untouched.
    Existing(Bucket),
    Created {
        bucket: Bucket,
        minted_token: Option<WriteToken>,
    },
}

impl Provisioned {
    pub fn bucket(&self) -> Option<&Bucket> {
        match self {
            Provisioned::Skipped => None,
            Provisioned::Existing(bucket) | Provisioned::Created { bucket, .. } => Some(bucket),
        }
    }

    pub fn minted_token(&self) -> Option<&WriteToken> {
        match self {
            Provisioned::Created {
                minted_token: Some(token),
                ..
            } => Some(token),
            _ => None,
        }
    }
}

/// What to ensure on the server.
#[derive(Debug, Clone)]
pub struct BucketRequest<'a> {
    pub bucket: &'a str,
    pub organization_id: &'a str,
    /// 0 keeps data forever.
    pub retention_seconds: u64,
    pub mint_token: bool,
}

pub fn token_description(bucket: &str) -> String {
    format!("logs2influx write token for bucket '{}'", bucket)
}

/// Ensure the bucket exists, creating it (and optionally a write token) when
/// it does not.
pub async fn ensure_bucket<A: InfluxApi + ?Sized>(
    api: &A,
    request: &BucketRequest<'_>,
) -> Result<Provisioned> {
    let fail = |stage, source| {
        SinkError::provisioning(stage, request.bucket, request.organization_id, source)
    };

    let existing = api
        .find_bucket_by_name(request.bucket, request.organization_id)
        .await
        .map_err(|e| fail(ProvisionStage::Lookup, e))?;

    if let Some(bucket) = existing {
        info!(
            bucket = %bucket.name,
            bucket_id = %bucket.id,
            "Bucket already exists"
        );
        return Ok(Provisioned::Existing(bucket));
    }

    let bucket = api
        .create_bucket(
            request.bucket,
            request.retention_seconds,
            request.organization_id,
        )
        .await
        .map_err(|e| fail(ProvisionStage::Create, e))?;

    info!(
        bucket = %bucket.name,
        bucket_id = %bucket.id,
        retention_seconds = request.retention_seconds,
        "Created bucket"
    );

    if !request.mint_token {
        return Ok(Provisioned::Created {
            bucket,
            minted_token: None,
        });
    }

    let permissions = [Permission::write_bucket(
        bucket.id.clone(),
        request.organization_id,
    )];
    let authorization = api
        .create_authorization(
            request.organization_id,
            &permissions,
            &token_description(request.bucket),
        )
        .await
        .map_err(|e| fail(ProvisionStage::MintToken, e))?;

    info!(
        bucket = %bucket.name,
        authorization_id = %authorization.id,
        "Minted write token for bucket"
    );

    Ok(Provisioned::Created {
        bucket,
        minted_token: Some(WriteToken::new(authorization.token)),
    })
}

/// Run provisioning for a sink about to open with `write` credentials.
pub async fn provision<C: Connector + ?Sized>(
    connector: &C,
    conn: &ConnectionInfo,
    write: &Credentials,
) -> Result<Provisioned> {
    if !conn.create_bucket_if_not_exists {
        debug!(bucket = %conn.bucket_name, "Bucket auto-create disabled");
        return Ok(Provisioned::Skipped);
    }

    let privileged = privileged_credentials(conn, write);
    debug!(
        bucket = %conn.bucket_name,
        auth = privileged.kind(),
        "Opening provisioning connection"
    );
    let api = connector
        .connect(&conn.uri, &privileged)
        .await
        .map_err(|e| {
            SinkError::provisioning(
                ProvisionStage::Connect,
                &conn.bucket_name,
                &conn.organization_id,
                e,
            )
        })?;

    let request = BucketRequest {
        bucket: &conn.bucket_name,
        organization_id: &conn.organization_id,
        retention_seconds: conn.bucket_retention_period,
        mint_token: write.is_token(),
    };
    ensure_bucket(&api, &request).await
}
