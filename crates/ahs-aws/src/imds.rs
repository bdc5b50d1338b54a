//! EC2 instance metadata service client (IMDSv2 with IMDSv1 fallback).
use std::{sync::Mutex, time::Duration};

use ahs_core::{error::CoreError, error::CoreResult, identity::MetadataSource};
use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, trace};

use crate::{
    credentials::Credentials,
    error::{AwsError, AwsResult},
};

/// Link-local address of the metadata service.
pub const DEFAULT_IMDS_ENDPOINT: &str = "http://169.254.169.254";

const TOKEN_PATH: &str = "/latest/api/token";
const META_DATA_PATH: &str = "/latest/meta-data/";
const TOKEN_HEADER: &str = "x-aws-ec2-metadata-token";
const TOKEN_TTL_HEADER: &str = "x-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_TTL_SECONDS: u32 = 21_600;

const NO_ROLE: &str = "no instance profile role attached";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone)]
enum Session {
    /// IMDSv2 session token.
    Token(String),
    /// Token endpoint refused; requests go unauthenticated.
    V1,
}

/// Client of the instance metadata service.
///
/// The IMDSv2 session token is fetched on first use and cached until the service
/// rejects it.
pub struct ImdsClient {
    http: reqwest::Client,
    endpoint: String,
    session: Mutex<Option<Session>>,
}

impl ImdsClient {
    /// Client for `endpoint`, usually [`DEFAULT_IMDS_ENDPOINT`].
    ///
    /// Timeouts are short: off EC2 the link-local address never answers.
    pub fn new(endpoint: impl Into<String>) -> AwsResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            session: Mutex::new(None),
        })
    }

    fn cached_session(&self) -> Option<Session> {
        self.session.lock().ok().and_then(|s| s.clone())
    }

    fn store_session(&self, session: Option<Session>) {
        if let Ok(mut slot) = self.session.lock() {
            *slot = session;
        }
    }

    async fn session(&self) -> AwsResult<Session> {
        if let Some(session) = self.cached_session() {
            return Ok(session);
        }

        let resp = self
            .http
            .put(format!("{}{TOKEN_PATH}", self.endpoint))
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS.to_string())
            .send()
            .await?;

        let session = match resp.status() {
            s if s.is_success() => Session::Token(resp.text().await?.trim().to_string()),
            StatusCode::FORBIDDEN | StatusCode::NOT_FOUND | StatusCode::METHOD_NOT_ALLOWED => {
                debug!(status = %resp.status(), "metadata token refused, falling back to IMDSv1");
                Session::V1
            }
            s => {
                let body = resp.text().await.unwrap_or_default();
                return Err(AwsError::status(s.as_u16(), &body));
            }
        };

        self.store_session(Some(session.clone()));
        Ok(session)
    }

    /// Fetches `/latest/meta-data/<path>` as trimmed text.
    pub async fn get(&self, path: &str) -> AwsResult<String> {
        let session = self.session().await?;
        let mut req = self
            .http
            .get(format!("{}{META_DATA_PATH}{path}", self.endpoint));
        if let Session::Token(token) = &session {
            req = req.header(TOKEN_HEADER, token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        trace!(path, status = %status, "metadata response");

        if status == StatusCode::UNAUTHORIZED {
            // Expired or rejected token: the next call starts a new session.
            self.store_session(None);
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AwsError::status(status.as_u16(), &body));
        }

        Ok(resp.text().await?.trim().to_string())
    }

    /// Temporary credentials of the instance profile role.
    ///
    /// A 404 on the role listing means no instance profile is attached.
    pub async fn instance_credentials(&self) -> AwsResult<Credentials> {
        let roles = match self.get("iam/security-credentials/").await {
            Err(AwsError::Status { status: 404, .. }) => {
                return Err(AwsError::Credentials(NO_ROLE.into()));
            }
            other => other?,
        };
        let role = roles
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .ok_or_else(|| AwsError::Credentials(NO_ROLE.into()))?;

        debug!(role, "loading instance profile credentials");
        let body = self.get(&format!("iam/security-credentials/{role}")).await?;
        Credentials::from_instance_profile_json(&body)
    }
}

#[async_trait]
impl MetadataSource for ImdsClient {
    async fn check_available(&self) -> CoreResult<()> {
        self.get("instance-id")
            .await
            .map(|_| ())
            .map_err(|e| CoreError::MetadataUnavailable(e.to_string()))
    }

    async fn availability_zone(&self) -> CoreResult<String> {
        self.get("placement/availability-zone")
            .await
            .map_err(AwsError::into_metadata_error)
    }

    async fn instance_id(&self) -> CoreResult<String> {
        self.get("instance-id")
            .await
            .map_err(AwsError::into_metadata_error)
    }
}
