use std::{env, fmt};

use serde::Deserialize;

use crate::error::{AwsError, AwsResult};

/// Access key pair used to sign EC2 API requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Body of `iam/security-credentials/<role>` on the metadata service.
#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstanceProfileCredentials {
    #[serde(default)]
    code: Option<String>,
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    token: Option<String>,
}

impl Credentials {
    /// Long-term key pair without a session token.
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Reads `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and `AWS_SESSION_TOKEN`.
    ///
    /// Returns `None` unless both keys are set and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let creds = Self::new(
            non_empty("AWS_ACCESS_KEY_ID")?,
            non_empty("AWS_SECRET_ACCESS_KEY")?,
        );
        Some(match non_empty("AWS_SESSION_TOKEN") {
            Some(token) => creds.with_session_token(token),
            None => creds,
        })
    }

    pub(crate) fn from_instance_profile_json(body: &str) -> AwsResult<Self> {
        let parsed: InstanceProfileCredentials = serde_json::from_str(body)
            .map_err(|e| AwsError::Decode(format!("instance profile credentials: {e}")))?;

        if let Some(code) = parsed.code.filter(|c| c != "Success") {
            return Err(AwsError::Credentials(format!(
                "instance profile returned code {code}"
            )));
        }

        Ok(Self {
            access_key_id: parsed.access_key_id,
            secret_access_key: parsed.secret_access_key,
            session_token: parsed.token,
        })
    }
}
