use ahs_core::error::CoreError;
use thiserror::Error;

/// Failure talking to the metadata service or the EC2 API.
///
/// Messages stay on one line: response bodies are flattened and truncated.
#[derive(Debug, Error)]
pub enum AwsError {
    #[error("http transport error: {0}")]
    Transport(String),

    #[error("unexpected http status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("{code}: {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("no credentials available: {0}")]
    Credentials(String),

    #[error("cannot decode response: {0}")]
    Decode(String),

    #[error("cannot sign request: {0}")]
    Signing(String),

    #[error("invalid endpoint '{0}'")]
    Endpoint(String),
}

/// Longest response excerpt kept in an error message.
const MAX_EXCERPT_CHARS: usize = 160;

/// Collapses whitespace so a response body fits on one log line, then truncates it.
fn excerpt(body: &str) -> String {
    let flat = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= MAX_EXCERPT_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(MAX_EXCERPT_CHARS).collect();
    cut.push_str("...");
    cut
}

impl AwsError {
    /// Non-2xx response that is not a structured API error.
    pub fn status(status: u16, body: &str) -> Self {
        AwsError::Status {
            status,
            body: excerpt(body),
        }
    }

    /// Structured API error (`<Code>`/`<Message>`).
    pub fn api(status: u16, code: &str, message: &str) -> Self {
        AwsError::Api {
            status,
            code: excerpt(code),
            message: excerpt(message),
        }
    }

    /// Errors caused by throttling, server-side failures or eventual consistency.
    pub fn is_retryable(&self) -> bool {
        match self {
            AwsError::Transport(_) => true,
            AwsError::Status { status, .. } => *status == 429 || *status >= 500,
            AwsError::Api { status, code, .. } => {
                *status >= 500
                    || matches!(
                        code.as_str(),
                        "RequestLimitExceeded"
                            | "Throttling"
                            | "InternalError"
                            | "ServiceUnavailable"
                            | "Unavailable"
                    )
                    || code.starts_with("InvalidInstanceID")
            }
            AwsError::Credentials(_)
            | AwsError::Decode(_)
            | AwsError::Signing(_)
            | AwsError::Endpoint(_) => false,
        }
    }
}

impl AwsError {
    /// Tag store failure: retryable errors become [`CoreError::TagStore`], the rest are final.
    pub fn into_tag_store_error(self) -> CoreError {
        if self.is_retryable() {
            CoreError::TagStore(self.to_string())
        } else {
            CoreError::TagStoreRejected(self.to_string())
        }
    }

    /// Metadata service failure.
    ///
    /// A rejected session token (401) is retryable since the next call opens a new session.
    pub fn into_metadata_error(self) -> CoreError {
        let unauthorized = matches!(self, AwsError::Status { status: 401, .. });
        if unauthorized || self.is_retryable() {
            CoreError::Metadata(self.to_string())
        } else {
            CoreError::MetadataUnavailable(self.to_string())
        }
    }
}

impl From<reqwest::Error> for AwsError {
    fn from(e: reqwest::Error) -> Self {
        AwsError::Transport(e.to_string())
    }
}

pub type AwsResult<T> = Result<T, AwsError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, code: &str) -> AwsError {
        AwsError::Api {
            status,
            code: code.into(),
            message: "m".into(),
        }
    }

    #[test]
    fn throttling_and_server_errors_are_retryable() {
        assert!(api(400, "RequestLimitExceeded").is_retryable());
        assert!(api(503, "Unavailable").is_retryable());
        assert!(api(500, "Whatever").is_retryable());
        assert!(api(400, "InvalidInstanceID.NotFound").is_retryable());
        assert!(AwsError::Transport("reset".into()).is_retryable());
        assert!(AwsError::Status { status: 429, body: String::new() }.is_retryable());
    }

    #[test]
    fn permission_and_decode_errors_are_not() {
        assert!(!api(403, "UnauthorizedOperation").is_retryable());
        assert!(!api(401, "AuthFailure").is_retryable());
        assert!(!AwsError::Decode("bad xml".into()).is_retryable());
        assert!(!AwsError::Status { status: 404, body: String::new() }.is_retryable());
    }

    #[test]
    fn tag_store_mapping_keeps_retry_class() {
        assert!(api(503, "Unavailable").into_tag_store_error().is_transient());
        assert!(matches!(
            api(403, "UnauthorizedOperation").into_tag_store_error(),
            CoreError::TagStoreRejected(_)
        ));
    }

    #[test]
    fn messages_are_single_line() {
        let html = "<?xml version=\"1.0\"?>\n<html>\n  <head><title>404 - Not Found</title></head>\n</html>\n";
        let status = AwsError::status(404, html);
        assert_eq!(
            status.to_string(),
            "unexpected http status 404: <?xml version=\"1.0\"?> <html> <head><title>404 - Not Found</title></head> </html>"
        );

        let api = AwsError::api(400, "Bad\nCode", "line one\n  line two");
        assert_eq!(api.to_string(), "Bad Code: line one line two");

        for err in [status, api] {
            assert!(!err.into_tag_store_error().to_string().contains('\n'));
        }
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "é".repeat(500);
        let err = AwsError::status(502, &body);
        let AwsError::Status { body, .. } = err else {
            panic!("expected a status error");
        };
        assert_eq!(body.chars().count(), MAX_EXCERPT_CHARS + 3);
        assert!(body.ends_with("..."));
    }

    #[test]
    fn metadata_mapping() {
        let status = |status| AwsError::Status { status, body: String::new() };
        assert!(status(503).into_metadata_error().is_transient());
        assert!(status(401).into_metadata_error().is_transient());
        assert!(matches!(
            status(404).into_metadata_error(),
            CoreError::MetadataUnavailable(_)
        ));
    }
}
