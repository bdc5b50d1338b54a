use ahs_model::ModelError;
use thiserror::Error;

/// Every failure of a run, classified by [`CoreError::is_transient`].
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("you have to run this binary as root")]
    NotRoot,

    #[error(
        "unable to access the metadata service, are you running this binary from an EC2 instance? ({0})"
    )]
    MetadataUnavailable(String),

    #[error("metadata service error: {0}")]
    Metadata(String),

    #[error("cannot compute region from invalid availability-zone '{0}'")]
    InvalidAvailabilityZone(String),

    #[error("invalid region '{0}'")]
    InvalidRegion(String),

    #[error("instance '{resource}' doesn't contain tag '{key}'")]
    TagNotFound { resource: String, key: String },

    #[error("tag store error: {0}")]
    TagStore(String),

    #[error("tag store rejected the request: {0}")]
    TagStoreRejected(String),

    #[error("instance '{resource}' has no value for group tag '{tag}'")]
    GroupTagMissing { resource: String, tag: String },

    #[error("unexpected amount of values for group tag '{tag}': {count}, expected 1")]
    GroupTagAmbiguous { tag: String, count: usize },

    #[error("invalid sequential id '{value}' found on '{resource}'")]
    InvalidSequentialTagValue { resource: String, value: String },

    #[error(
        "invalid suffix length {length}: instance id '{instance_id}' only has {available} usable characters"
    )]
    InvalidSuffixLength {
        length: usize,
        instance_id: String,
        available: usize,
    },

    #[error("invalid hostname '{0}'")]
    InvalidHostname(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(String),
}

impl CoreError {
    /// Errors worth retrying under the backoff policy.
    ///
    /// Remote failures and tags not yet visible in the eventually consistent store are
    /// transient. Data errors and environment errors are not.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::Metadata(_) | CoreError::TagStore(_) | CoreError::TagNotFound { .. }
        )
    }
}

impl From<std::io::Error> for CoreError {
    fn from(e: std::io::Error) -> Self {
        CoreError::Io(e.to_string())
    }
}

impl From<ModelError> for CoreError {
    fn from(e: ModelError) -> Self {
        CoreError::Config(e.to_string())
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
