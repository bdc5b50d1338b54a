mod domain;
pub use domain::{
    DEFAULT_GROUP_TAG, DEFAULT_INPUT_TAG, DEFAULT_OUTPUT_TAG, DEFAULT_SEPARATOR,
    DEFAULT_SEQUENTIAL_ID_TAG, DEFAULT_SUFFIX_LENGTH,
};
pub use domain::{InstanceId, InstanceIdentity, SequentialId, Tags};

mod error;
pub use error::{ModelError, ModelResult};

mod strategy;
pub use strategy::{BackoffStrategy, NamingStrategy};

mod config;
pub use config::{PersistOptions, RunConfig};
