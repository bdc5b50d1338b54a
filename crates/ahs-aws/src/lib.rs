//! AWS implementations of the metadata source and tag store used by `ahs-core`.
mod error;
pub use error::{AwsError, AwsResult};

mod credentials;
pub use credentials::Credentials;

mod sigv4;

mod imds;
pub use imds::{DEFAULT_IMDS_ENDPOINT, ImdsClient};

mod ec2;
pub use ec2::{Ec2Connector, Ec2TagStore};

#[cfg(test)]
mod testing;
