//! EC2 Query API tag store.
mod response;

mod store;
pub use store::Ec2TagStore;

mod connector;
pub use connector::Ec2Connector;
