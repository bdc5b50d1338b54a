//! Hostname strategies: instance-id suffixing and sequential group allocation.
mod instance_id;
pub use instance_id::hostname_with_instance_id;

mod sequential;
pub use sequential::SequentialNaming;
