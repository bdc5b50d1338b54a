mod tags;
pub use tags::Tags;

mod identity;
pub use identity::InstanceIdentity;

mod constants;
pub use constants::{
    DEFAULT_GROUP_TAG, DEFAULT_INPUT_TAG, DEFAULT_OUTPUT_TAG, DEFAULT_SEPARATOR,
    DEFAULT_SEQUENTIAL_ID_TAG, DEFAULT_SUFFIX_LENGTH,
};

/// Opaque cloud instance identifier (e.g. `i-0123456789abcdef0`).
pub type InstanceId = String;

/// Positive integer identifying an instance within its group.
///
/// Unique by cooperation only: peers allocate without any lock.
pub type SequentialId = u32;
