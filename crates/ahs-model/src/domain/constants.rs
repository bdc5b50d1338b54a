//! Well-known defaults shared by the command line and the naming strategies.

/// Tag whose value is used as the hostname base.
pub const DEFAULT_INPUT_TAG: &str = "Name";

/// Tag that receives the computed hostname.
pub const DEFAULT_OUTPUT_TAG: &str = "Name";

/// Separator placed between the base and the generated suffix.
pub const DEFAULT_SEPARATOR: &str = "-";

/// Tag identifying the group an instance belongs to in sequential mode.
pub const DEFAULT_GROUP_TAG: &str = "ahs:instance-group";

/// Tag holding the sequential id allocated to an instance.
pub const DEFAULT_SEQUENTIAL_ID_TAG: &str = "ahs:instance-id";

/// Number of instance-id characters kept in the hostname.
pub const DEFAULT_SUFFIX_LENGTH: usize = 5;
