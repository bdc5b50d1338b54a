use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};

/// How the hostname suffix is derived from the base tag value.
///
/// Strategies:
/// - `InstanceId`: append the first `length` characters of the instance id (after its `i-` prefix).
/// - `Sequential`: append the lowest integer not yet claimed within the instance group.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum NamingStrategy {
    InstanceId {
        length: usize,
    },
    Sequential {
        /// Tag whose value identifies the instance group.
        group_tag: String,
        /// Tag storing the allocated sequential id on each instance.
        sequential_id_tag: String,
        /// Accepted for compatibility; allocation does not partition by AZ.
        #[serde(default)]
        respect_azs: bool,
    },
}

impl NamingStrategy {
    /// Command name of the strategy, as exposed on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            NamingStrategy::InstanceId { .. } => "instance-id",
            NamingStrategy::Sequential { .. } => "sequential",
        }
    }

    pub fn validate(&self) -> ModelResult<()> {
        match self {
            NamingStrategy::InstanceId { length } => {
                if *length == 0 {
                    return Err(ModelError::Invalid("suffix length must be positive".into()));
                }
            }
            NamingStrategy::Sequential {
                group_tag,
                sequential_id_tag,
                ..
            } => {
                if group_tag.is_empty() {
                    return Err(ModelError::Empty("instance group tag"));
                }
                if sequential_id_tag.is_empty() {
                    return Err(ModelError::Empty("instance sequential id tag"));
                }
                if group_tag == sequential_id_tag {
                    return Err(ModelError::Invalid(format!(
                        "group tag and sequential id tag must differ (both '{group_tag}')"
                    )));
                }
            }
        }
        Ok(())
    }
}
