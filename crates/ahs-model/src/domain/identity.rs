use std::fmt;

use serde::{Deserialize, Serialize};

use super::InstanceId;

/// Identity facts of the running instance, resolved from the metadata service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceIdentity {
    pub instance_id: InstanceId,
    /// Availability zone, e.g. `eu-west-1a`.
    pub availability_zone: String,
    /// Region derived from the availability zone, e.g. `eu-west-1`.
    pub region: String,
}

impl fmt::Display for InstanceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.instance_id, self.availability_zone)
    }
}
