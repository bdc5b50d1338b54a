use std::sync::LazyLock;

use ahs_model::SequentialId;
use regex::Regex;
use tracing::info;

use crate::{
    allocator::{AllocationRequest, Allocator},
    error::{CoreError, CoreResult},
};

static ALLOCATED_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-([0-9]+)$").expect("sequential suffix pattern is valid"));

/// Parameters of the sequential naming strategy.
#[derive(Debug, Clone, Copy)]
pub struct SequentialNaming<'a> {
    pub separator: &'a str,
    pub group_tag: &'a str,
    pub sequential_id_tag: &'a str,
}

impl SequentialNaming<'_> {
    /// Returns `base + separator + id` with an id picked by `allocator`.
    ///
    /// A base already ending in `-<digits>` was allocated by a previous run: it is kept
    /// as is and its digits are returned as the id, without querying the group.
    pub async fn hostname(
        &self,
        base: &str,
        instance_id: &str,
        allocator: &dyn Allocator,
    ) -> CoreResult<(String, SequentialId)> {
        info!("computing a hostname with sequential naming");

        if let Some(id) = already_allocated(base, instance_id)? {
            info!(
                hostname = base,
                sequential_id = id,
                "input tag already ends with a sequential id, keeping it"
            );
            return Ok((base.to_string(), id));
        }

        let id = allocator
            .allocate(AllocationRequest {
                instance_id,
                group_tag: self.group_tag,
                sequential_id_tag: self.sequential_id_tag,
            })
            .await?;

        let hostname = format!("{base}{}{id}", self.separator);
        info!(hostname = %hostname, sequential_id = id, "computed unique hostname");
        Ok((hostname, id))
    }
}

fn already_allocated(base: &str, instance_id: &str) -> CoreResult<Option<SequentialId>> {
    let Some(digits) = ALLOCATED_SUFFIX
        .captures(base)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
    else {
        return Ok(None);
    };

    digits
        .parse::<SequentialId>()
        .map(Some)
        .map_err(|_| CoreError::InvalidSequentialTagValue {
            resource: instance_id.to_string(),
            value: digits.to_string(),
        })
}
