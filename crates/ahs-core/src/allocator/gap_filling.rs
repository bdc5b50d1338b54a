use std::collections::BTreeSet;

use ahs_model::{BackoffStrategy, SequentialId};
use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::{
    allocator::{AllocationRequest, Allocator},
    backoff::retry,
    error::{CoreError, CoreResult},
    tags::TagStore,
};

/// Best-effort allocator handing out the lowest id not claimed by any group member.
///
/// Ids of terminated instances are reused, which keeps names within a bounded range
/// for long-lived elastic groups.
pub struct GapFillingAllocator<'a> {
    store: &'a dyn TagStore,
    backoff: &'a BackoffStrategy,
}

impl<'a> GapFillingAllocator<'a> {
    pub fn new(store: &'a dyn TagStore, backoff: &'a BackoffStrategy) -> Self {
        Self { store, backoff }
    }

    /// Value of the group tag on the instance; exactly one must exist.
    async fn group_of(&self, instance_id: &str, group_tag: &str) -> CoreResult<String> {
        debug!(tag = group_tag, "looking up the instance group");
        let store = self.store;
        let mut values = retry(self.backoff, "read group tag", move || {
            store.tag_values(instance_id, group_tag)
        })
        .await?;

        match values.len() {
            0 => Err(CoreError::GroupTagMissing {
                resource: instance_id.to_string(),
                tag: group_tag.to_string(),
            }),
            1 => {
                let group = values.remove(0);
                debug!(group = %group, "found instance group");
                Ok(group)
            }
            count => Err(CoreError::GroupTagAmbiguous {
                tag: group_tag.to_string(),
                count,
            }),
        }
    }

    /// Sequential ids currently claimed by members of `group`.
    async fn claimed_ids(
        &self,
        group_tag: &str,
        group: &str,
        sequential_id_tag: &str,
    ) -> CoreResult<BTreeSet<SequentialId>> {
        debug!("looking up instances that belong to the same group");
        let store = self.store;
        let peers = retry(self.backoff, "list group members", move || {
            store.list_resources_by_tag(group_tag, group)
        })
        .await?;

        let mut claimed = BTreeSet::new();
        for (peer, tags) in &peers {
            let Some(raw) = tags.get(sequential_id_tag) else {
                continue;
            };
            let id = raw.parse::<SequentialId>().map_err(|_| {
                CoreError::InvalidSequentialTagValue {
                    resource: peer.clone(),
                    value: raw.to_string(),
                }
            })?;
            debug!(instance_id = %peer, sequential_id = id, "found group member");
            claimed.insert(id);
        }
        Ok(claimed)
    }
}

#[async_trait]
impl Allocator for GapFillingAllocator<'_> {
    #[instrument(level = "debug", skip(self), fields(instance_id = request.instance_id))]
    async fn allocate(&self, request: AllocationRequest<'_>) -> CoreResult<SequentialId> {
        let group = self
            .group_of(request.instance_id, request.group_tag)
            .await?;
        let claimed = self
            .claimed_ids(request.group_tag, &group, request.sequential_id_tag)
            .await?;

        Ok(lowest_free_id(&claimed))
    }
}

/// Lowest positive id absent from `claimed`.
///
/// Scans the ids in ascending order: the first position `i` holding something other
/// than `i + 1` is the gap. Without a gap the answer is `count + 1`. Zero is not a
/// valid id and is ignored.
pub fn lowest_free_id(claimed: &BTreeSet<SequentialId>) -> SequentialId {
    let mut expected: SequentialId = 1;
    for &id in claimed.range(1..) {
        if id != expected {
            return expected;
        }
        expected = expected.saturating_add(1);
    }
    expected
}
