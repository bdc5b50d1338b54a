//! Sequential id allocation within an instance group.
//!
//! Allocation is read-then-decide: peers launched at the same time may observe the
//! same gap and claim the same id. [`GapFillingAllocator`] accepts that race. A
//! stronger allocator (distributed lock, conditional writes) can implement
//! [`Allocator`] without changing callers.
mod gap_filling;
pub use gap_filling::{GapFillingAllocator, lowest_free_id};

use ahs_model::SequentialId;
use async_trait::async_trait;

use crate::error::CoreResult;

/// Everything an allocator needs to pick an id for one instance.
#[derive(Debug, Clone, Copy)]
pub struct AllocationRequest<'a> {
    pub instance_id: &'a str,
    /// Tag whose value identifies the group of `instance_id`.
    pub group_tag: &'a str,
    /// Tag holding the id claimed by each group member.
    pub sequential_id_tag: &'a str,
}

#[async_trait]
pub trait Allocator: Send + Sync {
    /// Picks the sequential id for `request.instance_id`.
    ///
    /// Does not write anything: the caller stores the id once the hostname is applied.
    async fn allocate(&self, request: AllocationRequest<'_>) -> CoreResult<SequentialId>;
}
