pub mod allocator;
pub mod backoff;
pub mod error;
pub mod host;
pub mod identity;
pub mod naming;
pub mod privilege;
pub mod run;
pub mod tags;

#[cfg(test)]
mod testing;

pub mod prelude {
    pub use crate::allocator::{AllocationRequest, Allocator, GapFillingAllocator};
    pub use crate::backoff::{Backoff, retry};
    pub use crate::error::{CoreError, CoreResult};
    pub use crate::host::{HostnameSink, LocalHost, validate_hostname};
    pub use crate::identity::{IdentityResolver, MetadataSource, compute_region};
    pub use crate::privilege::ensure_root;
    pub use crate::run::{Collaborators, Outcome, TagStoreConnector, run};
    pub use crate::tags::TagStore;
}
