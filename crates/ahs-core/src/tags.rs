//! Access to the remote tag store holding every piece of allocation state.
use std::collections::BTreeMap;

use ahs_model::{InstanceId, Tags};
use async_trait::async_trait;

use crate::error::{CoreError, CoreResult};

/// Key/value tags attached to cloud resources.
///
/// Implementations map remote failures to [`CoreError::TagStore`] (transient) or
/// [`CoreError::TagStoreRejected`] (permanent, e.g. missing permissions). Callers wrap
/// each call in [`crate::backoff::retry`].
#[async_trait]
pub trait TagStore: Send + Sync {
    /// All values stored under `key` on `resource`.
    ///
    /// Most stores hold at most one value per key; an empty vector means the tag is absent.
    async fn tag_values(&self, resource: &str, key: &str) -> CoreResult<Vec<String>>;

    /// Creates or overwrites `key` on `resource`.
    async fn write_tag(&self, resource: &str, key: &str, value: &str) -> CoreResult<()>;

    /// Every resource whose `key` tag equals `value`, with all of its tags.
    ///
    /// An empty map is a valid answer.
    async fn list_resources_by_tag(
        &self,
        key: &str,
        value: &str,
    ) -> CoreResult<BTreeMap<InstanceId, Tags>>;

    /// Value of `key` on `resource`, failing with [`CoreError::TagNotFound`] when absent.
    async fn read_tag(&self, resource: &str, key: &str) -> CoreResult<String> {
        self.tag_values(resource, key)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| CoreError::TagNotFound {
                resource: resource.to_string(),
                key: key.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryTagStore;

    #[tokio::test]
    async fn read_tag_returns_value() {
        let store = MemoryTagStore::new().with_instance("i-1", &[("Name", "web")]);
        assert_eq!(store.read_tag("i-1", "Name").await.unwrap(), "web");
    }

    #[tokio::test]
    async fn read_tag_reports_missing_tag() {
        let store = MemoryTagStore::new().with_instance("i-1", &[]);
        let err = store.read_tag("i-1", "Name").await.unwrap_err();
        assert!(matches!(err, CoreError::TagNotFound { ref key, .. } if key == "Name"));
    }

    #[tokio::test]
    async fn write_then_list() {
        let store = MemoryTagStore::new()
            .with_instance("i-1", &[("group", "web")])
            .with_instance("i-2", &[("group", "db")]);

        store.write_tag("i-2", "group", "web").await.unwrap();

        let peers = store.list_resources_by_tag("group", "web").await.unwrap();
        assert_eq!(peers.keys().collect::<Vec<_>>(), vec!["i-1", "i-2"]);
        assert!(store.list_resources_by_tag("group", "cache").await.unwrap().is_empty());
    }
}
