//! Coordinated eviction of every cache tier.
//!
//! There is no transaction spanning the image cache, the replica and the
//! search cache, so eviction is an ordered best-effort sequence. Every step
//! runs even if an earlier one failed; failures are reported together.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::cache::CacheDb;
use crate::images::ImageCache;
use crate::replica::ReplicaStore;

/// One step of [`CacheEvictionManager::clear_all`], in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EvictionStep {
    ClearImageMemory,
    ClearImageDisk,
    RemoveSubscriptions,
    DeleteReplica,
    ClearSearchCache,
}

impl fmt::Display for EvictionStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvictionStep::ClearImageMemory => "clear_image_memory",
            EvictionStep::ClearImageDisk => "clear_image_disk",
            EvictionStep::RemoveSubscriptions => "remove_subscriptions",
            EvictionStep::DeleteReplica => "delete_replica",
            EvictionStep::ClearSearchCache => "clear_search_cache",
        };
        f.write_str(name)
    }
}

/// Outcome of a fully successful eviction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct EvictionReport {
    pub cache_entries_removed: u64,
}

/// Resets the image cache, the replica and the search cache.
pub struct CacheEvictionManager {
    images: Arc<dyn ImageCache>,
    replica: Arc<dyn ReplicaStore>,
    cache: CacheDb,
}

impl CacheEvictionManager {
    pub fn new(images: Arc<dyn ImageCache>, replica: Arc<dyn ReplicaStore>, cache: CacheDb) -> Self {
        Self { images, replica, cache }
    }

    /// Clear everything.
    ///
    /// Clearing the search cache also fires the reactive chain, which
    /// reconciles the subscription to the empty set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EvictionPartialFailure`] naming every failed step.
    /// Nothing is rolled back.
    pub async fn clear_all(&self) -> Result<EvictionReport, Error> {
        let mut failures: Vec<(EvictionStep, Error)> = Vec::new();

        if let Err(e) = self.images.clear_memory().await {
            failures.push((EvictionStep::ClearImageMemory, e));
        }
        if let Err(e) = self.images.clear_disk().await {
            failures.push((EvictionStep::ClearImageDisk, e));
        }
        if let Err(e) = self.replica.remove_all_subscriptions().await {
            failures.push((EvictionStep::RemoveSubscriptions, e));
        }
        if let Err(e) = self.replica.delete_all().await {
            failures.push((EvictionStep::DeleteReplica, e));
        }
        let removed = match self.cache.clear().await {
            Ok(count) => count,
            Err(e) => {
                failures.push((EvictionStep::ClearSearchCache, e));
                0
            }
        };

        if failures.is_empty() {
            tracing::info!(cache_entries_removed = removed, "all caches cleared");
            return Ok(EvictionReport { cache_entries_removed: removed });
        }

        for (step, e) in &failures {
            tracing::warn!(%step, "eviction step failed: {e}");
        }
        let message = failures
            .iter()
            .map(|(step, e)| format!("{step}: {e}"))
            .collect::<Vec<_>>()
            .join("; ");
        Err(Error::EvictionPartialFailure { failed: failures.into_iter().map(|(step, _)| step).collect(), message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::normalize;
    use crate::offline::OfflineMode;
    use crate::replica::ReplicaDb;
    use crate::sync::SubscriptionSynchronizer;
    use crate::testing::{MockImageCache, MockRecordSource, MockReplica, ReplicaOp, fixtures};

    #[tokio::test]
    async fn test_clear_all_resets_every_store() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = Arc::new(MockRecordSource::with_records(fixtures::listings(&["1", "2", "3", "4"])));
        let replica = Arc::new(ReplicaDb::open_in_memory(source).await.unwrap());
        let images = Arc::new(MockImageCache::with_sizes(2048, 8192));
        let sync =
            SubscriptionSynchronizer::new(replica.clone(), OfflineMode::default(), "listing").spawn(cache.clone());

        cache.insert(&normalize("loft"), &fixtures::ids(&["1", "2", "3"])).await.unwrap();
        cache.insert(&normalize("cabin"), &fixtures::ids(&["3", "4"])).await.unwrap();
        sync.settled(cache.revision()).await;
        replica.flush().await;
        assert_eq!(replica.record_count().await.unwrap(), 4);

        let manager = CacheEvictionManager::new(images.clone(), replica.clone(), cache.clone());
        let report = manager.clear_all().await.unwrap();
        sync.settled(cache.revision()).await;
        replica.flush().await;

        assert_eq!(report.cache_entries_removed, 2);
        assert_eq!(cache.entry_count().await.unwrap(), 0);
        assert_eq!(replica.record_count().await.unwrap(), 0);
        let filter = replica.subscription_filter("listing").await.unwrap();
        assert!(filter.unwrap_or_default().is_empty());
        assert_eq!(images.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_partial_failure_still_runs_every_step() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        cache.insert(&normalize("loft"), &fixtures::ids(&["1"])).await.unwrap();
        let replica = Arc::new(MockReplica::new());
        replica.fail_on(ReplicaOp::DeleteAll).await;
        let images = Arc::new(MockImageCache::with_sizes(10, 10));

        let manager = CacheEvictionManager::new(images.clone(), replica.clone(), cache.clone());
        let err = manager.clear_all().await.unwrap_err();

        match err {
            Error::EvictionPartialFailure { failed, message } => {
                assert_eq!(failed, vec![EvictionStep::DeleteReplica]);
                assert!(message.starts_with("delete_replica:"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(replica.recorded_ops().await, vec![ReplicaOp::RemoveAllSubscriptions, ReplicaOp::DeleteAll]);
        assert_eq!(cache.entry_count().await.unwrap(), 0);
        assert_eq!(images.size().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_multiple_failures_reported_in_order() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let replica = Arc::new(MockReplica::new());
        replica.fail_on(ReplicaOp::RemoveAllSubscriptions).await;
        let images = Arc::new(MockImageCache::with_sizes(0, 512));
        images.set_disk_failure(true);

        let manager = CacheEvictionManager::new(images.clone(), replica, cache);
        let err = manager.clear_all().await.unwrap_err();

        assert!(matches!(
            err,
            Error::EvictionPartialFailure { ref failed, .. }
                if failed == &[EvictionStep::ClearImageDisk, EvictionStep::RemoveSubscriptions]
        ));
        assert_eq!(images.size().await.unwrap(), 512);
    }
}
