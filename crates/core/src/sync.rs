//! Subscription synchronization.
//!
//! Keeps the replica's named subscription equal to the interest set of the
//! search cache. A background task re-aggregates the whole store after every
//! cache revision and replaces the filter unconditionally; the replica is
//! trusted to diff.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::Error;
use crate::cache::CacheDb;
use crate::interest::{self, InterestSet};
use crate::offline::OfflineMode;
use crate::replica::ReplicaStore;

/// Replaces a named subscription's filter with an interest set.
#[derive(Clone)]
pub struct SubscriptionSynchronizer {
    replica: Arc<dyn ReplicaStore>,
    mode: OfflineMode,
    name: String,
}

impl SubscriptionSynchronizer {
    pub fn new(replica: Arc<dyn ReplicaStore>, mode: OfflineMode, name: impl Into<String>) -> Self {
        Self { replica, mode, name: name.into() }
    }

    /// Replace the subscription filter with `interest`.
    ///
    /// On failure the previous filter stays in effect and
    /// [`Error::SyncUnavailable`] is returned.
    pub async fn reconcile(&self, interest: &InterestSet) -> Result<(), Error> {
        if self.mode.is_offline() {
            tracing::debug!(ids = interest.len(), "offline: subscription change applies when sync resumes");
        }

        match self.replica.replace_subscription(&self.name, interest).await {
            Ok(()) => {
                tracing::debug!(subscription = %self.name, ids = interest.len(), "subscription reconciled");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(subscription = %self.name, "subscription reconciliation failed: {e}");
                Err(Error::SyncUnavailable(e.to_string()))
            }
        }
    }

    /// Re-aggregate `db` and reconcile.
    pub async fn reconcile_store(&self, db: &CacheDb) -> Result<(), Error> {
        let interest = interest::from_store(db).await?;
        self.reconcile(&interest).await
    }

    /// Run the reactive chain in the background: reconcile once now, then
    /// after every change to `db`.
    pub fn spawn(self, db: CacheDb) -> SyncHandle {
        let mut changes = db.subscribe();
        let (settled_tx, settled) = watch::channel(None);

        let task = tokio::spawn(async move {
            loop {
                let revision = *changes.borrow_and_update();
                if let Err(e) = self.reconcile_store(&db).await {
                    tracing::warn!(revision, "interest set sync failed: {e}");
                }
                settled_tx.send_replace(Some(revision));

                if changes.changed().await.is_err() {
                    break;
                }
            }
        });

        SyncHandle { settled, task }
    }
}

/// Handle to a running synchronizer task.
#[derive(Debug)]
pub struct SyncHandle {
    settled: watch::Receiver<Option<u64>>,
    task: JoinHandle<()>,
}

impl SyncHandle {
    /// Wait until the synchronizer has processed cache revision `revision` or later.
    pub async fn settled(&self, revision: u64) {
        let mut settled = self.settled.clone();
        let _ = settled
            .wait_for(|done| done.is_some_and(|done| done >= revision))
            .await;
    }

    pub fn shutdown(&self) {
        self.task.abort();
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
