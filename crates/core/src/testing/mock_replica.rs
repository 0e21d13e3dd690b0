//! In-memory replica store.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::RwLock;

use crate::Error;
use crate::interest::InterestSet;
use crate::record::{Record, RecordId};
use crate::replica::ReplicaStore;

/// Replica operation, recorded in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReplicaOp {
    ReplaceSubscription,
    RemoveAllSubscriptions,
    WriteRecords,
    DeleteAll,
}

/// Mock implementation of [`ReplicaStore`].
///
/// Records are only present if written explicitly; there is no sync session.
#[derive(Debug, Default)]
pub struct MockReplica {
    records: RwLock<BTreeMap<RecordId, Record>>,
    subscriptions: RwLock<BTreeMap<String, BTreeSet<RecordId>>>,
    ops: RwLock<Vec<ReplicaOp>>,
    failing: RwLock<HashSet<ReplicaOp>>,
    paused: AtomicBool,
}

impl MockReplica {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every future `op` fail.
    pub async fn fail_on(&self, op: ReplicaOp) {
        self.failing.write().await.insert(op);
    }

    pub async fn recorded_ops(&self) -> Vec<ReplicaOp> {
        self.ops.read().await.clone()
    }

    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    async fn enter(&self, op: ReplicaOp) -> Result<(), Error> {
        self.ops.write().await.push(op);
        if self.failing.read().await.contains(&op) {
            return Err(Error::SyncUnavailable(format!("{op:?} rejected by replica")));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ReplicaStore for MockReplica {
    async fn replace_subscription(&self, name: &str, ids: &InterestSet) -> Result<(), Error> {
        self.enter(ReplicaOp::ReplaceSubscription).await?;
        self.subscriptions
            .write()
            .await
            .insert(name.to_string(), ids.ids.clone());
        Ok(())
    }

    async fn subscription_filter(&self, name: &str) -> Result<Option<BTreeSet<RecordId>>, Error> {
        Ok(self.subscriptions.read().await.get(name).cloned())
    }

    async fn remove_all_subscriptions(&self) -> Result<(), Error> {
        self.enter(ReplicaOp::RemoveAllSubscriptions).await?;
        self.subscriptions.write().await.clear();
        Ok(())
    }

    async fn write_records(&self, records: Vec<Record>) -> Result<(), Error> {
        self.enter(ReplicaOp::WriteRecords).await?;
        let mut stored = self.records.write().await;
        for record in records {
            stored.insert(record.id.clone(), record);
        }
        Ok(())
    }

    async fn delete_all(&self) -> Result<(), Error> {
        self.enter(ReplicaOp::DeleteAll).await?;
        self.records.write().await.clear();
        Ok(())
    }

    async fn records_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error> {
        let stored = self.records.read().await;
        Ok(ids.iter().filter_map(|id| stored.get(id).cloned()).collect())
    }

    fn pause_sync(&self) {
        self.paused.store(true, Ordering::SeqCst);
    }

    fn resume_sync(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    fn is_sync_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }
}
