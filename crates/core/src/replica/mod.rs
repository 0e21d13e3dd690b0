//! Partially replicated copy of the remote catalog.
//!
//! The replica holds only records matching its named subscriptions. It is
//! driven through the [`ReplicaStore`] trait; [`ReplicaDb`] is the SQLite
//! implementation whose background [`SyncSession`] materializes subscribed
//! records from a [`RecordSource`](crate::remote::RecordSource).

mod session;
mod sqlite;

pub use session::SyncSession;
pub use sqlite::ReplicaDb;

use std::collections::BTreeSet;

use crate::Error;
use crate::interest::InterestSet;
use crate::record::{Record, RecordId};

/// Operations the engine needs from the replica store.
#[async_trait::async_trait]
pub trait ReplicaStore: Send + Sync {
    /// Replace the filter of subscription `name` with "id in `ids`", creating it if needed.
    async fn replace_subscription(&self, name: &str, ids: &InterestSet) -> Result<(), Error>;

    /// Current filter of subscription `name`, or None if it does not exist.
    async fn subscription_filter(&self, name: &str) -> Result<Option<BTreeSet<RecordId>>, Error>;

    async fn remove_all_subscriptions(&self) -> Result<(), Error>;

    /// Write records in a single transaction.
    async fn write_records(&self, records: Vec<Record>) -> Result<(), Error>;

    /// Delete every replicated record.
    async fn delete_all(&self) -> Result<(), Error>;

    /// Project the replicated records for `ids`, in the given order.
    ///
    /// Identifiers that have not been replicated yet are skipped.
    async fn records_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error>;

    fn pause_sync(&self);

    fn resume_sync(&self);

    fn is_sync_paused(&self) -> bool;
}
