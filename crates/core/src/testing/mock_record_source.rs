//! Mock record source backing the replica's sync session.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::Error;
use crate::record::{Record, RecordId};
use crate::remote::RecordSource;

/// In-memory catalog implementing [`RecordSource`].
#[derive(Debug, Default)]
pub struct MockRecordSource {
    catalog: RwLock<HashMap<RecordId, Record>>,
    next_error: RwLock<Option<String>>,
    fetched: RwLock<Vec<Vec<RecordId>>>,
}

impl MockRecordSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: impl IntoIterator<Item = Record>) -> Self {
        let catalog = records.into_iter().map(|r| (r.id.clone(), r)).collect();
        Self { catalog: RwLock::new(catalog), ..Default::default() }
    }

    pub async fn add_records(&self, records: impl IntoIterator<Item = Record>) {
        let mut catalog = self.catalog.write().await;
        for record in records {
            catalog.insert(record.id.clone(), record);
        }
    }

    /// Configure the next fetch to fail with the given message.
    pub async fn fail_next(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }

    /// Every batch of ids that was requested.
    pub async fn fetched_batches(&self) -> Vec<Vec<RecordId>> {
        self.fetched.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RecordSource for MockRecordSource {
    async fn fetch_records(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error> {
        self.fetched.write().await.push(ids.to_vec());

        if let Some(message) = self.next_error.write().await.take() {
            return Err(Error::SyncUnavailable(message));
        }

        let catalog = self.catalog.read().await;
        Ok(ids.iter().filter_map(|id| catalog.get(id).cloned()).collect())
    }
}
