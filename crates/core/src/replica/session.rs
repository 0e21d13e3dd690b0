//! Live sync session for the replica.
//!
//! The session owns a background task that, whenever it is woken and not
//! paused, makes the local records match the union of all subscription
//! filters: records outside the filters are pruned and missing ones are
//! fetched from the record source. A failed pass is retried with capped
//! exponential backoff until it succeeds or the session is paused.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_rusqlite::Connection;

use super::sqlite;
use crate::Error;
use crate::record::RecordId;
use crate::remote::RecordSource;

/// First delay before retrying a failed materialization; doubles per failure.
const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

const RETRY_MAX_DELAY: Duration = Duration::from_secs(30);

/// Handle to the replica's live sync channel.
#[derive(Debug)]
pub struct SyncSession {
    paused: Arc<AtomicBool>,
    requests: watch::Sender<u64>,
    completed: Arc<watch::Sender<u64>>,
    task: JoinHandle<()>,
}

impl SyncSession {
    pub(crate) fn spawn(conn: Connection, source: Arc<dyn RecordSource>) -> Self {
        let paused = Arc::new(AtomicBool::new(false));
        let (requests, mut requests_rx) = watch::channel(0u64);
        let (completed, _) = watch::channel(0u64);
        let completed = Arc::new(completed);

        let task = tokio::spawn({
            let paused = Arc::clone(&paused);
            let completed = Arc::clone(&completed);
            async move {
                let mut retry: Option<Duration> = None;
                loop {
                    let woke = match retry {
                        Some(delay) => tokio::select! {
                            changed = requests_rx.changed() => changed.is_ok(),
                            () = tokio::time::sleep(delay) => true,
                        },
                        None => requests_rx.changed().await.is_ok(),
                    };
                    if !woke {
                        break;
                    }

                    let generation = *requests_rx.borrow_and_update();
                    if paused.load(Ordering::SeqCst) {
                        tracing::debug!(generation, "sync paused, deferring materialization");
                        retry = None;
                        continue;
                    }

                    match materialize(&conn, source.as_ref()).await {
                        Ok(()) => retry = None,
                        Err(e) => {
                            let delay = retry.map_or(RETRY_BASE_DELAY, |d| (d * 2).min(RETRY_MAX_DELAY));
                            tracing::warn!(generation, retry_in_ms = delay.as_millis() as u64, "replica sync failed: {e}");
                            retry = Some(delay);
                        }
                    }
                    completed.send_replace(generation);
                }
                tracing::debug!("replica sync session stopped");
            }
        });

        Self { paused, requests, completed, task }
    }

    /// Ask the session to bring the records in line with the subscriptions.
    pub fn request(&self) {
        self.requests.send_modify(|generation| *generation += 1);
    }

    pub fn pause(&self) {
        if !self.paused.swap(true, Ordering::SeqCst) {
            tracing::info!("replica sync paused");
        }
    }

    /// Resume the session and catch up on anything deferred while paused.
    pub fn resume(&self) {
        if self.paused.swap(false, Ordering::SeqCst) {
            tracing::info!("replica sync resumed");
        }
        self.request();
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Wait until every request made so far has been processed.
    ///
    /// Returns immediately while paused.
    pub async fn flush(&self) {
        if self.is_paused() {
            return;
        }
        let target = *self.requests.borrow();
        let mut completed = self.completed.subscribe();
        let _ = completed.wait_for(|done| *done >= target).await;
    }
}

impl Drop for SyncSession {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn materialize(conn: &Connection, source: &dyn RecordSource) -> Result<(), Error> {
    let wanted = sqlite::subscribed_ids(conn).await?;
    let present = sqlite::record_ids(conn).await?;

    let stale: Vec<RecordId> = present.difference(&wanted).cloned().collect();
    if !stale.is_empty() {
        sqlite::delete_records(conn, stale.clone()).await?;
        tracing::debug!(pruned = stale.len(), "pruned unsubscribed records");
    }

    let missing: Vec<RecordId> = wanted.difference(&present).cloned().collect();
    if missing.is_empty() {
        return Ok(());
    }

    let fetched = source
        .fetch_records(&missing)
        .await
        .map_err(|e| Error::SyncUnavailable(e.to_string()))?;

    // Subscriptions may have shrunk while the fetch was in flight.
    let still_wanted: BTreeSet<RecordId> = sqlite::subscribed_ids(conn).await?;
    let records: Vec<_> = fetched
        .into_iter()
        .filter(|record| still_wanted.contains(&record.id))
        .collect();

    tracing::debug!(requested = missing.len(), materialized = records.len(), "materialized subscribed records");
    sqlite::upsert_records(conn, records).await
}
