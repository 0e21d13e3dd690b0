//! SQLite-backed replica store.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tokio_rusqlite::{Connection, params};

use super::{ReplicaStore, SyncSession};
use crate::Error;
use crate::cache::connection::open_connection;
use crate::cache::migrations::REPLICA_MIGRATIONS;
use crate::interest::InterestSet;
use crate::record::{Record, RecordId};
use crate::remote::RecordSource;

/// Replica database handle with its live sync session.
#[derive(Debug)]
pub struct ReplicaDb {
    conn: Connection,
    session: SyncSession,
}

impl ReplicaDb {
    /// Open a replica at the specified path and start its sync session.
    pub async fn open(path: impl AsRef<Path>, source: Arc<dyn RecordSource>) -> Result<Self, Error> {
        let conn = open_connection(Some(path.as_ref()), REPLICA_MIGRATIONS).await?;
        Ok(Self::start(conn, source))
    }

    /// Open an in-memory replica for testing.
    pub async fn open_in_memory(source: Arc<dyn RecordSource>) -> Result<Self, Error> {
        let conn = open_connection(None, REPLICA_MIGRATIONS).await?;
        Ok(Self::start(conn, source))
    }

    fn start(conn: Connection, source: Arc<dyn RecordSource>) -> Self {
        let session = SyncSession::spawn(conn.clone(), source);
        // Catch up on subscriptions persisted by a previous run.
        session.request();
        Self { conn, session }
    }

    /// Wait until the sync session has processed every pending change.
    pub async fn flush(&self) {
        self.session.flush().await;
    }

    /// Number of replicated records.
    pub async fn record_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM records", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl ReplicaStore for ReplicaDb {
    async fn replace_subscription(&self, name: &str, ids: &InterestSet) -> Result<(), Error> {
        let name = name.to_string();
        let filter_json = serde_json::to_string(&ids.ids)?;
        let updated_at = Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO subscriptions (name, filter_ids_json, updated_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(name) DO UPDATE SET
                        filter_ids_json = excluded.filter_ids_json,
                        updated_at = excluded.updated_at",
                    params![name, filter_json, updated_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;

        self.session.request();
        Ok(())
    }

    async fn subscription_filter(&self, name: &str) -> Result<Option<BTreeSet<RecordId>>, Error> {
        let name = name.to_string();
        let filter_json = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT filter_ids_json FROM subscriptions WHERE name = ?1",
                    params![name],
                    |row| row.get(0),
                );

                match result {
                    Ok(json) => Ok(Some(json)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        filter_json
            .map(|json| serde_json::from_str(&json).map_err(Error::from))
            .transpose()
    }

    async fn remove_all_subscriptions(&self) -> Result<(), Error> {
        let removed = self
            .conn
            .call(|conn| -> Result<usize, Error> { Ok(conn.execute("DELETE FROM subscriptions", [])?) })
            .await
            .map_err(Error::from)?;

        tracing::debug!(removed, "removed all replica subscriptions");
        self.session.request();
        Ok(())
    }

    async fn write_records(&self, records: Vec<Record>) -> Result<(), Error> {
        upsert_records(&self.conn, records).await
    }

    async fn delete_all(&self) -> Result<(), Error> {
        let deleted = self
            .conn
            .call(|conn| -> Result<usize, Error> { Ok(conn.execute("DELETE FROM records", [])?) })
            .await
            .map_err(Error::from)?;

        tracing::debug!(deleted, "deleted all replicated records");
        Ok(())
    }

    async fn records_by_ids(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error> {
        let ids: Vec<String> = ids.iter().map(|id| id.as_str().to_string()).collect();
        let payloads = self
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT payload_json FROM records WHERE id = ?1")?;
                let mut payloads = Vec::with_capacity(ids.len());
                for id in &ids {
                    match stmt.query_row(params![id], |row| row.get(0)) {
                        Ok(json) => payloads.push(json),
                        Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => {}
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(payloads)
            })
            .await
            .map_err(Error::from)?;

        payloads
            .iter()
            .map(|json| serde_json::from_str(json).map_err(Error::from))
            .collect()
    }

    fn pause_sync(&self) {
        self.session.pause();
    }

    fn resume_sync(&self) {
        self.session.resume();
    }

    fn is_sync_paused(&self) -> bool {
        self.session.is_paused()
    }
}

/// Union of every subscription filter.
pub(super) async fn subscribed_ids(conn: &Connection) -> Result<BTreeSet<RecordId>, Error> {
    let filters = conn
        .call(|conn| -> Result<Vec<String>, Error> {
            let mut stmt = conn.prepare("SELECT filter_ids_json FROM subscriptions")?;
            let rows = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(Error::from)?;

    let mut ids = BTreeSet::new();
    for json in filters {
        let filter: Vec<RecordId> = serde_json::from_str(&json)?;
        ids.extend(filter);
    }
    Ok(ids)
}

pub(super) async fn record_ids(conn: &Connection) -> Result<BTreeSet<RecordId>, Error> {
    let ids = conn
        .call(|conn| -> Result<Vec<String>, Error> {
            let mut stmt = conn.prepare("SELECT id FROM records")?;
            let rows = stmt.query_map([], |row| row.get(0))?.collect::<Result<Vec<String>, _>>()?;
            Ok(rows)
        })
        .await
        .map_err(Error::from)?;

    Ok(ids.into_iter().map(RecordId::new).collect())
}

pub(super) async fn delete_records(conn: &Connection, ids: Vec<RecordId>) -> Result<(), Error> {
    conn.call(move |conn| -> Result<(), Error> {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("DELETE FROM records WHERE id = ?1")?;
            for id in &ids {
                stmt.execute(params![id.as_str()])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}

pub(super) async fn upsert_records(conn: &Connection, records: Vec<Record>) -> Result<(), Error> {
    if records.is_empty() {
        return Ok(());
    }

    let rows = records
        .iter()
        .map(|record| Ok((record.id.as_str().to_string(), serde_json::to_string(record)?)))
        .collect::<Result<Vec<(String, String)>, Error>>()?;
    let synced_at = Utc::now().to_rfc3339();

    conn.call(move |conn| -> Result<(), Error> {
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO records (id, payload_json, synced_at) VALUES (?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    payload_json = excluded.payload_json,
                    synced_at = excluded.synced_at",
            )?;
            for (id, payload) in &rows {
                stmt.execute(params![id, payload, synced_at])?;
            }
        }
        tx.commit()?;
        Ok(())
    })
    .await
    .map_err(Error::from)
}
