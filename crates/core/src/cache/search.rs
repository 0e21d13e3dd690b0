//! Search cache operations.
//!
//! Maps a normalized search term to the ordered identifiers the remote search
//! returned for it. Entries are written once and never overwritten.

use super::connection::CacheDb;
use super::key::NormalizedKey;
use crate::Error;
use crate::record::RecordId;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;

/// A cached search result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: NormalizedKey,
    pub result_ids: Vec<RecordId>,
    pub created_at: String,
}

type EntryRow = (String, String, String);

fn entry_from_row((term, ids_json, created_at): EntryRow) -> Result<CacheEntry, Error> {
    Ok(CacheEntry {
        key: NormalizedKey::from_stored(term),
        result_ids: serde_json::from_str(&ids_json)?,
        created_at,
    })
}

impl CacheDb {
    /// Get the cache entry for a normalized key.
    ///
    /// Returns None if the key doesn't exist in the cache.
    pub async fn lookup(&self, key: &NormalizedKey) -> Result<Option<CacheEntry>, Error> {
        let term = key.as_str().to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn
                    .prepare("SELECT search_term, result_ids_json, created_at FROM search_cache WHERE search_term = ?1")?;

                let result = stmt.query_row(params![term], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)));

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(tokio_rusqlite::rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(entry_from_row).transpose()
    }

    /// Create a new cache entry.
    ///
    /// Fails with [`Error::DuplicateKey`] if an entry for `key` already exists;
    /// the existing entry is left untouched.
    pub async fn insert(&self, key: &NormalizedKey, result_ids: &[RecordId]) -> Result<CacheEntry, Error> {
        let entry = CacheEntry { key: key.clone(), result_ids: result_ids.to_vec(), created_at: Utc::now().to_rfc3339() };
        let term = key.as_str().to_string();
        let ids_json = serde_json::to_string(&entry.result_ids)?;
        let created_at = entry.created_at.clone();

        let inserted = self
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count = conn.execute(
                    "INSERT INTO search_cache (search_term, result_ids_json, created_at)
                    VALUES (?1, ?2, ?3)
                    ON CONFLICT(search_term) DO NOTHING",
                    params![term, ids_json, created_at],
                )?;
                Ok(count)
            })
            .await
            .map_err(Error::from)?;

        if inserted == 0 {
            return Err(Error::DuplicateKey(key.to_string()));
        }

        let revision = self.notify_changed();
        tracing::debug!(key = %key, ids = entry.result_ids.len(), revision, "search cache entry created");
        Ok(entry)
    }

    /// Snapshot of every cache entry in insertion order.
    pub async fn all_entries(&self) -> Result<Vec<CacheEntry>, Error> {
        let rows = self
            .conn
            .call(|conn| -> Result<Vec<EntryRow>, Error> {
                let mut stmt =
                    conn.prepare("SELECT search_term, result_ids_json, created_at FROM search_cache ORDER BY rowid")?;
                let rows = stmt
                    .query_map([], |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(Error::from)?;

        rows.into_iter().map(entry_from_row).collect()
    }

    /// Number of cached searches.
    pub async fn entry_count(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM search_cache", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every cache entry.
    ///
    /// Returns the number of deleted entries.
    pub async fn clear(&self) -> Result<u64, Error> {
        let count = self
            .conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM search_cache", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)?;

        let revision = self.notify_changed();
        tracing::debug!(deleted = count, revision, "search cache cleared");
        Ok(count)
    }
}
