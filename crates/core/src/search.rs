//! Search orchestration.
//!
//! Serves a search from the cache when the normalized term has been seen
//! before, otherwise calls the remote search procedure and caches the
//! returned identifiers. The cache stores identifiers only; hits are
//! projected from the replica so displayed records are never stale copies.

use std::sync::Arc;

use serde::Serialize;

use crate::Error;
use crate::cache::{CacheDb, normalize};
use crate::record::{Record, RecordId};
use crate::remote::{RemoteSearch, SearchQuery};
use crate::replica::ReplicaStore;

/// Where a search result came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    /// The query was empty; nothing was looked up.
    Empty,
    CacheHit,
    Remote,
}

/// Result of a single search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub items: Vec<Record>,
    pub source: ResultSource,
}

impl SearchOutcome {
    fn empty() -> Self {
        Self { items: Vec::new(), source: ResultSource::Empty }
    }

    pub fn is_cache_hit(&self) -> bool {
        self.source == ResultSource::CacheHit
    }
}

/// Per-query entry point and the only writer of the search cache.
pub struct SearchOrchestrator {
    cache: CacheDb,
    remote: Arc<dyn RemoteSearch>,
    replica: Arc<dyn ReplicaStore>,
    page_size: u32,
}

impl SearchOrchestrator {
    pub fn new(cache: CacheDb, remote: Arc<dyn RemoteSearch>, replica: Arc<dyn ReplicaStore>, page_size: u32) -> Self {
        Self { cache, remote, replica, page_size }
    }

    /// Search for `raw_term`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SearchFailed`] if the term is not cached and the
    /// remote search fails; nothing is cached in that case. Cache read
    /// failures are propagated as-is.
    pub async fn search(&self, raw_term: &str) -> Result<SearchOutcome, Error> {
        if raw_term.is_empty() {
            return Ok(SearchOutcome::empty());
        }

        let key = normalize(raw_term);
        if let Some(entry) = self.cache.lookup(&key).await? {
            tracing::debug!(key = %key, ids = entry.result_ids.len(), "search cache hit");
            let items = self.replica.records_by_ids(&entry.result_ids).await?;
            return Ok(SearchOutcome { items, source: ResultSource::CacheHit });
        }

        tracing::debug!(key = %key, "search cache miss, querying remote");
        let query = SearchQuery::first_page(raw_term, self.page_size);
        let items = self.remote.search(&query).await.map_err(|e| match e {
            Error::SearchFailed(msg) => Error::SearchFailed(msg),
            other => Error::SearchFailed(other.to_string()),
        })?;

        let ids: Vec<RecordId> = items.iter().map(|item| item.id.clone()).collect();
        match self.cache.insert(&key, &ids).await {
            Ok(_) => {}
            Err(Error::DuplicateKey(_)) => {
                tracing::debug!(key = %key, "concurrent search cached this term first, keeping its entry");
            }
            Err(e) => {
                tracing::warn!(key = %key, "failed to cache search result: {e}");
            }
        }

        Ok(SearchOutcome { items, source: ResultSource::Remote })
    }
}
