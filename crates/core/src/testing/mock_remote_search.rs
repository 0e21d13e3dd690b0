//! Mock remote search procedure.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Barrier, RwLock};

use crate::Error;
use crate::record::Record;
use crate::remote::{RemoteSearch, SearchQuery};

/// Mock implementation of the [`RemoteSearch`] trait.
///
/// Results are configured per lowercased phrase; unknown phrases return no
/// results. Calls are recorded for assertions.
#[derive(Debug, Default)]
pub struct MockRemoteSearch {
    results: RwLock<HashMap<String, Vec<Record>>>,
    queries: RwLock<Vec<SearchQuery>>,
    next_error: RwLock<Option<String>>,
    gate: RwLock<Option<Arc<Barrier>>>,
    calls: AtomicUsize,
}

impl MockRemoteSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the results returned for `phrase` (matched case-insensitively).
    pub async fn set_results(&self, phrase: &str, results: Vec<Record>) {
        self.results.write().await.insert(phrase.to_lowercase(), results);
    }

    /// Configure the next search to fail with the given message.
    pub async fn fail_next(&self, message: &str) {
        *self.next_error.write().await = Some(message.to_string());
    }

    /// Make every call wait on `barrier` before answering.
    ///
    /// Used to force concurrent searches to overlap.
    pub async fn set_gate(&self, barrier: Arc<Barrier>) {
        *self.gate.write().await = Some(barrier);
    }

    /// Number of searches performed.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub async fn recorded_queries(&self) -> Vec<SearchQuery> {
        self.queries.read().await.clone()
    }
}

#[async_trait::async_trait]
impl RemoteSearch for MockRemoteSearch {
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.write().await.push(query.clone());

        let gate = self.gate.read().await.clone();
        if let Some(barrier) = gate {
            barrier.wait().await;
        }

        if let Some(message) = self.next_error.write().await.take() {
            return Err(Error::SearchFailed(message));
        }

        Ok(self
            .results
            .read()
            .await
            .get(&query.search_phrase.to_lowercase())
            .cloned()
            .unwrap_or_default())
    }
}
