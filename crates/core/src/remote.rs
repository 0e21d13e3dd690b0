//! Remote catalog procedures.
//!
//! The engine talks to the remote catalog only through these traits, so the
//! transport can be swapped (HTTP client, test double) without touching it.

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::record::{Record, RecordId};

/// Page size the search procedure is asked for unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters of one remote full-text search call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub search_phrase: String,
    pub page_number: u32,
    pub page_size: u32,
}

impl SearchQuery {
    /// First page of results for `phrase`.
    pub fn first_page(phrase: impl Into<String>, page_size: u32) -> Self {
        Self { search_phrase: phrase.into(), page_number: 1, page_size }
    }
}

/// The remote full-text search procedure.
#[async_trait::async_trait]
pub trait RemoteSearch: Send + Sync {
    /// Run a search. Failures are reported as [`Error::SearchFailed`].
    async fn search(&self, query: &SearchQuery) -> Result<Vec<Record>, Error>;
}

/// Source the replica materializes subscribed records from.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch the records with the given identifiers. Unknown ids are skipped.
    async fn fetch_records(&self, ids: &[RecordId]) -> Result<Vec<Record>, Error>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_query_wire_format() {
        let query = SearchQuery::first_page("Loft", DEFAULT_PAGE_SIZE);
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value, serde_json::json!({ "searchPhrase": "Loft", "pageNumber": 1, "pageSize": 20 }));
    }
}
