//! cache_stats tool implementation.
//!
//! Reports how much space each store uses.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use roost_core::{Error, StorageReport, interest};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for the cache_stats tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsParams {}

/// Output from the cache_stats tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct CacheStatsOutput {
    #[serde(flatten)]
    pub storage: StorageReport,
    pub local_db_mb: f64,
    pub replica_db_mb: f64,
    pub image_cache_mb: f64,
    /// Number of cached search terms.
    pub cache_entries: u64,
    /// Distinct record ids referenced by the cache.
    pub interest_set_size: usize,
    /// Records currently materialized in the replica.
    pub replica_records: u64,
    pub offline: bool,
}

/// Implementation of the cache_stats tool.
pub async fn stats_impl(state: &AppState, _params: CacheStatsParams) -> Result<CallToolResult, McpError> {
    let storage =
        StorageReport::collect(&state.config.db_path, &state.config.replica_path, state.images.as_ref()).await?;
    let interest = interest::from_store(&state.cache).await?;

    let output = CacheStatsOutput {
        local_db_mb: storage.local_db_mb(),
        replica_db_mb: storage.replica_db_mb(),
        image_cache_mb: storage.image_cache_mb(),
        storage,
        cache_entries: state.cache.entry_count().await?,
        interest_set_size: interest.len(),
        replica_records: state.replica.record_count().await?,
        offline: state.offline.is_offline(),
    };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::tools::search::{SearchParams, search_impl};
    use crate::tools::test_support::output_json;
    use roost_core::Record;

    #[tokio::test]
    async fn test_stats_empty() {
        let t = test_state().await;
        let result = stats_impl(&t.state, CacheStatsParams::default()).await.unwrap();
        let output: CacheStatsOutput = output_json(&result);

        assert_eq!(output.cache_entries, 0);
        assert_eq!(output.interest_set_size, 0);
        assert_eq!(output.storage.image_cache_bytes, 0);
        assert_eq!(output.image_cache_mb, 0.0);
        assert!(!output.offline);
    }

    #[tokio::test]
    async fn test_stats_after_search() {
        let t = test_state().await;
        t.remote
            .set_results("cabin", vec![Record::new("3"), Record::new("4"), Record::new("3")])
            .await;
        search_impl(&t.state, SearchParams { term: "cabin".into() }).await.unwrap();

        let result = stats_impl(&t.state, CacheStatsParams::default()).await.unwrap();
        let output: CacheStatsOutput = output_json(&result);
        assert_eq!(output.cache_entries, 1);
        assert_eq!(output.interest_set_size, 2);
    }
}
