//! cache_clear tool implementation.
//!
//! Wipes the image cache, the replica and the search cache.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use roost_core::{Error, EvictionReport};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for the cache_clear tool (none).
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct CacheClearParams {}

/// Implementation of the cache_clear tool.
pub async fn clear_impl(state: &AppState, _params: CacheClearParams) -> Result<CallToolResult, McpError> {
    let report: EvictionReport = state.eviction.clear_all().await?;
    tracing::info!(removed = report.cache_entries_removed, "all caches cleared");

    let json = serde_json::to_string_pretty(&report).map_err(Error::from)?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::tools::search::{SearchParams, search_impl};
    use crate::tools::test_support::{output_json, serve_image_after};
    use bytes::Bytes;
    use roost_core::{ImageCache, Record, ReplicaStore, interest};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clear_resets_everything() {
        let t = test_state().await;
        t.remote.set_results("loft", vec![Record::new("1")]).await;
        t.source.add_records(vec![Record::new("1")]).await;

        search_impl(&t.state, SearchParams { term: "loft".into() }).await.unwrap();
        t.state.sync.settled(t.state.cache.revision()).await;
        t.state
            .images
            .store("https://img.example.com/1.jpg", Bytes::from_static(b"jpeg"))
            .await
            .unwrap();
        t.state.images.clear_memory().await;
        assert_eq!(t.state.images.disk_size().await.unwrap(), 4);

        let result = clear_impl(&t.state, CacheClearParams::default()).await.unwrap();
        let report: EvictionReport = output_json(&result);
        assert_eq!(report.cache_entries_removed, 1);

        t.state.sync.settled(t.state.cache.revision()).await;
        t.state.replica.flush().await;

        assert_eq!(t.state.cache.entry_count().await.unwrap(), 0);
        assert!(interest::from_store(&t.state.cache).await.unwrap().is_empty());
        assert_eq!(t.state.replica.record_count().await.unwrap(), 0);
        assert_eq!(ImageCache::size(t.state.images.as_ref()).await.unwrap(), 0);
        assert!(t.state.replica.subscription_filter("listing").await.unwrap().is_none_or(|ids| ids.is_empty()));
    }

    #[tokio::test]
    async fn test_clear_empty_state() {
        let t = test_state().await;
        let result = clear_impl(&t.state, CacheClearParams::default()).await.unwrap();
        let report: EvictionReport = output_json(&result);
        assert_eq!(report.cache_entries_removed, 0);
    }

    #[tokio::test]
    async fn test_clear_wins_over_prefetch_in_flight() {
        let t = test_state().await;
        let url = serve_image_after(b"0123456789abcdef", Duration::from_millis(300)).await;
        let listing = Record::new("1").with_field("images", json!({ "picture_url": url }));
        t.remote.set_results("loft", vec![listing]).await;

        search_impl(&t.state, SearchParams { term: "loft".into() }).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        clear_impl(&t.state, CacheClearParams::default()).await.unwrap();
        assert_eq!(ImageCache::size(t.state.images.as_ref()).await.unwrap(), 0);

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert_eq!(ImageCache::size(t.state.images.as_ref()).await.unwrap(), 0);
    }
}
