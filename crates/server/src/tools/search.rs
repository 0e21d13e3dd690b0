//! search tool implementation.
//!
//! Serves listings from the search cache or the remote catalog, then warms the image cache.

use std::sync::Arc;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use roost_core::{Error, Record, ResultSource};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for the search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchParams {
    /// Free-text search term. Matching is case-insensitive; an empty term returns nothing.
    pub term: String,
}

/// Output from the search tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchOutput {
    pub items: Vec<Record>,
    /// True when the term had been searched before and no remote call was made.
    pub cache_hit: bool,
    pub count: usize,
}

/// Picture URLs of the given records, in order.
pub fn picture_urls(items: &[Record]) -> Vec<String> {
    items
        .iter()
        .filter_map(Record::picture_url)
        .map(str::to_string)
        .collect()
}

/// Implementation of the search tool.
pub async fn search_impl(state: &AppState, params: SearchParams) -> Result<CallToolResult, McpError> {
    let outcome = state.orchestrator.search(&params.term).await?;

    if outcome.source == ResultSource::Remote {
        let urls = picture_urls(&outcome.items);
        if !urls.is_empty() {
            let images = Arc::clone(&state.images);
            tokio::spawn(async move {
                let cached = images.prefetch(&urls).await;
                tracing::debug!("prefetched {}/{} images", cached, urls.len());
            });
        }
    }

    let output = SearchOutput { cache_hit: outcome.is_cache_hit(), count: outcome.items.len(), items: outcome.items };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}
