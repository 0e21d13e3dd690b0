//! offline_mode tool implementation.
//!
//! Pauses or resumes the replica's sync with the remote catalog.

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use roost_core::{Error, ReplicaStore};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Parameters for the offline_mode tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineModeParams {
    /// True pauses replica sync; false resumes it.
    pub enabled: bool,
}

/// Output from the offline_mode tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct OfflineModeOutput {
    pub offline: bool,
    pub sync_paused: bool,
}

/// Implementation of the offline_mode tool.
pub async fn offline_impl(state: &AppState, params: OfflineModeParams) -> Result<CallToolResult, McpError> {
    state.offline.set_offline_mode(params.enabled);

    let output = OfflineModeOutput { offline: state.offline.is_offline(), sync_paused: state.replica.is_sync_paused() };
    let json = serde_json::to_string_pretty(&output).map_err(Error::from)?;

    Ok(CallToolResult::success(vec![Content::text(json)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_support::test_state;
    use crate::tools::test_support::output_json;

    #[tokio::test]
    async fn test_toggle_offline() {
        let t = test_state().await;
        assert!(!t.state.offline.is_offline());

        let result = offline_impl(&t.state, OfflineModeParams { enabled: true }).await.unwrap();
        let output: OfflineModeOutput = output_json(&result);
        assert!(output.offline);
        assert!(output.sync_paused);

        let result = offline_impl(&t.state, OfflineModeParams { enabled: false }).await.unwrap();
        let output: OfflineModeOutput = output_json(&result);
        assert!(!output.offline);
        assert!(!output.sync_paused);
    }
}
