//! Catalog function response envelope.

use roost_core::Record;
use serde::Deserialize;

use super::ClientError;

/// Raw function response: either `{"result": [...]}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
pub struct FunctionResponse {
    #[serde(default)]
    pub result: Option<Vec<Record>>,
    #[serde(default)]
    pub error: Option<String>,
}

impl FunctionResponse {
    /// Parse a response body.
    pub fn parse(bytes: &[u8]) -> Result<Self, ClientError> {
        serde_json::from_slice(bytes).map_err(|e| ClientError::Parse(e.to_string()))
    }

    /// The records, or the remote's error. An `error` field wins over `result`.
    pub fn into_records(self) -> Result<Vec<Record>, ClientError> {
        match (self.error, self.result) {
            (Some(error), _) => Err(ClientError::Remote(error)),
            (None, Some(records)) => Ok(records),
            (None, None) => Err(ClientError::Parse("response has neither result nor error".to_string())),
        }
    }
}
