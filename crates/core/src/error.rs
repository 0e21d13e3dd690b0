//! Unified error types for roost.
//!
//! Every variant carries a stable code prefix so tool callers can match on it.

use rmcp::model::{ErrorCode, ErrorData as McpError};
use tokio_rusqlite::rusqlite;

use crate::eviction::EvictionStep;

/// Unified error types for the roost engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters.
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// A cache entry already exists for the normalized key.
    #[error("DUPLICATE_KEY: {0}")]
    DuplicateKey(String),

    /// The remote search procedure failed.
    #[error("SEARCH_FAILED: {0}")]
    SearchFailed(String),

    /// Subscription reconciliation or replica sync could not reach the remote.
    #[error("SYNC_UNAVAILABLE: {0}")]
    SyncUnavailable(String),

    /// One or more eviction steps failed. The remaining steps were still attempted.
    #[error("EVICTION_PARTIAL_FAILURE: {message}")]
    EvictionPartialFailure { failed: Vec<EvictionStep>, message: String },

    /// Image byte-cache operation failed.
    #[error("IMAGE_CACHE_ERROR: {0}")]
    ImageCache(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored JSON could not be encoded or decoded.
    #[error("CACHE_ERROR: serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<Error> for McpError {
    fn from(err: Error) -> Self {
        let (code, message) = match &err {
            Error::InvalidInput(msg) => (-32602, msg.clone()),
            Error::DuplicateKey(msg) => (-32001, msg.clone()),
            Error::SearchFailed(msg) => (-32003, msg.clone()),
            Error::SyncUnavailable(msg) => (-32004, msg.clone()),
            Error::EvictionPartialFailure { message, .. } => (-32005, message.clone()),
            Error::ImageCache(msg) => (-32006, msg.clone()),
            Error::Database(e) => (-32002, e.to_string()),
            Error::MigrationFailed(msg) => (-32002, msg.clone()),
            Error::Serialization(e) => (-32002, e.to_string()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}
