//! Catalog client error types.

use std::sync::Arc;

/// Errors from the remote catalog client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Request parameters failed validation before being sent.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The remote function answered with an `error` field.
    #[error("remote error: {0}")]
    Remote(String),

    /// Authentication failed (missing or invalid API key).
    #[error("authentication failed")]
    AuthError,

    /// Rate limited by the remote.
    #[error("rate limited: too many requests")]
    RateLimited,

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// Local filesystem error (image cache).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { ClientError::Timeout } else { ClientError::Network(Arc::new(err)) }
    }
}
