//! Startup errors for the roost server.
//!
//! Tool calls report `roost_core::Error` directly; these only cover wiring the state together.

use roost_client::ClientError;
use roost_core::ConfigError;

/// Failure to build the server state.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration could not be loaded or failed validation.
    #[error("CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// An HTTP client could not be constructed.
    #[error("CLIENT_ERROR: {0}")]
    Client(#[from] ClientError),

    /// A local store could not be opened.
    #[error("{0}")]
    Store(#[from] roost_core::Error),
}
