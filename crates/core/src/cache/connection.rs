//! Database connection management with pragma configuration.
//!
//! This module handles opening the SQLite database, applying required pragmas
//! for performance and concurrency (WAL mode), and running migrations.

use super::migrations::{self, CACHE_MIGRATIONS, Migrations};
use crate::Error;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_rusqlite::Connection;

/// Open a SQLite connection at `path` (or in memory), apply pragmas and run `migrations`.
pub(crate) async fn open_connection(path: Option<&Path>, migrations: Migrations) -> Result<Connection, Error> {
    let conn = match path {
        Some(path) => Connection::open(path).await,
        None => Connection::open_in_memory().await,
    }
    .map_err(|e| Error::Database(e.into()))?;

    conn.call(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode=WAL;
             PRAGMA synchronous=NORMAL;
             PRAGMA temp_store=MEMORY;
             PRAGMA foreign_keys=ON;",
        )?;
        Ok(())
    })
    .await
    .map_err(Error::Database)?;

    migrations::run(&conn, migrations).await?;

    Ok(conn)
}

/// Search cache database handle.
///
/// Wraps a tokio-rusqlite Connection that runs database operations
/// on a background thread, plus a revision channel that is bumped on
/// every successful mutation so observers can re-derive state.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
    changes: Arc<watch::Sender<u64>>,
}

impl CacheDb {
    /// Open a database at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = open_connection(Some(path.as_ref()), CACHE_MIGRATIONS).await?;
        Ok(Self::from_connection(conn))
    }

    /// Open an in-memory database for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = open_connection(None, CACHE_MIGRATIONS).await?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        let (changes, _) = watch::channel(0);
        Self { conn, changes: Arc::new(changes) }
    }

    /// Subscribe to store mutations.
    ///
    /// The receiver observes a monotonically increasing revision; intermediate
    /// revisions may be coalesced, so observers must re-read the whole store.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    /// Current store revision.
    pub fn revision(&self) -> u64 {
        *self.changes.borrow()
    }

    pub(crate) fn notify_changed(&self) -> u64 {
        self.changes.send_modify(|rev| *rev += 1);
        self.revision()
    }
}
