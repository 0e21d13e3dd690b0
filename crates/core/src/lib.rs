//! Core engine for roost.
//!
//! This crate provides:
//! - Search result cache with SQLite backend
//! - Interest set aggregation and subscription synchronization
//! - Partial replica store with a live sync session
//! - Search orchestration, offline mode and coordinated eviction
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod error;
pub mod eviction;
pub mod images;
pub mod interest;
pub mod offline;
pub mod record;
pub mod remote;
pub mod replica;
pub mod search;
pub mod stats;
pub mod sync;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cache::{CacheDb, CacheEntry, NormalizedKey, normalize};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use eviction::{CacheEvictionManager, EvictionReport, EvictionStep};
pub use images::ImageCache;
pub use interest::InterestSet;
pub use offline::{OfflineMode, OfflineModeController};
pub use record::{Record, RecordId};
pub use remote::{RecordSource, RemoteSearch, SearchQuery};
pub use replica::{ReplicaDb, ReplicaStore};
pub use search::{ResultSource, SearchOrchestrator, SearchOutcome};
pub use stats::StorageReport;
pub use sync::{SubscriptionSynchronizer, SyncHandle};
