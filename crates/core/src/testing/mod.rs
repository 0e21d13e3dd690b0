//! Test doubles for the engine's external collaborators.
//!
//! Enabled for unit tests and, through the `testing` feature, for dependent
//! crates' tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use roost_core::testing::{MockRemoteSearch, fixtures};
//!
//! let remote = MockRemoteSearch::new();
//! remote.set_results("loft", fixtures::listings(&["1", "2"])).await;
//! ```

mod mock_image_cache;
mod mock_record_source;
mod mock_remote_search;
mod mock_replica;

pub use mock_image_cache::MockImageCache;
pub use mock_record_source::MockRecordSource;
pub use mock_remote_search::MockRemoteSearch;
pub use mock_replica::{MockReplica, ReplicaOp};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::record::{Record, RecordId};
    use serde_json::json;

    /// A listing record with a name and picture url.
    pub fn listing(id: &str) -> Record {
        Record::new(id)
            .with_field("name", json!(format!("Listing {id}")))
            .with_field("images", json!({ "picture_url": format!("https://img.example.com/{id}.jpg") }))
    }

    pub fn listings(ids: &[&str]) -> Vec<Record> {
        ids.iter().map(|id| listing(id)).collect()
    }

    pub fn ids(raw: &[&str]) -> Vec<RecordId> {
        raw.iter().map(|id| RecordId::from(*id)).collect()
    }
}
