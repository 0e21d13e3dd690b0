//! Interest set aggregation.
//!
//! The interest set is the deduplicated union of every identifier held by the
//! search cache. It is always derived from the store, never kept on its own.

use std::collections::BTreeSet;

use crate::cache::{CacheDb, CacheEntry};
use crate::record::RecordId;
use crate::Error;

/// Deduplicated set of identifiers the replica should hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterestSet {
    pub ids: BTreeSet<RecordId>,
}

impl InterestSet {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: &RecordId) -> bool {
        self.ids.contains(id)
    }
}

impl FromIterator<RecordId> for InterestSet {
    fn from_iter<I: IntoIterator<Item = RecordId>>(iter: I) -> Self {
        Self { ids: iter.into_iter().collect() }
    }
}

/// Fold every entry's identifiers into one set.
pub fn recompute<'a>(entries: impl IntoIterator<Item = &'a CacheEntry>) -> InterestSet {
    entries
        .into_iter()
        .flat_map(|entry| entry.result_ids.iter().cloned())
        .collect()
}

/// Read the whole store and recompute its interest set.
pub async fn from_store(db: &CacheDb) -> Result<InterestSet, Error> {
    let entries = db.all_entries().await?;
    Ok(recompute(&entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::normalize;

    fn entry(term: &str, ids: &[&str]) -> CacheEntry {
        CacheEntry {
            key: normalize(term),
            result_ids: ids.iter().map(|id| RecordId::from(*id)).collect(),
            created_at: String::new(),
        }
    }

    #[test]
    fn test_recompute_is_union() {
        let entries = vec![entry("loft", &["1", "2", "3"]), entry("cabin", &["3", "4"])];
        let set = recompute(&entries);

        let expected: InterestSet = ["1", "2", "3", "4"].into_iter().map(RecordId::from).collect();
        assert_eq!(set, expected);
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_recompute_empty() {
        assert!(recompute(&Vec::new()).is_empty());
        assert!(recompute(&vec![entry("nothing", &[])]).is_empty());
    }

    #[tokio::test]
    async fn test_from_store_tracks_mutations() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(from_store(&db).await.unwrap().is_empty());

        db.insert(&normalize("loft"), &["1".into(), "2".into()]).await.unwrap();
        db.insert(&normalize("cabin"), &["2".into(), "5".into()]).await.unwrap();
        let set = from_store(&db).await.unwrap();
        assert_eq!(set.len(), 3);
        assert!(set.contains(&RecordId::from("5")));

        db.clear().await.unwrap();
        assert!(from_store(&db).await.unwrap().is_empty());
    }
}
