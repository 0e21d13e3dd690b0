//! Storage usage reporting.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::Error;
use crate::images::ImageCache;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Bytes used by each store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct StorageReport {
    pub local_db_bytes: u64,
    pub replica_db_bytes: u64,
    pub image_cache_bytes: u64,
}

impl StorageReport {
    /// Measure the two database files (including their WAL) and the image cache.
    pub async fn collect(local_db: &Path, replica_db: &Path, images: &dyn ImageCache) -> Result<Self, Error> {
        Ok(Self {
            local_db_bytes: database_size(local_db).await,
            replica_db_bytes: database_size(replica_db).await,
            image_cache_bytes: images.size().await?,
        })
    }

    pub fn local_db_mb(&self) -> f64 {
        to_mb(self.local_db_bytes)
    }

    pub fn replica_db_mb(&self) -> f64 {
        to_mb(self.replica_db_bytes)
    }

    pub fn image_cache_mb(&self) -> f64 {
        to_mb(self.image_cache_bytes)
    }
}

/// Size in MB rounded to two decimals.
fn to_mb(bytes: u64) -> f64 {
    (bytes as f64 / BYTES_PER_MB * 100.0).round() / 100.0
}

/// Size of a SQLite file plus its WAL. Missing files count as zero.
async fn database_size(path: &Path) -> u64 {
    let mut wal = path.as_os_str().to_owned();
    wal.push("-wal");

    let mut total = 0;
    for file in [path.to_path_buf(), wal.into()] {
        if let Ok(meta) = tokio::fs::metadata(&file).await {
            total += meta.len();
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockImageCache;

    #[test]
    fn test_to_mb_rounds() {
        assert_eq!(to_mb(0), 0.0);
        assert_eq!(to_mb(1024 * 1024), 1.0);
        assert_eq!(to_mb(1024 * 1024 * 3 / 2), 1.5);
        assert_eq!(to_mb(12_345_678), 11.77);
    }

    #[tokio::test]
    async fn test_missing_files_count_as_zero() {
        let images = MockImageCache::with_sizes(100, 400);
        let report = StorageReport::collect(
            Path::new("/nonexistent/roost-local.sqlite"),
            Path::new("/nonexistent/roost-replica.sqlite"),
            &images,
        )
        .await
        .unwrap();

        assert_eq!(report, StorageReport { local_db_bytes: 0, replica_db_bytes: 0, image_cache_bytes: 500 });
    }
}
