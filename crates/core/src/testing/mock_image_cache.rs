//! Mock image byte-cache.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::Error;
use crate::images::ImageCache;

/// Image cache that only tracks byte counts per tier.
#[derive(Debug, Default)]
pub struct MockImageCache {
    memory_bytes: AtomicU64,
    disk_bytes: AtomicU64,
    fail_disk: AtomicBool,
}

impl MockImageCache {
    pub fn with_sizes(memory_bytes: u64, disk_bytes: u64) -> Self {
        Self { memory_bytes: AtomicU64::new(memory_bytes), disk_bytes: AtomicU64::new(disk_bytes), ..Default::default() }
    }

    /// Make `clear_disk` fail until reset.
    pub fn set_disk_failure(&self, fail: bool) {
        self.fail_disk.store(fail, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ImageCache for MockImageCache {
    async fn clear_memory(&self) -> Result<(), Error> {
        self.memory_bytes.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_disk(&self) -> Result<(), Error> {
        if self.fail_disk.load(Ordering::SeqCst) {
            return Err(Error::ImageCache("disk cache directory is read-only".into()));
        }
        self.disk_bytes.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn size(&self) -> Result<u64, Error> {
        Ok(self.memory_bytes.load(Ordering::SeqCst) + self.disk_bytes.load(Ordering::SeqCst))
    }
}
