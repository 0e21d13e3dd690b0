//! Image byte-cache interface.

use crate::Error;

/// Black-box byte store for listing images, split into a memory and a disk tier.
#[async_trait::async_trait]
pub trait ImageCache: Send + Sync {
    async fn clear_memory(&self) -> Result<(), Error>;

    async fn clear_disk(&self) -> Result<(), Error>;

    /// Total bytes held across both tiers.
    async fn size(&self) -> Result<u64, Error>;
}
