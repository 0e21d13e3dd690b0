//! Shared server state.
//!
//! Wires the cache, replica, synchronizer and collaborators together once at startup.

use std::sync::Arc;

use roost_client::{CatalogClient, CatalogConfig, ImageStore};
use roost_core::{
    AppConfig, CacheDb, CacheEvictionManager, OfflineMode, OfflineModeController, RecordSource, RemoteSearch,
    ReplicaDb, SearchOrchestrator, SubscriptionSynchronizer, SyncHandle,
};

use crate::error::ServerError;

/// Everything a tool call needs.
pub struct AppState {
    pub config: AppConfig,
    pub cache: CacheDb,
    pub replica: Arc<ReplicaDb>,
    pub images: Arc<ImageStore>,
    pub orchestrator: SearchOrchestrator,
    pub offline: OfflineModeController,
    pub eviction: CacheEvictionManager,
    pub sync: SyncHandle,
}

impl AppState {
    /// Open the on-disk stores and connect to the remote catalog described by `config`.
    pub async fn open(config: AppConfig) -> Result<Self, ServerError> {
        let catalog = Arc::new(CatalogClient::new(CatalogConfig::from_app_config(&config))?);
        let images = Arc::new(ImageStore::from_app_config(&config)?);

        let cache = CacheDb::open(&config.db_path).await?;
        let source: Arc<dyn RecordSource> = catalog.clone();
        let replica = Arc::new(ReplicaDb::open(&config.replica_path, source).await?);

        tracing::info!(
            db = %config.db_path.display(),
            replica = %config.replica_path.display(),
            "stores opened"
        );

        Ok(Self::assemble(config, cache, catalog, replica, images))
    }

    /// Build the state from already-opened parts and start the synchronizer.
    pub fn assemble(
        config: AppConfig, cache: CacheDb, remote: Arc<dyn RemoteSearch>, replica: Arc<ReplicaDb>,
        images: Arc<ImageStore>,
    ) -> Self {
        let mode = OfflineMode::new(config.start_offline);
        let offline = OfflineModeController::new(mode.clone(), replica.clone());

        let orchestrator = SearchOrchestrator::new(cache.clone(), remote, replica.clone(), config.page_size);
        let eviction = CacheEvictionManager::new(images.clone(), replica.clone(), cache.clone());
        let sync =
            SubscriptionSynchronizer::new(replica.clone(), mode, config.subscription_name.clone()).spawn(cache.clone());

        Self { config, cache, replica, images, orchestrator, offline, eviction, sync }
    }
}
