//! Offline mode.
//!
//! The flag is an explicit handle shared by whoever needs it, not process
//! global state, so each test can build its own.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::replica::ReplicaStore;

/// Shared offline flag. Not persisted.
#[derive(Debug, Clone, Default)]
pub struct OfflineMode(Arc<AtomicBool>);

impl OfflineMode {
    pub fn new(offline: bool) -> Self {
        Self(Arc::new(AtomicBool::new(offline)))
    }

    pub fn is_offline(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self, offline: bool) {
        self.0.store(offline, Ordering::SeqCst);
    }
}

/// Pauses and resumes the replica's live sync channel.
pub struct OfflineModeController {
    mode: OfflineMode,
    replica: Arc<dyn ReplicaStore>,
}

impl OfflineModeController {
    /// Create a controller and apply the current mode to the replica.
    pub fn new(mode: OfflineMode, replica: Arc<dyn ReplicaStore>) -> Self {
        let controller = Self { mode, replica };
        controller.apply();
        controller
    }

    pub fn set_offline_mode(&self, enabled: bool) {
        self.mode.set(enabled);
        self.apply();
        tracing::info!(offline = enabled, "offline mode changed");
    }

    /// Flip the mode and return the new value.
    pub fn toggle(&self) -> bool {
        let enabled = !self.mode.is_offline();
        self.set_offline_mode(enabled);
        enabled
    }

    pub fn is_offline(&self) -> bool {
        self.mode.is_offline()
    }

    pub fn mode(&self) -> &OfflineMode {
        &self.mode
    }

    fn apply(&self) {
        if self.mode.is_offline() {
            self.replica.pause_sync();
        } else {
            self.replica.resume_sync();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockReplica;

    #[test]
    fn test_default_is_online() {
        assert!(!OfflineMode::default().is_offline());
    }

    #[test]
    fn test_set_offline_pauses_replica() {
        let replica = Arc::new(MockReplica::new());
        let controller = OfflineModeController::new(OfflineMode::default(), replica.clone());
        assert!(!replica.is_sync_paused());

        controller.set_offline_mode(true);
        assert!(controller.is_offline());
        assert!(replica.is_sync_paused());

        controller.set_offline_mode(false);
        assert!(!replica.is_sync_paused());
    }

    #[test]
    fn test_toggle() {
        let replica = Arc::new(MockReplica::new());
        let controller = OfflineModeController::new(OfflineMode::default(), replica.clone());

        assert!(controller.toggle());
        assert!(replica.is_sync_paused());
        assert!(!controller.toggle());
        assert!(!replica.is_sync_paused());
    }

    #[test]
    fn test_initial_mode_applied_and_shared() {
        let replica = Arc::new(MockReplica::new());
        let mode = OfflineMode::new(true);
        let controller = OfflineModeController::new(mode.clone(), replica.clone());
        assert!(replica.is_sync_paused());

        controller.set_offline_mode(false);
        assert!(!mode.is_offline());
    }
}
