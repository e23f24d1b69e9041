//! Snapshot registry shared by the trainer and the self-play actors
//!
//! Empty at start. Only the trainer appends; actors read the latest
//! snapshot without waiting for a new one.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use network::{NetworkConfig, NetworkError, NetworkSnapshot};
use once_cell::sync::OnceCell;
use tracing::debug;

pub struct SnapshotRegistry {
    network: NetworkConfig,
    snapshots: RwLock<BTreeMap<u64, Arc<NetworkSnapshot>>>,
    /// Untrained network served while no snapshot exists
    initial: OnceCell<Arc<NetworkSnapshot>>,
}

impl std::fmt::Debug for SnapshotRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotRegistry")
            .field("network", &self.network)
            .field("latest_step", &self.latest_step())
            .finish_non_exhaustive()
    }
}

impl SnapshotRegistry {
    pub fn new(network: NetworkConfig) -> Self {
        Self {
            network,
            snapshots: RwLock::new(BTreeMap::new()),
            initial: OnceCell::new(),
        }
    }

    /// Store `snapshot` under `step`, replacing any snapshot at that step.
    pub fn save(
        &self,
        step: u64,
        snapshot: NetworkSnapshot,
    ) -> Result<Arc<NetworkSnapshot>, NetworkError> {
        let snapshot = Arc::new(snapshot);
        let mut snapshots = self.snapshots.write().map_err(|_| NetworkError::Poisoned)?;
        snapshots.insert(step, Arc::clone(&snapshot));
        debug!(step, stored = snapshots.len(), "Snapshot saved");
        Ok(snapshot)
    }

    /// Snapshot with the highest step, or an untrained network if none is stored.
    pub fn latest(&self) -> Result<Arc<NetworkSnapshot>, NetworkError> {
        let latest = {
            let snapshots = self.snapshots.read().map_err(|_| NetworkError::Poisoned)?;
            snapshots.values().next_back().cloned()
        };

        match latest {
            Some(snapshot) => Ok(snapshot),
            None => self
                .initial
                .get_or_try_init(|| NetworkSnapshot::fresh(self.network).map(Arc::new))
                .cloned(),
        }
    }

    pub fn latest_step(&self) -> Option<u64> {
        self.snapshots
            .read()
            .ok()
            .and_then(|snapshots| snapshots.keys().next_back().copied())
    }

    pub fn len(&self) -> usize {
        self.snapshots.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use network::NetworkKind;

    fn config() -> NetworkConfig {
        NetworkConfig::new(NetworkKind::Flat, 8)
    }

    #[test]
    fn test_empty_registry_serves_fresh_network() {
        let registry = SnapshotRegistry::new(config());
        assert!(registry.is_empty());
        assert_eq!(registry.latest_step(), None);

        let first = registry.latest().unwrap();
        assert_eq!(first.step(), 0);
        assert_eq!(first.config(), config());
        assert!(Arc::ptr_eq(&first, &registry.latest().unwrap()));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_latest_is_max_step() {
        let registry = SnapshotRegistry::new(config());
        for step in [20, 0, 10] {
            let snapshot = NetworkSnapshot::fresh(config()).unwrap();
            registry.save(step, snapshot).unwrap();
        }

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.latest_step(), Some(20));
    }

    #[test]
    fn test_latest_returns_saved_snapshot() {
        let registry = SnapshotRegistry::new(config());
        let fresh = registry.latest().unwrap();

        let learner = network::Learner::new(config(), network::LearnerConfig::default()).unwrap();
        registry.save(5, learner.snapshot(5).unwrap()).unwrap();

        let latest = registry.latest().unwrap();
        assert_eq!(latest.step(), 5);
        assert!(!Arc::ptr_eq(&fresh, &latest));
    }
}
