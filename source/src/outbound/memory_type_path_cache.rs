//! Process-local registry snapshot cache.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::domain::RegistrySnapshot;
use crate::domain::ports::{TypePathCache, TypePathCacheError};

/// Keeps snapshots in memory for the life of the process.
#[derive(Debug, Default)]
pub struct InMemoryTypePathCache {
    snapshots: Mutex<HashMap<String, RegistrySnapshot>>,
}

impl InMemoryTypePathCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TypePathCache for InMemoryTypePathCache {
    async fn load(&self, key: &str) -> Result<Option<RegistrySnapshot>, TypePathCacheError> {
        let snapshots = self
            .snapshots
            .lock()
            .map_err(|_| TypePathCacheError::read("type path cache lock poisoned"))?;
        Ok(snapshots.get(key).cloned())
    }

    async fn store(&self, key: &str, snapshot: &RegistrySnapshot) -> Result<(), TypePathCacheError> {
        self.snapshots
            .lock()
            .map_err(|_| TypePathCacheError::write("type path cache lock poisoned"))?
            .insert(key.to_owned(), snapshot.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::REGISTRY_SNAPSHOT_VERSION;

    #[tokio::test]
    async fn stores_snapshots_per_key() {
        let cache = InMemoryTypePathCache::new();
        let snapshot = RegistrySnapshot {
            version: REGISTRY_SNAPSHOT_VERSION,
            entries: Vec::new(),
        };
        cache.store("blog:master", &snapshot).await.expect("store");

        assert_eq!(cache.load("blog:master").await.expect("load"), Some(snapshot));
        assert!(cache.load("blog:R1").await.expect("load").is_none());
    }
}
