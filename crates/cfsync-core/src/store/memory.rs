// # Memory Zone-Map Store
//
// In-memory implementation of ZoneMapStore.
//
// Nothing survives the process. Used by tests and by `--no-cache`, where
// every command works from the provider's answers alone.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::error::Result;
use crate::traits::ZoneMapStore;
use crate::zonemap::{UpsertOutcome, ZoneMap, ZoneMapEntry};

/// In-memory zone-map store
///
/// Clones share the same map, so a test can hand one clone to the engine
/// and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MemoryZoneMapStore {
    inner: Arc<RwLock<ZoneMap>>,
}

impl MemoryZoneMapStore {
    /// Create a new empty memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`
    pub fn with_entries(entries: impl IntoIterator<Item = ZoneMapEntry>) -> Result<Self> {
        let mut map = ZoneMap::new();
        for entry in entries {
            map.upsert(entry)?;
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
        })
    }

    /// Render the current contents in the zone-map file format
    pub async fn render(&self) -> String {
        self.inner.read().await.render()
    }
}

#[async_trait]
impl ZoneMapStore for MemoryZoneMapStore {
    async fn load(&self) -> Result<usize> {
        // Nothing persisted to reload from
        Ok(self.inner.read().await.len())
    }

    async fn find(&self, domain: &str) -> Result<Option<ZoneMapEntry>> {
        Ok(self.inner.read().await.find(domain).cloned())
    }

    async fn upsert(&self, entry: ZoneMapEntry) -> Result<UpsertOutcome> {
        self.inner.write().await.upsert(entry)
    }

    async fn remove(&self, domain: &str) -> Result<bool> {
        Ok(self.inner.write().await.remove(domain).is_some())
    }

    async fn entries(&self) -> Result<Vec<ZoneMapEntry>> {
        Ok(self.inner.read().await.iter().cloned().collect())
    }

    async fn save(&self) -> Result<()> {
        Ok(())
    }

    async fn clear_and_rebuild(&self) -> Result<()> {
        self.inner.write().await.clear();
        Ok(())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.len()
    }
}
