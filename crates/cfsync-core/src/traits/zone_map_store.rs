// # Zone-Map Store Trait
//
// Defines the interface for the local domain → zone/record cache.
//
// ## Purpose
//
// The zone map lets cfsync answer "which zone and record back this domain"
// without a provider round trip, and records the last observed remote
// truth for each domain.
//
// ## Rules every implementation follows
//
// - `upsert` writes only when a field actually changed
// - A persisting store rewrites the whole backing file on every change
// - `load` never fails on a missing file; it yields an empty map
// - Lookups that miss return `Ok(None)`, not an error

use async_trait::async_trait;

use crate::zonemap::{UpsertOutcome, ZoneMapEntry};

/// Trait for zone-map store implementations
///
/// All methods take `&self`; implementations keep their map behind a lock
/// so a store can be shared by the engine and the command layer.
#[async_trait]
pub trait ZoneMapStore: Send + Sync {
    /// Replace in-memory entries with the persisted ones
    ///
    /// # Returns
    ///
    /// - `Ok(n)`: number of entries now in memory
    /// - `Err(Error)`: only for failures a caller can act on; unreadable
    ///   files are logged and treated as empty
    async fn load(&self) -> Result<usize, crate::Error>;

    /// Look up one domain
    async fn find(&self, domain: &str) -> Result<Option<ZoneMapEntry>, crate::Error>;

    /// Insert or update an entry, persisting if anything changed
    ///
    /// The in-memory map is updated even when persisting fails; the
    /// failure is returned as `Error::StoreIo` so the caller can log it.
    async fn upsert(&self, entry: ZoneMapEntry) -> Result<UpsertOutcome, crate::Error>;

    /// Remove one domain, persisting if it existed
    ///
    /// # Returns
    ///
    /// - `Ok(true)`: the entry existed and was removed
    /// - `Ok(false)`: nothing to remove
    async fn remove(&self, domain: &str) -> Result<bool, crate::Error>;

    /// Snapshot of all entries in persisted order
    async fn entries(&self) -> Result<Vec<ZoneMapEntry>, crate::Error>;

    /// Write the full map to backing storage, replacing previous content
    async fn save(&self) -> Result<(), crate::Error>;

    /// Drop every entry and the backing file ahead of a full rescan
    async fn clear_and_rebuild(&self) -> Result<(), crate::Error>;

    /// Number of entries in memory
    async fn len(&self) -> usize {
        self.entries().await.map(|e| e.len()).unwrap_or(0)
    }
}
