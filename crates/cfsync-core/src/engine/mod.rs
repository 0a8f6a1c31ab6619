//! Sync engine
//!
//! The SyncEngine is responsible for:
//! - Reconciling a desired record against the provider
//! - Rebuilding the zone map from a full account crawl
//! - The smaller one-shot operations (zone listing, delete, purge, lookup)
//!
//! ## Architecture
//!
//! ```text
//!                    ┌──────────────┐
//!                    │  SyncEngine  │
//!                    └──────────────┘
//!                            │
//!            ┌───────────────┴───────────────┐
//!            ▼                               ▼
//!    ┌──────────────┐                ┌──────────────┐
//!    │ ProviderApi  │                │ ZoneMapStore │
//!    │ (envelope)   │                │ (cache)      │
//!    └──────────────┘                └──────────────┘
//!            │
//!            ▼
//!    ┌──────────────┐
//!    │  Transport   │
//!    └──────────────┘
//! ```
//!
//! The provider is the source of truth. The zone map only mirrors what the
//! engine last observed or wrote, and a zone-map failure never fails a
//! remote operation that already succeeded.

mod discovery;
mod reconcile;

pub use discovery::{DiscoveryReport, FailedZone};
pub use reconcile::{ReconcileAction, ReconcileOutcome, ReconcilePlan, plan};

use tracing::{debug, info, warn};

use crate::api::ProviderApi;
use crate::error::Result;
use crate::traits::ZoneMapStore;
use crate::types::{RecordFilter, RemoteRecord, Zone};
use crate::zonemap::ZoneMapEntry;

/// Core sync engine
///
/// Holds no credentials itself; those live in the transport behind
/// [`ProviderApi`].
pub struct SyncEngine {
    api: ProviderApi,
    store: Box<dyn ZoneMapStore>,
    /// Compute and log plans without mutating anything
    dry_run: bool,
}

impl SyncEngine {
    pub fn new(api: ProviderApi, store: Box<dyn ZoneMapStore>, dry_run: bool) -> Self {
        if dry_run {
            info!("Dry-run mode: no records will be changed and the zone map will not be written");
        }
        Self {
            api,
            store,
            dry_run,
        }
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// List every zone and cache a zone-level entry per zone name
    ///
    /// An existing entry that already points at the same zone is left as
    /// is, so record metadata cached for the apex survives.
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        let zones = self.api.list_zones().await?;

        if self.dry_run {
            return Ok(zones);
        }

        for zone in &zones {
            match self.store.find(&zone.name).await {
                Ok(Some(existing)) if existing.zone_id == zone.id => {
                    debug!("Zone {} already cached", zone.name);
                    continue;
                }
                Ok(_) => {}
                Err(e) => warn!("Zone map lookup for {} failed: {}", zone.name, e),
            }

            if let Err(e) = self
                .store
                .upsert(ZoneMapEntry::zone(zone.name.as_str(), zone.id.as_str()))
                .await
            {
                warn!("Failed to cache zone {}: {}", zone.name, e);
            }
        }

        Ok(zones)
    }

    /// List records in one zone; the zone map is not touched
    pub async fn list_records(
        &self,
        zone_id: &str,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<RemoteRecord>> {
        self.api.list_records(zone_id, filter).await
    }

    /// Delete one record and drop any cache entry pointing at it
    ///
    /// Returns the dropped entry, if there was one.
    pub async fn delete_record(
        &self,
        zone_id: &str,
        record_id: &str,
    ) -> Result<Option<ZoneMapEntry>> {
        if self.dry_run {
            info!("[dry-run] would delete record {} in zone {}", record_id, zone_id);
            return Ok(None);
        }

        self.api.delete_record(zone_id, record_id).await?;
        info!("Deleted record {} in zone {}", record_id, zone_id);

        let cached = match self.store.entries().await {
            Ok(entries) => entries
                .into_iter()
                .find(|e| e.record_id.as_deref() == Some(record_id)),
            Err(e) => {
                warn!("Zone map scan after delete failed: {}", e);
                None
            }
        };

        if let Some(entry) = &cached
            && let Err(e) = self.store.remove(&entry.domain).await
        {
            warn!("Failed to drop zone map entry {}: {}", entry.domain, e);
        }

        Ok(cached)
    }

    /// Purge the provider's edge cache for a zone
    pub async fn purge_cache(&self, zone_id: &str) -> Result<()> {
        if self.dry_run {
            info!("[dry-run] would purge cache for zone {}", zone_id);
            return Ok(());
        }

        self.api.purge_cache(zone_id).await?;
        info!("Purged cache for zone {}", zone_id);
        Ok(())
    }

    /// Look up a domain in the local zone map only
    pub async fn display(&self, domain: &str) -> Result<Option<ZoneMapEntry>> {
        self.store.find(domain).await
    }
}
