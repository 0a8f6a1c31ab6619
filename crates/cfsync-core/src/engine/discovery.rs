//! Account-wide discovery
//!
//! Rebuilds the zone map from scratch: every zone, every record, keyed by
//! record name. The zone listing happens before the store is cleared, so an
//! unreachable provider leaves the old cache in place. Once clearing has
//! happened, an interrupted scan leaves a partial map, never a mix of old
//! and new entries.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::SyncEngine;
use crate::error::Result;
use crate::zonemap::{UpsertOutcome, ZoneMapEntry};

/// A zone whose record listing failed during discovery
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedZone {
    pub zone_id: String,
    pub zone_name: String,
    pub error: String,
}

/// Summary of one discovery run
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub zones_scanned: usize,
    /// Records returned by the provider across all zones
    pub records_seen: usize,
    /// Distinct domains now in the zone map
    pub entries_written: usize,
    pub failed_zones: Vec<FailedZone>,
}

impl DiscoveryReport {
    /// True if every zone was listed
    pub fn is_complete(&self) -> bool {
        self.failed_zones.is_empty()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at.signed_duration_since(self.started_at)
    }
}

impl SyncEngine {
    /// Crawl every zone and replace the zone map with what was found
    ///
    /// Fails only if the zone listing fails or the store cannot be
    /// cleared. Per-zone listing errors end up in
    /// [`DiscoveryReport::failed_zones`]. In dry-run mode the crawl happens
    /// but the zone map is left alone.
    pub async fn discover(&self) -> Result<DiscoveryReport> {
        let started_at = Utc::now();
        let zones = self.api.list_zones().await?;
        info!("Discovery: {} zone(s) found", zones.len());

        if !self.dry_run {
            self.store.clear_and_rebuild().await?;
        }

        let mut records_seen = 0;
        let mut entries_written = 0;
        let mut failed_zones = Vec::new();

        for zone in &zones {
            let records = match self.api.list_records(&zone.id, None).await {
                Ok(records) => records,
                Err(e) => {
                    warn!("Discovery: skipping zone {} ({}): {}", zone.name, zone.id, e);
                    failed_zones.push(FailedZone {
                        zone_id: zone.id.clone(),
                        zone_name: zone.name.clone(),
                        error: e.to_string(),
                    });
                    continue;
                }
            };

            debug!("Discovery: zone {} has {} record(s)", zone.name, records.len());
            records_seen += records.len();

            if self.dry_run {
                continue;
            }

            for record in &records {
                match self.store.upsert(ZoneMapEntry::from_remote(&zone.id, record)).await {
                    Ok(UpsertOutcome::Inserted) => entries_written += 1,
                    Ok(_) => debug!("Discovery: {} listed more than once; last one kept", record.name),
                    Err(e) => warn!("Discovery: not caching {} ({}): {}", record.name, record.id, e),
                }
            }
        }

        if !self.dry_run
            && let Err(e) = self.store.save().await
        {
            warn!("Discovery: failed to persist zone map: {}", e);
        }

        let report = DiscoveryReport {
            started_at,
            finished_at: Utc::now(),
            zones_scanned: zones.len(),
            records_seen,
            entries_written,
            failed_zones,
        };

        info!(
            "Discovery finished: {} zone(s), {} record(s), {} entr{} cached, {} zone(s) failed",
            report.zones_scanned,
            report.records_seen,
            report.entries_written,
            if report.entries_written == 1 { "y" } else { "ies" },
            report.failed_zones.len()
        );

        Ok(report)
    }
}
