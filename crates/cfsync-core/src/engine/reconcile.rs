//! Record reconciliation
//!
//! Converges one `(zone, type, name)` at the provider onto a desired
//! `(content, proxied)` pair:
//!
//! 1. One filtered listing of the matching records
//! 2. Keep the first record that already satisfies the desired state
//! 3. Delete every other match, best-effort
//! 4. Create the record if nothing was kept
//! 5. Mirror the result into the zone map
//!
//! Planning is a pure function ([`plan`]) so it can be checked without a
//! transport.

use serde::Serialize;
use tracing::{debug, info, warn};

use super::SyncEngine;
use crate::error::Result;
use crate::types::{DesiredRecord, RecordFilter, RemoteRecord};
use crate::zonemap::ZoneMapEntry;

/// What reconciliation intends to do with the listed records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcilePlan {
    /// Record left in place; `None` means a create is needed
    pub keep: Option<RemoteRecord>,
    /// Records to remove, in listing order
    pub delete: Vec<RemoteRecord>,
}

impl ReconcilePlan {
    pub fn needs_create(&self) -> bool {
        self.keep.is_none()
    }

    /// True if the remote side already matches and nothing will be sent
    pub fn is_noop(&self) -> bool {
        self.keep.is_some() && self.delete.is_empty()
    }
}

/// Build a plan from a provider listing
///
/// Records whose name or type differ from `desired` are ignored, whatever
/// the provider's filter let through.
pub fn plan(desired: &DesiredRecord, records: &[RemoteRecord]) -> ReconcilePlan {
    let mut plan = ReconcilePlan::default();

    for record in records.iter().filter(|r| desired.matches(r)) {
        if plan.keep.is_none() && desired.is_satisfied_by(record) {
            plan.keep = Some(record.clone());
        } else {
            plan.delete.push(record.clone());
        }
    }

    plan
}

/// How the desired record came to exist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// A satisfying record was already present and kept
    Unchanged,
    /// A new record was created
    Created,
    /// Dry run: the plan was computed but not applied
    Planned,
}

/// Result of [`SyncEngine::reconcile`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub action: ReconcileAction,
    /// Kept or created record; `None` only for a dry run that would create
    pub record_id: Option<String>,
    /// Record IDs deleted successfully
    pub removed: Vec<String>,
    /// Record IDs whose delete failed
    pub failed_removals: Vec<String>,
    pub plan: ReconcilePlan,
}

impl ReconcileOutcome {
    /// True if every planned delete went through
    pub fn is_clean(&self) -> bool {
        self.failed_removals.is_empty()
    }
}

impl SyncEngine {
    /// Make the provider hold exactly one record matching `desired`
    ///
    /// A listing that fails or cannot be parsed aborts before any mutation.
    /// A failed delete is recorded in the outcome and does not stop the run;
    /// a failed create is returned as the error. Zone-map failures are only
    /// logged.
    pub async fn reconcile(&self, desired: &DesiredRecord) -> Result<ReconcileOutcome> {
        let filter = RecordFilter::exact(&desired.record_type, &desired.name);
        let records = self
            .api
            .list_records(&desired.zone_id, Some(&filter))
            .await?;

        let plan = plan(desired, &records);
        debug!(
            "{} {}: {} listed, keep={:?}, delete={}",
            desired.record_type,
            desired.name,
            records.len(),
            plan.keep.as_ref().map(|r| r.id.as_str()),
            plan.delete.len()
        );

        if self.dry_run {
            for record in &plan.delete {
                info!(
                    "[dry-run] would delete {} {} -> {} ({})",
                    record.record_type, record.name, record.content, record.id
                );
            }
            if plan.needs_create() {
                info!(
                    "[dry-run] would create {} {} -> {} (proxied: {})",
                    desired.record_type, desired.name, desired.content, desired.proxied
                );
            }
            return Ok(ReconcileOutcome {
                action: ReconcileAction::Planned,
                record_id: plan.keep.as_ref().map(|r| r.id.clone()),
                removed: Vec::new(),
                failed_removals: Vec::new(),
                plan,
            });
        }

        let mut removed = Vec::new();
        let mut failed_removals = Vec::new();
        for record in &plan.delete {
            match self.api.delete_record(&desired.zone_id, &record.id).await {
                Ok(()) => {
                    info!(
                        "Deleted {} {} -> {} ({})",
                        record.record_type, record.name, record.content, record.id
                    );
                    removed.push(record.id.clone());
                }
                Err(e) => {
                    warn!("Failed to delete record {} for {}: {}", record.id, record.name, e);
                    failed_removals.push(record.id.clone());
                }
            }
        }

        let (action, record_id) = match &plan.keep {
            Some(kept) => {
                debug!("{} already points at {}", desired.name, desired.content);
                (ReconcileAction::Unchanged, kept.id.clone())
            }
            None => {
                let created = match self
                    .api
                    .create_record(&desired.zone_id, &desired.to_new_record())
                    .await
                {
                    Ok(created) => created,
                    Err(e) => {
                        self.forget_removed(&desired.name, &removed).await;
                        return Err(e);
                    }
                };
                info!(
                    "Created {} {} -> {} (proxied: {}, id: {})",
                    desired.record_type, desired.name, desired.content, desired.proxied, created.id
                );
                (ReconcileAction::Created, created.id)
            }
        };

        let entry = ZoneMapEntry::record(
            desired.name.as_str(),
            desired.zone_id.as_str(),
            record_id.as_str(),
            desired.proxied,
            desired.content.as_str(),
        );
        match self.store.upsert(entry).await {
            Ok(outcome) => debug!("Zone map entry for {}: {:?}", desired.name, outcome),
            Err(e) => warn!("Failed to update zone map for {}: {}", desired.name, e),
        }

        Ok(ReconcileOutcome {
            action,
            record_id: Some(record_id),
            removed,
            failed_removals,
            plan,
        })
    }

    /// Drop the cached entry for `domain` if it points at a deleted record
    async fn forget_removed(&self, domain: &str, removed: &[String]) {
        let cached = match self.store.find(domain).await {
            Ok(Some(entry)) => entry,
            Ok(None) => return,
            Err(e) => {
                warn!("Zone map lookup for {} failed: {}", domain, e);
                return;
            }
        };

        let stale = cached
            .record_id
            .as_ref()
            .is_some_and(|id| removed.contains(id));
        if !stale {
            return;
        }

        match self.store.remove(domain).await {
            Ok(_) => debug!("Dropped zone map entry for {}; its record was deleted", domain),
            Err(e) => warn!("Failed to drop zone map entry for {}: {}", domain, e),
        }
    }
}
