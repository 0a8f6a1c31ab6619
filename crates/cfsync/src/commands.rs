//! Command dispatch and output
//!
//! Builds the engine from resolved configuration, runs one verb and prints
//! the result either as a short human-readable report or, with `--json`,
//! as compact JSON for scripting.

use anyhow::Context;
use serde::Serialize;
use std::path::Path;
use tracing::{info, warn};

use cfsync_core::config::{Config, ConfigOverrides, FileSettings};
use cfsync_core::store::{FileZoneMapStore, MemoryZoneMapStore};
use cfsync_core::traits::ZoneMapStore;
use cfsync_core::types::{DesiredRecord, RecordFilter};
use cfsync_core::zonemap::codec::format_entry;
use cfsync_core::{Error, ProviderApi, ReconcileAction, SyncEngine};
use cfsync_provider_cloudflare::CloudflareTransport;

use crate::{CfsyncExitCode, Command};

/// Whether a command fully reached its goal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    Complete,
    /// The command ran but some part of it failed (a delete, a zone)
    Partial,
}

/// Resolve configuration from the config file and explicit overrides
pub fn load_config(path: &Path, overrides: ConfigOverrides) -> cfsync_core::Result<Config> {
    let file = FileSettings::load(path)?;
    let config = Config::resolve(overrides, file)?;
    tracing::debug!("Configuration: {:?}", config);
    Ok(config)
}

/// Map a failed command to its exit code
pub(crate) fn exit_code_for(err: &anyhow::Error) -> CfsyncExitCode {
    match err.downcast_ref::<Error>() {
        Some(Error::Config(_)) | Some(Error::InvalidInput(_)) => CfsyncExitCode::ConfigError,
        _ => CfsyncExitCode::OperationFailed,
    }
}

/// Stdout printer honouring `--json`
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce() -> String) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(value)?);
        } else {
            let text = human();
            if !text.is_empty() {
                println!("{}", text);
            }
        }
        Ok(())
    }
}

async fn open_store(config: &Config) -> Box<dyn ZoneMapStore> {
    if !config.persist_zone_map {
        info!("Zone map caching disabled; using an in-memory map");
        return Box::new(MemoryZoneMapStore::new());
    }

    match FileZoneMapStore::open(&config.zone_map_path).await {
        Ok(store) => Box::new(store),
        Err(e) => {
            warn!("{}. Continuing with an in-memory zone map.", e);
            Box::new(MemoryZoneMapStore::new())
        }
    }
}

fn build_engine(config: &Config, store: Box<dyn ZoneMapStore>) -> anyhow::Result<SyncEngine> {
    let transport = CloudflareTransport::new(config)?;
    tracing::debug!("Using {:?}", transport);
    Ok(SyncEngine::new(
        ProviderApi::new(Box::new(transport)),
        store,
        config.dry_run,
    ))
}

/// Run one command to completion
pub(crate) async fn run(command: &Command, config: Config, out: &Output) -> anyhow::Result<Completion> {
    let store = open_store(&config).await;
    let engine = build_engine(&config, store)?;

    match command {
        Command::ListZones => {
            let zones = engine.list_zones().await.context("list_zones failed")?;
            out.emit(&zones, || {
                zones
                    .iter()
                    .map(|z| {
                        format!(
                            "{:<32} {:<40} {}",
                            z.id,
                            z.name,
                            z.status.as_deref().unwrap_or("-")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            Ok(Completion::Complete)
        }

        Command::AddUpdateRecord {
            zone_id,
            record_type,
            name,
            content,
            ttl,
            proxied,
        } => {
            let desired = DesiredRecord::new(
                zone_id.as_str(),
                record_type.as_str(),
                name.as_str(),
                content.as_str(),
                *ttl,
                *proxied,
            )?;
            let outcome = engine
                .reconcile(&desired)
                .await
                .with_context(|| format!("add_update_record {} failed", desired.name))?;

            out.emit(&outcome, || {
                let mut lines = Vec::new();
                let verb = match outcome.action {
                    ReconcileAction::Unchanged => "Unchanged",
                    ReconcileAction::Created => "Created",
                    ReconcileAction::Planned => "Planned",
                };
                lines.push(format!(
                    "{} {} {} -> {} (proxied: {}, record: {})",
                    verb,
                    desired.record_type,
                    desired.name,
                    desired.content,
                    desired.proxied,
                    outcome.record_id.as_deref().unwrap_or("-")
                ));
                for id in &outcome.removed {
                    lines.push(format!("Removed {}", id));
                }
                for id in &outcome.failed_removals {
                    lines.push(format!("Failed to remove {}", id));
                }
                lines.join("\n")
            })?;

            Ok(if outcome.is_clean() {
                Completion::Complete
            } else {
                Completion::Partial
            })
        }

        Command::DeleteRecord { zone_id, record_id } => {
            let dropped = engine
                .delete_record(zone_id, record_id)
                .await
                .with_context(|| format!("delete_record {} failed", record_id))?;

            let report = serde_json::json!({
                "zone_id": zone_id,
                "record_id": record_id,
                "dry_run": engine.is_dry_run(),
                "cache_entry_removed": dropped.as_ref().map(|e| e.domain.as_str()),
            });
            out.emit(&report, || {
                if engine.is_dry_run() {
                    return String::new();
                }
                match &dropped {
                    Some(entry) => format!("Deleted {} ({})", record_id, entry.domain),
                    None => format!("Deleted {}", record_id),
                }
            })?;
            Ok(Completion::Complete)
        }

        Command::PurgeCache { zone_id } => {
            engine
                .purge_cache(zone_id)
                .await
                .with_context(|| format!("purge_cache {} failed", zone_id))?;

            let report = serde_json::json!({
                "zone_id": zone_id,
                "purged": !engine.is_dry_run(),
            });
            out.emit(&report, || {
                if engine.is_dry_run() {
                    String::new()
                } else {
                    format!("Purged cache for zone {}", zone_id)
                }
            })?;
            Ok(Completion::Complete)
        }

        Command::DisplayRecord { domain } => {
            let entry = engine.display(domain).await?;
            out.emit(&entry, || match &entry {
                Some(entry) => format_entry(entry),
                None => format!("{} is not in the zone map", domain),
            })?;
            Ok(Completion::Complete)
        }

        Command::Discover => {
            let report = engine.discover().await.context("discover failed")?;
            out.emit(&report, || {
                let mut lines = vec![format!(
                    "Scanned {} zone(s), {} record(s); {} zone map entr{} in {} ms",
                    report.zones_scanned,
                    report.records_seen,
                    report.entries_written,
                    if report.entries_written == 1 { "y" } else { "ies" },
                    report.duration().num_milliseconds()
                )];
                for failed in &report.failed_zones {
                    lines.push(format!(
                        "Failed zone {} ({}): {}",
                        failed.zone_name, failed.zone_id, failed.error
                    ));
                }
                lines.join("\n")
            })?;

            Ok(if report.is_complete() {
                Completion::Complete
            } else {
                Completion::Partial
            })
        }

        Command::ListRecords {
            zone_id,
            record_type,
            name,
        } => {
            let filter = RecordFilter {
                record_type: record_type.as_ref().map(|t| t.to_ascii_uppercase()),
                name: name.clone(),
            };
            let filter = (filter != RecordFilter::default()).then_some(filter);

            let records = engine
                .list_records(zone_id, filter.as_ref())
                .await
                .with_context(|| format!("list_records {} failed", zone_id))?;

            out.emit(&records, || {
                records
                    .iter()
                    .map(|r| {
                        format!(
                            "{:<32} {:<6} {:<40} {:<40} ttl={} proxied={}",
                            r.id, r.record_type, r.name, r.content, r.ttl, r.proxied
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            Ok(Completion::Complete)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_and_input_errors_exit_with_usage_code() {
        let err = anyhow::Error::new(Error::invalid_input("name cannot be empty"));
        assert_eq!(exit_code_for(&err), CfsyncExitCode::ConfigError);

        let err = anyhow::Error::new(Error::config("API token is required"));
        assert_eq!(exit_code_for(&err), CfsyncExitCode::ConfigError);
    }

    #[test]
    fn provider_failures_exit_with_operation_code() {
        let err = anyhow::Error::new(Error::malformed("GET /zones: expected value"))
            .context("list_zones failed");
        assert_eq!(exit_code_for(&err), CfsyncExitCode::OperationFailed);

        let err = anyhow::anyhow!("something else");
        assert_eq!(exit_code_for(&err), CfsyncExitCode::OperationFailed);
    }

    #[test]
    fn load_config_reads_file_and_prefers_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.txt");
        std::fs::write(&path, "API_KEY=file-token\nEMAIL=ops@example.com\nZONE_MAP=/var/lib/cfsync/zm.txt\n")
            .unwrap();

        let config = load_config(&path, ConfigOverrides::default()).unwrap();
        assert_eq!(config.api_token, "file-token");
        assert_eq!(config.zone_map_path, Path::new("/var/lib/cfsync/zm.txt"));

        let overrides = ConfigOverrides {
            api_token: Some("flag-token".to_string()),
            ..Default::default()
        };
        assert_eq!(load_config(&path, overrides).unwrap().api_token, "flag-token");
    }

    #[test]
    fn load_config_without_token_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(&dir.path().join("absent.txt"), ConfigOverrides::default()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn no_cache_uses_memory_store() {
        let dir = tempfile::tempdir().unwrap();
        let zone_map = dir.path().join("zone_map.txt");
        let config = Config::resolve(
            ConfigOverrides {
                api_token: Some("t0ken".to_string()),
                zone_map_path: Some(zone_map.clone()),
                no_cache: true,
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let store = open_store(&config).await;
        store
            .upsert(cfsync_core::ZoneMapEntry::zone("example.com", "zoneA"))
            .await
            .unwrap();
        assert!(!zone_map.exists());
    }
}
