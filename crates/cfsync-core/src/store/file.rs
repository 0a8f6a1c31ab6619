// # File Zone-Map Store
//
// Persists the zone map as a line-oriented text file (see
// `zonemap::codec` for the format).
//
// ## Write path
//
// Every change rewrites the whole file: the rendered map goes to a sibling
// `.tmp` file which is then renamed over the real one. The file therefore
// never holds duplicate or stale lines from an earlier state.
//
// ## Read path
//
// - Missing file: empty map, not an error
// - Unreadable file: logged, empty map
// - Malformed or torn lines: skipped individually, the rest is kept
//
// No locking is done against other processes; one cfsync invocation at a
// time is assumed.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::traits::ZoneMapStore;
use crate::zonemap::{UpsertOutcome, ZoneMap, ZoneMapEntry};

/// File-backed zone-map store
///
/// # Example
///
/// ```rust,no_run
/// use cfsync_core::store::FileZoneMapStore;
/// use cfsync_core::traits::ZoneMapStore;
/// use cfsync_core::zonemap::ZoneMapEntry;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileZoneMapStore::open("zone_map.txt").await?;
///
///     store
///         .upsert(ZoneMapEntry::zone("example.com", "023e105f4ecef8ad9ca31a8372d0c353"))
///         .await?;
///
///     let entry = store.find("example.com").await?;
///     assert!(entry.is_some());
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileZoneMapStore {
    path: PathBuf,
    map: RwLock<ZoneMap>,
}

impl FileZoneMapStore {
    /// Open a store, loading whatever the file currently holds
    ///
    /// Creates the parent directory if needed. Only a failure to create
    /// that directory is an error; every read problem degrades to an empty
    /// or partial map.
    pub async fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::store_io(format!(
                    "Failed to create zone map directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let map = Self::read_map(&path).await;
        tracing::debug!(
            "Opened zone map {} with {} entries",
            path.display(),
            map.len()
        );

        Ok(Self {
            path,
            map: RwLock::new(map),
        })
    }

    async fn read_map(path: &Path) -> ZoneMap {
        let bytes = match fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("Zone map file does not exist: {}", path.display());
                return ZoneMap::new();
            }
            Err(e) => {
                let err = Error::store_io(format!(
                    "Failed to read zone map {}: {}",
                    path.display(),
                    e
                ));
                tracing::warn!("{}. Starting with an empty zone map.", err);
                return ZoneMap::new();
            }
        };

        let parsed = ZoneMap::parse_bytes(&bytes);
        if parsed.skipped > 0 {
            tracing::warn!(
                "Zone map {}: skipped {} unusable line(s), kept {} entries",
                path.display(),
                parsed.skipped,
                parsed.map.len()
            );
        }
        parsed.map
    }

    /// Write the rendered map via temp file and rename
    async fn write_map(&self, map: &ZoneMap) -> Result<()> {
        let rendered = map.render();
        let temp_path = self.temp_path();

        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store_io(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(rendered.as_bytes()).await.map_err(|e| {
                Error::store_io(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store_io(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store_io(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!(
            "Zone map written to {} ({} entries)",
            self.path.display(),
            map.len()
        );
        Ok(())
    }

    /// Sibling temp file: the full file name plus `.tmp`
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl ZoneMapStore for FileZoneMapStore {
    async fn load(&self) -> Result<usize> {
        let loaded = Self::read_map(&self.path).await;
        let mut guard = self.map.write().await;
        *guard = loaded;
        Ok(guard.len())
    }

    async fn find(&self, domain: &str) -> Result<Option<ZoneMapEntry>> {
        let guard = self.map.read().await;
        Ok(guard.find(domain).cloned())
    }

    async fn upsert(&self, entry: ZoneMapEntry) -> Result<UpsertOutcome> {
        let mut guard = self.map.write().await;
        let outcome = guard.upsert(entry)?;

        if outcome.is_change() {
            // Held across the write so concurrent upserts persist in order
            self.write_map(&guard).await?;
        }

        Ok(outcome)
    }

    async fn remove(&self, domain: &str) -> Result<bool> {
        let mut guard = self.map.write().await;
        if guard.remove(domain).is_none() {
            return Ok(false);
        }
        self.write_map(&guard).await?;
        Ok(true)
    }

    async fn entries(&self) -> Result<Vec<ZoneMapEntry>> {
        let guard = self.map.read().await;
        Ok(guard.iter().cloned().collect())
    }

    async fn save(&self) -> Result<()> {
        let guard = self.map.read().await;
        self.write_map(&guard).await
    }

    async fn clear_and_rebuild(&self) -> Result<()> {
        let mut guard = self.map.write().await;
        guard.clear();

        for path in [self.path.clone(), self.temp_path()] {
            match fs::remove_file(&path).await {
                Ok(()) => tracing::debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(Error::store_io(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }

        tracing::info!("Zone map cleared for rebuild");
        Ok(())
    }

    async fn len(&self) -> usize {
        self.map.read().await.len()
    }
}
