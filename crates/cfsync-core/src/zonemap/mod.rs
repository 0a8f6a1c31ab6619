//! Zone map: the in-memory domain → zone/record cache
//!
//! [`ZoneMap`] is a plain data structure with the add-or-update-in-place
//! rule; persistence lives in [`crate::store`] and the on-disk line format
//! in [`codec`].

pub mod codec;

use serde::Serialize;
use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::types::RemoteRecord;

pub use codec::{DELIMITER, ParsedZoneMap};

/// One cached domain
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZoneMapEntry {
    /// Domain or subdomain name; unique key
    pub domain: String,
    /// Provider zone owning the domain
    pub zone_id: String,
    /// Provider record backing the domain, if known
    pub record_id: Option<String>,
    pub proxied: bool,
    pub content: String,
}

impl ZoneMapEntry {
    /// Zone-level entry with no record metadata
    pub fn zone(domain: impl Into<String>, zone_id: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            zone_id: zone_id.into(),
            record_id: None,
            proxied: false,
            content: String::new(),
        }
    }

    /// Entry describing a specific record
    pub fn record(
        domain: impl Into<String>,
        zone_id: impl Into<String>,
        record_id: impl Into<String>,
        proxied: bool,
        content: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            zone_id: zone_id.into(),
            record_id: Some(record_id.into()),
            proxied,
            content: content.into(),
        }
    }

    /// Entry mirroring a record observed at the provider
    pub fn from_remote(zone_id: &str, record: &RemoteRecord) -> Self {
        Self::record(
            record.name.clone(),
            zone_id,
            record.id.clone(),
            record.proxied,
            record.content.clone(),
        )
    }

    /// Check that every field can be written to the zone-map file
    ///
    /// The file format has no escaping, so whitespace anywhere in a value
    /// would split or break the line.
    pub fn validate(&self) -> Result<()> {
        if self.domain.is_empty() {
            return Err(Error::invalid_input("zone map domain cannot be empty"));
        }
        if self.zone_id.is_empty() {
            return Err(Error::invalid_input(format!(
                "zone map entry '{}' has an empty zone id",
                self.domain
            )));
        }
        if matches!(self.record_id.as_deref(), Some("")) {
            return Err(Error::invalid_input(format!(
                "zone map entry '{}' has an empty record id",
                self.domain
            )));
        }

        let fields = [
            ("domain", self.domain.as_str()),
            ("zone_id", self.zone_id.as_str()),
            ("record_id", self.record_id.as_deref().unwrap_or("")),
            ("content", self.content.as_str()),
        ];
        for (name, value) in fields {
            if value.chars().any(char::is_whitespace) {
                return Err(Error::invalid_input(format!(
                    "zone map {} for '{}' contains whitespace: {:?}",
                    name, self.domain, value
                )));
            }
        }

        Ok(())
    }
}

/// Result of [`ZoneMap::upsert`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// Domain was not present
    Inserted,
    /// Domain was present with different fields
    Updated,
    /// Domain was present with identical fields; nothing to write
    Unchanged,
}

impl UpsertOutcome {
    /// True if the map changed and needs persisting
    pub fn is_change(&self) -> bool {
        !matches!(self, UpsertOutcome::Unchanged)
    }
}

/// Domain-keyed map of cached entries
///
/// Backed by a `BTreeMap` so iteration, and therefore the persisted file,
/// is ordered by domain and stable across reloads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ZoneMap {
    entries: BTreeMap<String, ZoneMapEntry>,
}

impl ZoneMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find(&self, domain: &str) -> Option<&ZoneMapEntry> {
        self.entries.get(domain)
    }

    /// Insert a new entry or overwrite a differing one in place
    pub fn upsert(&mut self, entry: ZoneMapEntry) -> Result<UpsertOutcome> {
        entry.validate()?;

        match self.entries.get_mut(&entry.domain) {
            Some(existing) if *existing == entry => Ok(UpsertOutcome::Unchanged),
            Some(existing) => {
                *existing = entry;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                self.entries.insert(entry.domain.clone(), entry);
                Ok(UpsertOutcome::Inserted)
            }
        }
    }

    pub fn remove(&mut self, domain: &str) -> Option<ZoneMapEntry> {
        self.entries.remove(domain)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneMapEntry> {
        self.entries.values()
    }

    /// Serialize to the zone-map file format
    pub fn render(&self) -> String {
        codec::render(self)
    }

    /// Parse the zone-map file format, skipping unusable lines
    pub fn parse(text: &str) -> ParsedZoneMap {
        codec::parse(text)
    }

    /// Parse raw file contents; lines that are not valid UTF-8 are skipped
    pub fn parse_bytes(bytes: &[u8]) -> ParsedZoneMap {
        codec::parse_bytes(bytes)
    }
}
