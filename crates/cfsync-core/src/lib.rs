// # cfsync-core
//
// Core library for the cfsync Cloudflare DNS client.
//
// ## Architecture Overview
//
// - **Transport**: Trait for issuing authenticated HTTP requests to the provider
// - **ProviderApi**: Typed endpoints on top of a Transport; owns envelope parsing
// - **ZoneMapStore**: Trait for the local domain → zone/record cache
// - **SyncEngine**: Reconciliation, discovery and the one-shot operations
//
// ## Design Principles
//
// 1. **Provider is the source of truth**: the zone map is a cache and may be lost at any time
// 2. **Library-First**: the binary only parses arguments and prints results
// 3. **Idempotency**: reconciling the same desired state twice mutates nothing the second time

pub mod api;
pub mod config;
pub mod engine;
pub mod error;
pub mod store;
pub mod traits;
pub mod types;
pub mod zonemap;

// Re-export core types for convenience
pub use api::ProviderApi;
pub use config::{Config, ConfigOverrides, FileSettings};
pub use engine::{DiscoveryReport, ReconcileAction, ReconcileOutcome, SyncEngine};
pub use error::{Error, Result};
pub use store::{FileZoneMapStore, MemoryZoneMapStore};
pub use traits::{Method, RawResponse, Transport, ZoneMapStore};
pub use types::{DesiredRecord, RecordFilter, RemoteRecord, Zone};
pub use zonemap::{UpsertOutcome, ZoneMap, ZoneMapEntry};
