//! Core traits for cfsync
//!
//! - [`Transport`]: send one authenticated request to the provider API
//! - [`ZoneMapStore`]: persistent domain → zone/record cache

pub mod transport;
pub mod zone_map_store;

pub use transport::{Method, RawResponse, Transport};
pub use zone_map_store::ZoneMapStore;
