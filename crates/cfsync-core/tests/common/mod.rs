//! Test doubles and common utilities for contract tests
//!
//! `FakeCloudflare` is an in-process stand-in for the provider API. It
//! answers through the real `Transport` seam with real envelope JSON, keeps
//! zones and records in memory, and logs every call so tests can count
//! GETs and mutations.

#![allow(dead_code)]

use async_trait::async_trait;
use cfsync_core::error::{Error, Result};
use cfsync_core::traits::{Method, RawResponse, Transport, ZoneMapStore};
use cfsync_core::types::{RemoteRecord, Zone};
use cfsync_core::{ProviderApi, SyncEngine};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

/// One request seen by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
}

#[derive(Default)]
struct FakeState {
    zones: Vec<Zone>,
    records: BTreeMap<String, Vec<RemoteRecord>>,
    calls: Vec<Call>,
    /// Paths answered with a 200 that is not JSON
    malformed: HashSet<String>,
    /// Paths that fail as if the network were down
    unreachable: HashSet<String>,
    /// Paths answered with a provider-side 500
    server_errors: HashSet<String>,
    /// Answer record creation with a validation error
    reject_creates: bool,
    next_id: usize,
}

/// Clones share state, so one clone can go into the engine while the test
/// keeps another for assertions.
#[derive(Clone, Default)]
pub struct FakeCloudflare {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloudflare {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_zone(self, id: &str, name: &str) -> Self {
        self.state.lock().unwrap().zones.push(Zone {
            id: id.to_string(),
            name: name.to_string(),
            status: Some("active".to_string()),
        });
        self
    }

    pub fn with_record(
        self,
        zone_id: &str,
        id: &str,
        record_type: &str,
        name: &str,
        content: &str,
        proxied: bool,
    ) -> Self {
        self.state
            .lock()
            .unwrap()
            .records
            .entry(zone_id.to_string())
            .or_default()
            .push(RemoteRecord {
                id: id.to_string(),
                record_type: record_type.to_string(),
                name: name.to_string(),
                content: content.to_string(),
                ttl: 1,
                proxied,
            });
        self
    }

    pub fn malformed_at(self, path: &str) -> Self {
        self.state.lock().unwrap().malformed.insert(path.to_string());
        self
    }

    pub fn unreachable_at(self, path: &str) -> Self {
        self.state.lock().unwrap().unreachable.insert(path.to_string());
        self
    }

    pub fn server_error_at(self, path: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .server_errors
            .insert(path.to_string());
        self
    }

    pub fn rejecting_creates(self) -> Self {
        self.state.lock().unwrap().reject_creates = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    pub fn mutation_count(&self) -> usize {
        self.calls().iter().filter(|c| c.method.is_mutating()).count()
    }

    /// Methods in call order, for ordering assertions
    pub fn methods(&self) -> Vec<Method> {
        self.calls().iter().map(|c| c.method).collect()
    }

    pub fn records(&self, zone_id: &str) -> Vec<RemoteRecord> {
        self.state
            .lock()
            .unwrap()
            .records
            .get(zone_id)
            .cloned()
            .unwrap_or_default()
    }

    fn ok(result: Value) -> RawResponse {
        let count = result.as_array().map(|a| a.len()).unwrap_or(1);
        let body = json!({
            "success": true,
            "errors": [],
            "messages": [],
            "result": result,
            "result_info": { "page": 1, "per_page": 100, "count": count, "total_count": count, "total_pages": 1 }
        });
        RawResponse::new(200, body.to_string())
    }

    fn error(status: u16, code: i64, message: &str) -> RawResponse {
        let body = json!({
            "success": false,
            "errors": [{ "code": code, "message": message }],
            "messages": [],
            "result": null
        });
        RawResponse::new(status, body.to_string())
    }

    fn query_value<'a>(query: &'a [(String, String)], key: &str) -> Option<&'a str> {
        query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
impl Transport for FakeCloudflare {
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&Value>,
    ) -> Result<RawResponse> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            path: path.to_string(),
            query: query.to_vec(),
        });

        if state.unreachable.contains(path) {
            return Err(Error::transport(format!("connection refused: {}", path)));
        }
        if state.malformed.contains(path) {
            return Ok(RawResponse::new(200, "<html>502 Bad Gateway</html>"));
        }
        if state.server_errors.contains(path) {
            return Ok(Self::error(500, 10000, "Internal error"));
        }

        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let response = match (method, segments.as_slice()) {
            (Method::Get, ["zones"]) => Self::ok(json!(state.zones)),

            (Method::Get, ["zones", zone_id, "dns_records"]) => {
                let record_type = Self::query_value(query, "type");
                let name = Self::query_value(query, "name");
                let listed: Vec<&RemoteRecord> = state
                    .records
                    .get(*zone_id)
                    .map(|records| {
                        records
                            .iter()
                            .filter(|r| {
                                record_type.is_none_or(|t| r.record_type.eq_ignore_ascii_case(t))
                            })
                            .filter(|r| name.is_none_or(|n| r.name == n))
                            .collect()
                    })
                    .unwrap_or_default();
                Self::ok(json!(listed))
            }

            (Method::Post, ["zones", _zone_id, "dns_records"]) if state.reject_creates => {
                Self::error(400, 9005, "Content for A record is invalid.")
            }

            (Method::Post, ["zones", zone_id, "dns_records"]) => {
                let body = body.cloned().unwrap_or(Value::Null);
                state.next_id += 1;
                let record = RemoteRecord {
                    id: format!("new-{}", state.next_id),
                    record_type: body["type"].as_str().unwrap_or_default().to_string(),
                    name: body["name"].as_str().unwrap_or_default().to_string(),
                    content: body["content"].as_str().unwrap_or_default().to_string(),
                    ttl: body["ttl"].as_u64().unwrap_or(1) as u32,
                    proxied: body["proxied"].as_bool().unwrap_or(false),
                };
                let zone_id = zone_id.to_string();
                state.records.entry(zone_id).or_default().push(record.clone());
                Self::ok(json!(record))
            }

            (Method::Delete, ["zones", zone_id, "dns_records", record_id]) => {
                let records = state.records.entry(zone_id.to_string()).or_default();
                match records.iter().position(|r| r.id == *record_id) {
                    Some(idx) => {
                        records.remove(idx);
                        Self::ok(json!({ "id": record_id }))
                    }
                    None => Self::error(404, 81044, "Record does not exist."),
                }
            }

            (Method::Post, ["zones", _zone_id, "purge_cache"]) => {
                Self::ok(json!({ "id": "purge" }))
            }

            _ => Self::error(404, 7003, "Could not route to the requested path"),
        };

        Ok(response)
    }
}

/// Engine wired to `fake` and `store`
pub fn engine_with(
    fake: &FakeCloudflare,
    store: impl ZoneMapStore + 'static,
    dry_run: bool,
) -> SyncEngine {
    SyncEngine::new(
        ProviderApi::new(Box::new(fake.clone())),
        Box::new(store),
        dry_run,
    )
}
