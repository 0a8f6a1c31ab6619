//! Provider API client
//!
//! Turns the Cloudflare v4 endpoints into typed calls on top of a
//! [`Transport`]. This is where response bodies are interpreted: every
//! answer is expected in the provider's envelope
//!
//! ```json
//! { "success": true, "errors": [], "result": ..., "result_info": { "page": 1, "total_pages": 1 } }
//! ```
//!
//! and anything that does not parse as such is reported as
//! [`Error::MalformedResponse`], never as a transport failure.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::traits::{Method, RawResponse, Transport};
use crate::types::{NewRecord, RecordFilter, RemoteRecord, Zone};

/// Page size requested when listing zones
pub const ZONES_PER_PAGE: u32 = 50;

/// Page size requested when listing DNS records
pub const RECORDS_PER_PAGE: u32 = 100;

/// Upper bound on pages followed for a single listing
const MAX_PAGES: u32 = 1000;

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default = "Option::default")]
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct ResultInfo {
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "first_page")]
    total_pages: u32,
}

fn first_page() -> u32 {
    1
}

#[derive(Debug, Serialize)]
struct PurgeRequest {
    purge_everything: bool,
}

fn join_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no error details".to_string();
    }
    errors
        .iter()
        .map(|e| format!("{} (code {})", e.message, e.code))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Typed client for the provider endpoints cfsync consumes
pub struct ProviderApi {
    transport: Box<dyn Transport>,
}

impl ProviderApi {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `GET /zones`, all pages
    pub async fn list_zones(&self) -> Result<Vec<Zone>> {
        self.get_all("/zones", Vec::new(), ZONES_PER_PAGE).await
    }

    /// `GET /zones/{zone_id}/dns_records[?type=&name=]`, all pages
    pub async fn list_records(
        &self,
        zone_id: &str,
        filter: Option<&RecordFilter>,
    ) -> Result<Vec<RemoteRecord>> {
        let mut query = Vec::new();
        if let Some(filter) = filter {
            if let Some(record_type) = &filter.record_type {
                query.push(("type".to_string(), record_type.clone()));
            }
            if let Some(name) = &filter.name {
                query.push(("name".to_string(), name.clone()));
            }
        }

        let path = format!("/zones/{}/dns_records", zone_id);
        self.get_all(&path, query, RECORDS_PER_PAGE).await
    }

    /// `POST /zones/{zone_id}/dns_records`
    pub async fn create_record(&self, zone_id: &str, record: &NewRecord) -> Result<RemoteRecord> {
        let path = format!("/zones/{}/dns_records", zone_id);
        let body = serde_json::to_value(record)?;

        let (result, _) = self
            .send::<RemoteRecord>(Method::Post, &path, &[], Some(&body))
            .await?;
        result.ok_or_else(|| {
            Error::malformed(format!("POST {}: response has no created record", path))
        })
    }

    /// `DELETE /zones/{zone_id}/dns_records/{record_id}`
    pub async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);
        self.send::<serde_json::Value>(Method::Delete, &path, &[], None)
            .await?;
        Ok(())
    }

    /// `POST /zones/{zone_id}/purge_cache` with `{"purge_everything": true}`
    pub async fn purge_cache(&self, zone_id: &str) -> Result<()> {
        let path = format!("/zones/{}/purge_cache", zone_id);
        let body = serde_json::to_value(PurgeRequest {
            purge_everything: true,
        })?;
        self.send::<serde_json::Value>(Method::Post, &path, &[], Some(&body))
            .await?;
        Ok(())
    }

    /// Follow `result_info.total_pages` until every page is collected
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        base_query: Vec<(String, String)>,
        per_page: u32,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            let mut query = base_query.clone();
            query.push(("page".to_string(), page.to_string()));
            query.push(("per_page".to_string(), per_page.to_string()));

            let (result, info) = self.send::<Vec<T>>(Method::Get, path, &query, None).await?;
            let batch = result.ok_or_else(|| {
                Error::malformed(format!("GET {}: response has no result array", path))
            })?;
            let batch_len = batch.len();
            items.extend(batch);

            let Some(info) = info else { break };
            if info.total_pages <= info.page.max(page) || batch_len == 0 {
                break;
            }
            if page >= MAX_PAGES {
                tracing::warn!("GET {}: stopping after {} pages", path, MAX_PAGES);
                break;
            }
            page += 1;
        }

        tracing::debug!("GET {}: {} item(s)", path, items.len());
        Ok(items)
    }

    /// Send one request and unwrap the envelope
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
    ) -> Result<(Option<T>, Option<ResultInfo>)> {
        tracing::debug!("{} {}", method, path);
        let response = self.transport.request(method, path, query, body).await?;

        if !response.is_success() {
            return Err(Self::status_error(method, path, &response));
        }

        let envelope: Envelope<T> = serde_json::from_str(&response.body).map_err(|e| {
            Error::malformed(format!("{} {}: {}", method, path, e))
        })?;

        if !envelope.success {
            return Err(Error::api(response.status, join_messages(&envelope.errors)));
        }

        Ok((envelope.result, envelope.result_info))
    }

    /// Map a non-2xx answer to an error, keeping provider messages if any
    fn status_error(method: Method, path: &str, response: &RawResponse) -> Error {
        let details = serde_json::from_str::<Envelope<serde_json::Value>>(&response.body)
            .map(|envelope| join_messages(&envelope.errors))
            .unwrap_or_else(|_| "unreadable error body".to_string());

        match response.status {
            401 | 403 => Error::auth(format!(
                "{} {}: invalid API token or insufficient permissions (status {}): {}",
                method, path, response.status, details
            )),
            404 => Error::not_found(format!("{} {}: {}", method, path, details)),
            429 => Error::rate_limited(format!("{} {}: {}", method, path, details)),
            status => Error::api(status, format!("{} {}: {}", method, path, details)),
        }
    }
}
