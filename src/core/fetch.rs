// src/core/fetch.rs

//! The three per-node endpoint fetchers. Each issues one authenticated GET and
//! degrades to an empty or zero value when the response cannot be decoded.

use super::dedup::{CompletedBatch, dedup_completed};
use super::errors::ExporterError;
use super::http::{Credentials, HttpGet};
use super::model::{ActiveQuery, RawActiveRequest, RawCompletedRequest, Vitals};
use super::timefmt::DateLayout;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use tracing::warn;

pub const ACTIVE_REQUESTS_PATH: &str = "/admin/active_requests";
pub const COMPLETED_REQUESTS_PATH: &str = "/admin/completed_requests";
pub const VITALS_PATH: &str = "/admin/vitals";

/// Fetches the node's in-flight queries. Any failure yields an empty list.
pub async fn fetch_active_queries(
    http: &dyn HttpGet,
    node_url: &str,
    credentials: &Credentials,
) -> Vec<ActiveQuery> {
    let url = format!("{node_url}{ACTIVE_REQUESTS_PATH}");
    let body = http.get(&url, credentials).await;
    match decode::<Option<Vec<RawActiveRequest>>>(&body) {
        Ok(raw) => raw
            .unwrap_or_default()
            .into_iter()
            .map(ActiveQuery::from)
            .collect(),
        Err(e) => {
            warn!("Error getting active queries from {}: {}", url, e);
            Vec::new()
        }
    }
}

/// Fetches the node's completed queries and keeps only those newer than `watermark`.
///
/// On failure the batch is empty and the watermark is returned unchanged.
pub async fn fetch_completed_queries(
    http: &dyn HttpGet,
    node_url: &str,
    credentials: &Credentials,
    watermark: DateTime<Utc>,
    is_first_scrape: bool,
    layout: DateLayout,
) -> CompletedBatch {
    let url = format!("{node_url}{COMPLETED_REQUESTS_PATH}");
    let body = http.get(&url, credentials).await;
    match decode::<Option<Vec<RawCompletedRequest>>>(&body) {
        Ok(raw) => dedup_completed(raw.unwrap_or_default(), watermark, is_first_scrape, layout),
        Err(e) => {
            warn!("Error getting completed queries from {}: {}", url, e);
            CompletedBatch {
                watermark,
                queries: Vec::new(),
            }
        }
    }
}

/// Fetches the node's vitals. Any failure yields a zero-valued record.
pub async fn fetch_vitals(http: &dyn HttpGet, node_url: &str, credentials: &Credentials) -> Vitals {
    let url = format!("{node_url}{VITALS_PATH}");
    let body = http.get(&url, credentials).await;
    match decode::<Vitals>(&body) {
        Ok(vitals) => vitals,
        Err(e) => {
            warn!("Error getting vitals from {}: {}", url, e);
            Vitals::default()
        }
    }
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ExporterError> {
    if body.is_empty() {
        return Err(ExporterError::Decode("empty response body".to_string()));
    }
    Ok(serde_json::from_slice(body)?)
}
