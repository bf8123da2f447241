// src/core/model.rs

//! Wire payloads of the query service's admin endpoints and the transient records
//! derived from them for one scrape.

use super::classifier::classify_query;
use super::timefmt::{DateLayout, INVALID_DURATION, parse_duration_millis};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::warn;

/// One entry of `/admin/active_requests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawActiveRequest {
    #[serde(default)]
    pub elapsed_time: String,
    #[serde(default)]
    pub execution_time: String,
    #[serde(default)]
    pub scan_consistency: String,
    #[serde(default)]
    pub statement: String,
}

/// Per-phase operator counters reported for a completed request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PhaseCounters {
    #[serde(rename = "IndexScan", default)]
    pub index_scan: i64,
    #[serde(rename = "Fetch", default)]
    pub fetch: i64,
    #[serde(rename = "PrimaryScan", default)]
    pub primary_scan: i64,
    #[serde(rename = "Sort", default)]
    pub sort: i64,
}

/// One entry of `/admin/completed_requests`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompletedRequest {
    #[serde(default)]
    pub elapsed_time: String,
    #[serde(default)]
    pub service_time: String,
    #[serde(default)]
    pub error_count: i64,
    #[serde(default)]
    pub phase_counts: Option<PhaseCounters>,
    #[serde(default)]
    pub phase_operators: Option<PhaseCounters>,
    #[serde(default)]
    pub request_time: String,
    #[serde(default)]
    pub result_count: i64,
    #[serde(default)]
    pub result_size: i64,
    #[serde(default)]
    pub statement: String,
    #[serde(default)]
    pub state: String,
}

/// The `/admin/vitals` summary of a query node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct Vitals {
    /// The node's own completed-request counter, independent of deduplication.
    #[serde(rename = "request.completed.count", default)]
    pub completed_count: i64,
    #[serde(rename = "cpu.user.percent", default)]
    pub cpu_user: f64,
    #[serde(rename = "cpu.sys.percent", default)]
    pub cpu_system: f64,
}

/// An in-flight query observed during one scrape. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveQuery {
    pub elapsed_ms: i64,
    pub execution_ms: i64,
    pub waiting_ms: i64,
    pub scan_consistency: String,
    pub query_type: String,
}

impl From<RawActiveRequest> for ActiveQuery {
    fn from(raw: RawActiveRequest) -> Self {
        let elapsed_ms = parse_duration_millis(&raw.elapsed_time);
        let execution_ms = parse_duration_millis(&raw.execution_time);
        Self {
            elapsed_ms,
            execution_ms,
            waiting_ms: waiting_time(elapsed_ms, execution_ms),
            scan_consistency: raw.scan_consistency,
            query_type: classify_query(&raw.statement),
        }
    }
}

/// A completed query. The raw statement is not retained, only its derived type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedQuery {
    pub elapsed_ms: i64,
    pub execution_ms: i64,
    pub waiting_ms: i64,
    pub query_type: String,
    pub result_count: i64,
    pub result_size: i64,
    pub error_count: i64,
    pub phase_counts: PhaseCounters,
    pub phase_operators: PhaseCounters,
    pub state: String,
    /// `None` when `requestTime` was absent or did not match the cluster's layout.
    pub request_time: Option<DateTime<Utc>>,
}

impl CompletedQuery {
    /// Derives the record from its wire form, parsing `requestTime` with `layout`.
    pub fn from_raw(raw: RawCompletedRequest, layout: DateLayout) -> Self {
        let elapsed_ms = parse_duration_millis(&raw.elapsed_time);
        let execution_ms = parse_duration_millis(&raw.service_time);

        let request_time = if raw.request_time.is_empty() {
            None
        } else {
            let parsed = layout.parse(&raw.request_time);
            if parsed.is_none() {
                warn!(
                    "Could not parse request time '{}' with layout {:?}",
                    raw.request_time, layout
                );
            }
            parsed
        };

        Self {
            elapsed_ms,
            execution_ms,
            waiting_ms: waiting_time(elapsed_ms, execution_ms),
            query_type: classify_query(&raw.statement),
            result_count: raw.result_count,
            result_size: raw.result_size,
            error_count: raw.error_count,
            phase_counts: raw.phase_counts.unwrap_or_default(),
            phase_operators: raw.phase_operators.unwrap_or_default(),
            state: raw.state,
            request_time,
        }
    }

    /// True when the plan scanned a primary index in any phase.
    pub fn used_primary_index(&self) -> bool {
        self.phase_counts.primary_scan > 0 || self.phase_operators.primary_scan > 0
    }
}

fn waiting_time(elapsed_ms: i64, execution_ms: i64) -> i64 {
    if elapsed_ms == INVALID_DURATION || execution_ms == INVALID_DURATION {
        INVALID_DURATION
    } else {
        elapsed_ms - execution_ms
    }
}

/// Everything scraped from a single query node in one cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// The node address this record was scraped from.
    pub node: String,
    pub active: Vec<ActiveQuery>,
    /// Only the completed queries not counted by a previous scrape.
    pub completed: Vec<CompletedQuery>,
    pub vitals: Vitals,
    /// The node's candidate for the next cluster watermark.
    pub watermark: DateTime<Utc>,
}

/// The result of one `ClusterMonitor::execute` call.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSnapshot {
    pub cluster_name: String,
    pub nodes: Vec<NodeSnapshot>,
}

impl ClusterSnapshot {
    pub fn empty(cluster_name: impl Into<String>) -> Self {
        Self {
            cluster_name: cluster_name.into(),
            nodes: Vec::new(),
        }
    }
}
