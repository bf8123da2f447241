// src/core/scrape.rs

//! Scrapes one query node by running its three endpoint fetchers concurrently.

use super::fetch::{fetch_active_queries, fetch_completed_queries, fetch_vitals};
use super::http::{Credentials, HttpGet};
use super::model::NodeSnapshot;
use super::timefmt::DateLayout;
use chrono::{DateTime, Utc};

/// The dedup baseline shared by every node of one cluster scrape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeBaseline {
    pub watermark: DateTime<Utc>,
    pub is_first_scrape: bool,
}

/// Runs the active, completed and vitals fetchers for `node` concurrently and merges
/// them into one record. A failing fetcher only empties its own section.
pub async fn scrape_node(
    http: &dyn HttpGet,
    node: &str,
    node_url: &str,
    credentials: &Credentials,
    baseline: ScrapeBaseline,
    layout: DateLayout,
) -> NodeSnapshot {
    let (active, completed, vitals) = tokio::join!(
        fetch_active_queries(http, node_url, credentials),
        fetch_completed_queries(
            http,
            node_url,
            credentials,
            baseline.watermark,
            baseline.is_first_scrape,
            layout,
        ),
        fetch_vitals(http, node_url, credentials),
    );

    NodeSnapshot {
        node: node.to_string(),
        active,
        completed: completed.queries,
        vitals,
        watermark: completed.watermark,
    }
}
