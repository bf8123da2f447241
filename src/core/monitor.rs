// src/core/monitor.rs

//! The per-cluster monitor: fans a scrape out to every query node, joins the
//! results into one snapshot and advances the cluster's completed-query watermark.

use super::http::{Credentials, HttpGet, Scheme, base_url};
use super::model::ClusterSnapshot;
use super::scrape::{ScrapeBaseline, scrape_node};
use super::timefmt::DateLayout;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// Whether the next scrape bootstraps the watermark or counts incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeMode {
    /// No scrape has completed yet; every completed query on a node is emitted once.
    First,
    /// Only completed queries newer than the stored watermark are emitted.
    Steady,
}

/// The mutable accounting owned by a monitor.
///
/// The watermark never regresses and the counter only grows. Both change solely
/// through [`ScrapeState::complete_scrape`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScrapeState {
    watermark: Option<DateTime<Utc>>,
    scrape_count: u64,
}

impl ScrapeState {
    /// Restores a previously observed state.
    pub fn new(watermark: Option<DateTime<Utc>>, scrape_count: u64) -> Self {
        Self {
            watermark,
            scrape_count,
        }
    }

    pub fn watermark(&self) -> Option<DateTime<Utc>> {
        self.watermark
    }

    pub fn scrape_count(&self) -> u64 {
        self.scrape_count
    }

    pub fn mode(&self) -> ScrapeMode {
        if self.scrape_count == 0 {
            ScrapeMode::First
        } else {
            ScrapeMode::Steady
        }
    }

    /// The baseline every node of the next scrape filters against.
    pub fn baseline(&self, now: DateTime<Utc>) -> ScrapeBaseline {
        match self.mode() {
            ScrapeMode::First => ScrapeBaseline {
                watermark: now,
                is_first_scrape: true,
            },
            ScrapeMode::Steady => ScrapeBaseline {
                watermark: self.watermark.unwrap_or(DateTime::<Utc>::MIN_UTC),
                is_first_scrape: false,
            },
        }
    }

    /// Folds the per-node watermarks of a finished scrape into the state.
    pub fn complete_scrape(&mut self, node_watermarks: impl IntoIterator<Item = DateTime<Utc>>) {
        if let Some(candidate) = node_watermarks.into_iter().max()
            && self.watermark.is_none_or(|current| candidate > current)
        {
            self.watermark = Some(candidate);
        }
        self.scrape_count += 1;
    }
}

/// The immutable description of what a monitor scrapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorTarget {
    pub cluster_name: String,
    /// Query node host names, without port.
    pub nodes: Vec<String>,
    pub credentials: Credentials,
    pub scheme: Scheme,
    pub query_port: u16,
    pub layout: DateLayout,
}

impl MonitorTarget {
    /// The query service base URL of `node`.
    pub fn node_url(&self, node: &str) -> String {
        base_url(self.scheme, node, self.query_port)
    }
}

/// One monitor per configured cluster.
pub struct ClusterMonitor {
    target: Arc<MonitorTarget>,
    state: ScrapeState,
    http: Arc<dyn HttpGet>,
}

impl fmt::Debug for ClusterMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClusterMonitor")
            .field("target", &self.target)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl ClusterMonitor {
    pub fn new(target: MonitorTarget, http: Arc<dyn HttpGet>) -> Self {
        Self::with_state(target, ScrapeState::default(), http)
    }

    pub fn with_state(target: MonitorTarget, state: ScrapeState, http: Arc<dyn HttpGet>) -> Self {
        Self {
            target: Arc::new(target),
            state,
            http,
        }
    }

    pub fn cluster_name(&self) -> &str {
        &self.target.cluster_name
    }

    pub fn nodes(&self) -> &[String] {
        &self.target.nodes
    }

    pub fn target(&self) -> &MonitorTarget {
        &self.target
    }

    pub fn state(&self) -> &ScrapeState {
        &self.state
    }

    /// Swaps the node list for the next scrape, leaving the accounting untouched.
    pub fn replace_nodes(&mut self, nodes: Vec<String>) {
        let mut target = (*self.target).clone();
        target.nodes = nodes;
        self.target = Arc::new(target);
    }

    /// Scrapes every node concurrently and returns the joined snapshot.
    ///
    /// A monitor without nodes returns an empty snapshot without any network call
    /// and without counting a scrape.
    pub async fn execute(&mut self) -> ClusterSnapshot {
        let target_ref = Arc::clone(&self.target);
        let target: &MonitorTarget = &target_ref;

        if target.nodes.is_empty() {
            info!(
                "Skipping monitor for cluster {} since it has no query nodes",
                target.cluster_name
            );
            return ClusterSnapshot::empty(target.cluster_name.clone());
        }

        let baseline = self.state.baseline(Utc::now());
        debug!(
            "Collecting metrics from cluster {} ({} nodes, mode {:?})",
            target.cluster_name,
            target.nodes.len(),
            self.state.mode()
        );

        let http = Arc::clone(&self.http);
        let http: &dyn HttpGet = http.as_ref();
        let scrapes = target.nodes.iter().map(|node| {
            let node_url = target.node_url(node);
            async move {
                scrape_node(
                    http,
                    node,
                    &node_url,
                    &target.credentials,
                    baseline,
                    target.layout,
                )
                .await
            }
        });
        let nodes = join_all(scrapes).await;

        self.state
            .complete_scrape(nodes.iter().map(|snapshot| snapshot.watermark));

        ClusterSnapshot {
            cluster_name: target.cluster_name.clone(),
            nodes,
        }
    }
}
