// src/server/context.rs

use crate::config::Config;
use crate::core::http::HttpGet;
use crate::core::metrics::MetricsRecorder;
use crate::core::topology::MonitorSlot;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

/// Holds everything initialized before the background tasks are spawned.
pub struct ExporterContext {
    pub config: Config,
    pub recorder: Arc<MetricsRecorder>,
    pub http: Arc<dyn HttpGet>,
    /// Moved into the scrape loop by the spawner.
    pub slots: Vec<MonitorSlot>,
    /// Moved into the metrics server by the spawner.
    pub listener: Option<TcpListener>,
    pub shutdown_tx: broadcast::Sender<()>,
    pub background_tasks: JoinSet<Result<(), anyhow::Error>>,
}
