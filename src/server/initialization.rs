// src/server/initialization.rs

//! Handles exporter initialization: the shared HTTP client, the metrics registry,
//! the pull endpoint listener and the initial topology discovery.

use super::context::ExporterContext;
use crate::config::Config;
use crate::core::http::{HttpGet, RestClient};
use crate::core::metrics::MetricsRecorder;
use crate::core::topology::resolve_slots;
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes every component before the background tasks start.
pub async fn setup(config: Config) -> Result<ExporterContext> {
    log_startup_info(&config);
    let (shutdown_tx, _) = broadcast::channel(1);

    let http: Arc<dyn HttpGet> = Arc::new(
        RestClient::new(config.http_timeout, config.accept_invalid_certs)
            .context("Failed to build the HTTP client")?,
    );
    let recorder =
        Arc::new(MetricsRecorder::new().context("Failed to register Prometheus metrics")?);

    // Bind before discovery so a busy port fails fast.
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("Failed to bind metrics endpoint on {}", config.listen))?;
    info!(
        "Prometheus metrics endpoint listening on http://{}/metrics",
        config.listen
    );

    let slots = resolve_slots(&config.clusters, config.topology_settings(), &http).await;
    let discovered = slots.iter().filter(|slot| slot.monitor.is_some()).count();
    if discovered < slots.len() {
        warn!(
            "{} of {} cluster(s) could not be discovered at startup; retrying on topology renewal.",
            slots.len() - discovered,
            slots.len()
        );
    }

    Ok(ExporterContext {
        config,
        recorder,
        http,
        slots,
        listener: Some(listener),
        shutdown_tx,
        background_tasks: JoinSet::new(),
    })
}

fn log_startup_info(config: &Config) {
    info!("Starting N1QL exporter v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Monitoring {} cluster(s) over {} (query port {}, admin port {}).",
        config.clusters.len(),
        config.scheme,
        config.query_port,
        config.admin_port
    );
    for cluster in &config.clusters {
        info!(
            "Cluster {} seeded by {:?}",
            cluster.name, cluster.seed_hosts
        );
    }
}
