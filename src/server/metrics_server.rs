// src/server/metrics_server.rs

use crate::core::metrics::MetricsRecorder;
use anyhow::Context;
use axum::{Router, http::StatusCode, response::IntoResponse, routing::get};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{error, info};

/// Handles HTTP requests to the /metrics endpoint.
async fn metrics_handler(recorder: Arc<MetricsRecorder>) -> impl IntoResponse {
    match recorder.gather() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            body,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                e.to_string(),
            )
        }
    }
}

/// Builds the router that exposes the recorder on `/metrics`.
pub fn router(recorder: Arc<MetricsRecorder>) -> Router {
    Router::new().route("/metrics", get(move || metrics_handler(recorder.clone())))
}

/// Serves the pull endpoint on an already bound listener until shutdown.
pub async fn run_metrics_server(
    listener: TcpListener,
    recorder: Arc<MetricsRecorder>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> anyhow::Result<()> {
    axum::serve(listener, router(recorder))
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
            info!("Metrics server shutting down.");
        })
        .await
        .context("Metrics server failed")
}
