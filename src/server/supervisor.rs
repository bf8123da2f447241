// src/server/supervisor.rs

//! Waits for a termination signal or a failing task, then shuts everything down.

use super::context::ExporterContext;
use anyhow::{Context, Result};
use std::time::Duration;
use tokio::signal::unix::{SignalKind, signal};
use tracing::{error, info, warn};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

pub async fn run(mut ctx: ExporterContext) -> Result<()> {
    let mut sigint =
        signal(SignalKind::interrupt()).context("Failed to register SIGINT handler")?;
    let mut sigterm =
        signal(SignalKind::terminate()).context("Failed to register SIGTERM handler")?;

    let mut failure = None;
    tokio::select! {
        biased;

        _ = sigint.recv() => info!("SIGINT received, initiating graceful shutdown."),
        _ = sigterm.recv() => info!("SIGTERM received, initiating graceful shutdown."),

        Some(res) = ctx.background_tasks.join_next() => match res {
            Ok(Ok(())) => warn!("A background task finished unexpectedly. Shutting down."),
            Ok(Err(e)) => {
                error!("Background task failed: {:#}. Shutting down.", e);
                failure = Some(e);
            }
            Err(e) => error!("Background task panicked: {e:?}. Shutting down."),
        },
    }

    info!("Sending shutdown signal to all tasks.");
    if ctx.shutdown_tx.send(()).is_err() {
        warn!("No task was listening for the shutdown signal.");
    }

    // A scrape in flight finishes before the loop sees the signal.
    let drain = async { while ctx.background_tasks.join_next().await.is_some() {} };
    if tokio::time::timeout(SHUTDOWN_GRACE, drain).await.is_err() {
        warn!(
            "Background tasks did not stop within {:?}; aborting them.",
            SHUTDOWN_GRACE
        );
        ctx.background_tasks.shutdown().await;
    }

    info!("Exporter shutdown complete.");
    match failure {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
