// src/server/spawner.rs

//! Spawns the exporter's long-running background tasks.

use super::context::ExporterContext;
use super::metrics_server;
use crate::core::tasks::poller::ScrapeLoop;
use anyhow::anyhow;

/// Spawns the pull endpoint and the scrape loop into the context's JoinSet.
pub fn spawn_all(ctx: &mut ExporterContext) -> anyhow::Result<()> {
    let shutdown_tx = &ctx.shutdown_tx;
    let background_tasks = &mut ctx.background_tasks;

    // --- Metrics Server ---
    let listener = ctx
        .listener
        .take()
        .ok_or_else(|| anyhow!("metrics listener was already handed to a task"))?;
    let recorder = ctx.recorder.clone();
    let shutdown_rx_metrics = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        metrics_server::run_metrics_server(listener, recorder, shutdown_rx_metrics).await
    });

    // --- Scrape Loop ---
    let scrape_loop = ScrapeLoop::new(
        std::mem::take(&mut ctx.slots),
        ctx.recorder.clone(),
        ctx.http.clone(),
        ctx.config.topology_settings(),
        ctx.config.poll_interval,
        ctx.config.renew_every,
    );
    let shutdown_rx_poller = shutdown_tx.subscribe();
    background_tasks.spawn(async move {
        scrape_loop.run(shutdown_rx_poller).await;
        Ok(())
    });

    Ok(())
}
