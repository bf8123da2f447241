// src/core/tasks/poller.rs

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::broadcast;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::core::http::HttpGet;
use crate::core::metrics::MetricsRecorder;
use crate::core::model::ClusterSnapshot;
use crate::core::topology::{MonitorSlot, RenewalOutcome, TopologySettings, renew_slots};

/// The driving background task: scrapes every cluster once per tick, hands the
/// snapshots to the recorder, and renews topology every `renew_every` cycles.
pub struct ScrapeLoop {
    slots: Vec<MonitorSlot>,
    recorder: Arc<MetricsRecorder>,
    http: Arc<dyn HttpGet>,
    settings: TopologySettings,
    poll_interval: Duration,
    renew_every: u32,
    cycles: u64,
}

impl ScrapeLoop {
    pub fn new(
        slots: Vec<MonitorSlot>,
        recorder: Arc<MetricsRecorder>,
        http: Arc<dyn HttpGet>,
        settings: TopologySettings,
        poll_interval: Duration,
        renew_every: u32,
    ) -> Self {
        Self {
            slots,
            recorder,
            http,
            settings,
            poll_interval,
            renew_every: renew_every.max(1),
            cycles: 0,
        }
    }

    pub fn slots(&self) -> &[MonitorSlot] {
        &self.slots
    }

    /// Number of completed polling cycles.
    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    /// Runs until a shutdown signal arrives. The signal is only observed between
    /// cycles, so an in-flight scrape always finishes and is recorded.
    pub async fn run(mut self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(
            "Scrape loop started for {} cluster(s). Interval: {:?}, renewing topology every {} cycles.",
            self.slots.len(),
            self.poll_interval,
            self.renew_every
        );
        let mut interval = tokio::time::interval(self.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    self.run_cycle().await;
                }
                _ = shutdown_rx.recv() => {
                    info!("Scrape loop shutting down after {} cycles.", self.cycles);
                    return;
                }
            }
        }
    }

    /// Performs one polling cycle and returns the snapshots it recorded.
    pub async fn run_cycle(&mut self) -> Vec<ClusterSnapshot> {
        let scrapes = self
            .slots
            .iter_mut()
            .filter_map(|slot| slot.monitor.as_mut())
            .map(|monitor| async move {
                let started = Instant::now();
                let snapshot = monitor.execute().await;
                (snapshot, started.elapsed())
            });
        let results = join_all(scrapes).await;

        let mut snapshots = Vec::with_capacity(results.len());
        for (snapshot, elapsed) in results {
            debug!(
                "Cluster {} scraped in {:?} ({} nodes)",
                snapshot.cluster_name,
                elapsed,
                snapshot.nodes.len()
            );
            self.recorder.record(&snapshot);
            self.recorder
                .observe_scrape_duration(&snapshot.cluster_name, elapsed);
            snapshots.push(snapshot);
        }

        self.cycles += 1;
        if self.cycles % u64::from(self.renew_every) == 0 {
            self.renew().await;
        }
        snapshots
    }

    async fn renew(&mut self) {
        info!("Renewing cluster topology (cycle {})", self.cycles);
        let outcomes = renew_slots(&mut self.slots, self.settings, &self.http).await;
        let unchanged = outcomes
            .iter()
            .filter(|outcome| **outcome == RenewalOutcome::Unchanged)
            .count();
        debug!(
            "Topology renewal finished: {} of {} cluster(s) could not be re-discovered",
            unchanged,
            outcomes.len()
        );
    }
}
