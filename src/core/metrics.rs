// src/core/metrics.rs

//! Prometheus metrics recorded from cluster snapshots.
//!
//! The recorder owns a private registry, so it is built once at startup and shared
//! by reference with the poller and the pull endpoint.

use super::errors::ExporterError;
use super::model::ClusterSnapshot;
use prometheus::{
    CounterVec, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
    exponential_buckets,
};
use std::time::Duration;

const ACCUMULATION_BUCKETS: &[f64] = &[
    0.0, 10.0, 20.0, 50.0, 100.0, 250.0, 1000.0, 5000.0, 10000.0,
];
const RESULT_COUNT_BUCKETS: &[f64] = &[
    0.0, 10.0, 20.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 5000.0, 10000.0, 100000.0, 500000.0,
    1000000.0,
];

/// The exporter's metric families and the registry they are exposed from.
#[derive(Clone)]
pub struct MetricsRecorder {
    registry: Registry,

    // --- Active queries ---
    active_execution_time: HistogramVec,
    active_waiting_time: HistogramVec,
    active_accumulation: HistogramVec,
    active_scan_consistency: CounterVec,

    // --- Completed queries ---
    completed_result_count: HistogramVec,
    completed_result_size: HistogramVec,
    completed_execution_time: HistogramVec,
    completed_waiting_time: HistogramVec,
    completed_primary_index_use: CounterVec,

    // --- Vitals ---
    vitals_completed: GaugeVec,
    vitals_cpu: GaugeVec,

    // --- Exporter self-observation ---
    scrape_duration: HistogramVec,
    monitored_nodes: GaugeVec,
}

impl MetricsRecorder {
    /// Creates every metric family and registers it in a fresh registry.
    pub fn new() -> Result<Self, ExporterError> {
        let registry = Registry::new();
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let duration_buckets = exponential_buckets(1.0, 2.0, 17)?;

        let active_execution_time = histogram(
            &registry,
            "n1ql_active_time_execution",
            "N1QL Current queries execution time",
            duration_buckets.clone(),
            &["cluster", "node", "query_type"],
        )?;
        let active_accumulation = histogram(
            &registry,
            "n1ql_active_accumulated_queries",
            "N1QL Current queries in execution",
            ACCUMULATION_BUCKETS.to_vec(),
            &["cluster", "node"],
        )?;
        let active_waiting_time = histogram(
            &registry,
            "n1ql_active_time_waiting",
            "N1QL Current queries waiting time",
            duration_buckets.clone(),
            &["cluster", "node", "query_type"],
        )?;
        let active_scan_consistency = counter(
            &registry,
            "n1ql_active_consistency",
            "N1QL Current queries by scan consistency",
            &["cluster", "consistency"],
        )?;

        let completed_result_count = histogram(
            &registry,
            "n1ql_completed_result_count",
            "N1QL Number of results per query",
            RESULT_COUNT_BUCKETS.to_vec(),
            &["cluster", "query_type"],
        )?;
        let completed_result_size = histogram(
            &registry,
            "n1ql_completed_result_size",
            "N1QL Response size in bytes",
            exponential_buckets(200.0, 2.5, 15)?,
            &["cluster", "query_type"],
        )?;
        let completed_execution_time = histogram(
            &registry,
            "n1ql_completed_time_execution",
            "N1QL Completed queries execution time",
            duration_buckets.clone(),
            &["cluster", "node", "query_type", "state"],
        )?;
        let completed_waiting_time = histogram(
            &registry,
            "n1ql_completed_time_waiting",
            "N1QL Completed queries waiting time",
            duration_buckets,
            &["cluster", "node", "query_type"],
        )?;
        let completed_primary_index_use = counter(
            &registry,
            "n1ql_completed_primaryindex",
            "N1QL Completed queries that scanned a primary index",
            &["cluster", "query_type"],
        )?;

        let vitals_completed = gauge(
            &registry,
            "n1ql_vitals_completed_queries",
            "N1QL completed queries from vitals",
            &["cluster", "node"],
        )?;
        let vitals_cpu = gauge(
            &registry,
            "n1ql_vitals_cpu_usage",
            "N1QL CPU usage for user/system",
            &["cluster", "node", "space"],
        )?;

        let scrape_duration = histogram(
            &registry,
            "n1ql_exporter_scrape_duration_seconds",
            "Time taken to scrape every query node of a cluster",
            prometheus::DEFAULT_BUCKETS.to_vec(),
            &["cluster"],
        )?;
        let monitored_nodes = gauge(
            &registry,
            "n1ql_exporter_monitored_nodes",
            "Number of query nodes scraped for a cluster",
            &["cluster"],
        )?;

        Ok(Self {
            registry,
            active_execution_time,
            active_waiting_time,
            active_accumulation,
            active_scan_consistency,
            completed_result_count,
            completed_result_size,
            completed_execution_time,
            completed_waiting_time,
            completed_primary_index_use,
            vitals_completed,
            vitals_cpu,
            scrape_duration,
            monitored_nodes,
        })
    }

    /// Records one cluster snapshot. Negative (unparseable) durations are skipped.
    pub fn record(&self, snapshot: &ClusterSnapshot) {
        let cluster = snapshot.cluster_name.as_str();
        self.monitored_nodes
            .with_label_values(&[cluster])
            .set(snapshot.nodes.len() as f64);

        for node_snapshot in &snapshot.nodes {
            let node = node_snapshot.node.as_str();

            for query in &node_snapshot.active {
                let query_type = query.query_type.as_str();
                observe_duration(
                    &self.active_execution_time,
                    &[cluster, node, query_type],
                    query.execution_ms,
                );
                observe_duration(
                    &self.active_waiting_time,
                    &[cluster, node, query_type],
                    query.waiting_ms,
                );
                self.active_scan_consistency
                    .with_label_values(&[cluster, query.scan_consistency.as_str()])
                    .inc();
            }
            self.active_accumulation
                .with_label_values(&[cluster, node])
                .observe(node_snapshot.active.len() as f64);

            for query in &node_snapshot.completed {
                let query_type = query.query_type.as_str();
                self.completed_result_count
                    .with_label_values(&[cluster, query_type])
                    .observe(query.result_count as f64);
                self.completed_result_size
                    .with_label_values(&[cluster, query_type])
                    .observe(query.result_size as f64);
                observe_duration(
                    &self.completed_execution_time,
                    &[cluster, node, query_type, query.state.as_str()],
                    query.execution_ms,
                );
                observe_duration(
                    &self.completed_waiting_time,
                    &[cluster, node, query_type],
                    query.waiting_ms,
                );
                if query.used_primary_index() {
                    self.completed_primary_index_use
                        .with_label_values(&[cluster, query_type])
                        .inc();
                }
            }

            let vitals = &node_snapshot.vitals;
            self.vitals_completed
                .with_label_values(&[cluster, node])
                .set(vitals.completed_count as f64);
            self.vitals_cpu
                .with_label_values(&[cluster, node, "user"])
                .set(vitals.cpu_user);
            self.vitals_cpu
                .with_label_values(&[cluster, node, "system"])
                .set(vitals.cpu_system);
        }
    }

    /// Records how long a full cluster scrape took.
    pub fn observe_scrape_duration(&self, cluster: &str, elapsed: Duration) {
        self.scrape_duration
            .with_label_values(&[cluster])
            .observe(elapsed.as_secs_f64());
    }

    /// Encodes every registered metric in the Prometheus text format.
    pub fn gather(&self) -> Result<String, ExporterError> {
        let encoder = TextEncoder::new();
        Ok(encoder.encode_to_string(&self.registry.gather())?)
    }
}

fn observe_duration(histogram: &HistogramVec, labels: &[&str], millis: i64) {
    if millis >= 0 {
        histogram.with_label_values(labels).observe(millis as f64);
    }
}

fn histogram(
    registry: &Registry,
    name: &str,
    help: &str,
    buckets: Vec<f64>,
    labels: &[&str],
) -> Result<HistogramVec, ExporterError> {
    let vec = HistogramVec::new(HistogramOpts::new(name, help).buckets(buckets), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn counter(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<CounterVec, ExporterError> {
    let vec = CounterVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}

fn gauge(
    registry: &Registry,
    name: &str,
    help: &str,
    labels: &[&str],
) -> Result<GaugeVec, ExporterError> {
    let vec = GaugeVec::new(Opts::new(name, help), labels)?;
    registry.register(Box::new(vec.clone()))?;
    Ok(vec)
}
