// tests/property/monitor_test.rs

//! Monitor-level properties over sequences of scrapes.

use crate::fixtures::{FakeHttp, completed_request, node_url, rfc_time, target, vitals};
use n1ql_exporter::core::http::HttpGet;
use n1ql_exporter::core::monitor::ClusterMonitor;
use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 50,
        ..ProptestConfig::default()
    })]

    /// Every generated batch is the full history a node has ever completed, which
    /// only grows between scrapes. Across all scrapes each query is emitted once.
    #[test]
    fn test_each_completed_query_is_emitted_once(
        batches in prop::collection::vec(prop::collection::vec(1i64..10, 1..5), 1..8),
    ) {
        tokio_test::block_on(async {
            let http = Arc::new(FakeHttp::new());
            let http_dyn: Arc<dyn HttpGet> = http.clone();
            let mut monitor = ClusterMonitor::new(target(&["n1"]), http_dyn);

            let mut history: Vec<Value> = Vec::new();
            let mut clock = 0i64;
            let mut emitted = Vec::new();
            let mut previous_watermark = None;

            for batch in &batches {
                for step in batch {
                    clock += step;
                    history.push(completed_request(&format!("SELECT {clock}"), &rfc_time(clock)));
                }
                http.serve_node("n1", vec![], history.clone(), vitals(0, 0.0, 0.0));

                let snapshot = monitor.execute().await;
                for query in &snapshot.nodes[0].completed {
                    emitted.push(query.request_time);
                }

                let watermark = monitor.state().watermark();
                prop_assert!(watermark >= previous_watermark);
                previous_watermark = watermark;
            }

            let unique: BTreeSet<_> = emitted.iter().collect();
            prop_assert_eq!(unique.len(), emitted.len());
            prop_assert_eq!(emitted.len(), history.len());
            prop_assert_eq!(monitor.state().scrape_count(), batches.len() as u64);
            prop_assert!(http.requested_urls().iter().all(|u| u.starts_with(&node_url("n1"))));
            Ok(())
        })?;
    }
}
