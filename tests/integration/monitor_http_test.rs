// tests/integration/monitor_http_test.rs

//! Monitors scraping a real HTTP query node through `RestClient`.

use super::fixtures::{CLUSTER, active_request, completed_request, credentials, rfc_time};
use super::test_helpers::MockQueryNode;
use n1ql_exporter::core::http::{HttpGet, RestClient, Scheme};
use n1ql_exporter::core::model::Vitals;
use n1ql_exporter::core::monitor::{ClusterMonitor, MonitorTarget};
use n1ql_exporter::core::timefmt::DateLayout;
use n1ql_exporter::core::topology::{ClusterDefinition, TopologySettings, build_monitor};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

// base64("admin:secret")
const EXPECTED_AUTH: &str = "Basic YWRtaW46c2VjcmV0";

fn rest_client() -> Arc<dyn HttpGet> {
    Arc::new(RestClient::new(Duration::from_secs(2), false).unwrap())
}

fn monitor_for(node: &MockQueryNode) -> ClusterMonitor {
    let target = MonitorTarget {
        cluster_name: CLUSTER.to_string(),
        nodes: vec![node.host()],
        credentials: credentials(),
        scheme: Scheme::Http,
        query_port: node.port(),
        layout: DateLayout::Rfc3339Nano,
    };
    ClusterMonitor::new(target, rest_client())
}

#[tokio::test]
async fn test_completed_queries_are_counted_exactly_once() {
    let node = MockQueryNode::start().await;
    node.set_completed(vec![
        completed_request("SELECT 1", &rfc_time(1)),
        completed_request("SELECT 2", &rfc_time(2)),
    ]);
    let mut monitor = monitor_for(&node);

    let first = monitor.execute().await;
    assert_eq!(first.nodes[0].completed.len(), 2);

    let second = monitor.execute().await;
    assert!(second.nodes[0].completed.is_empty());

    node.push_completed(completed_request("UPDATE b SET x = 1", &rfc_time(3)));
    let third = monitor.execute().await;
    assert_eq!(third.nodes[0].completed.len(), 1);
    assert_eq!(third.nodes[0].completed[0].query_type, "UPDATE");
    assert_eq!(monitor.state().scrape_count(), 3);
}

#[tokio::test]
async fn test_basic_auth_is_sent_on_every_request() {
    let node = MockQueryNode::start().await;
    node.set_active(vec![active_request("SELECT 1", "1s", "900ms")]);
    let mut monitor = monitor_for(&node);

    let snapshot = monitor.execute().await;

    assert_eq!(snapshot.nodes[0].active.len(), 1);
    assert_eq!(snapshot.nodes[0].active[0].waiting_ms, 100);
    let headers = node.authorization_headers();
    assert_eq!(headers.len(), 3);
    assert!(headers.iter().all(|h| h == EXPECTED_AUTH));
}

#[tokio::test]
async fn test_non_200_response_degrades_to_zero_vitals() {
    let node = MockQueryNode::start().await;
    node.set_vitals(json!({ "request.completed.count": 9, "cpu.user.percent": 1.0 }));
    node.set_completed(vec![completed_request("SELECT 1", &rfc_time(1))]);
    node.fail_vitals();
    let mut monitor = monitor_for(&node);

    let snapshot = monitor.execute().await;

    assert_eq!(snapshot.nodes[0].vitals, Vitals::default());
    assert_eq!(snapshot.nodes[0].completed.len(), 1);
}

#[tokio::test]
async fn test_unreachable_node_yields_empty_record() {
    // Reserve a port, then free it so nothing listens there.
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let target = MonitorTarget {
        cluster_name: CLUSTER.to_string(),
        nodes: vec!["127.0.0.1".to_string()],
        credentials: credentials(),
        scheme: Scheme::Http,
        query_port: port,
        layout: DateLayout::Rfc3339Nano,
    };
    let mut monitor = ClusterMonitor::new(target, rest_client());

    let snapshot = monitor.execute().await;

    assert_eq!(snapshot.nodes.len(), 1);
    assert!(snapshot.nodes[0].active.is_empty());
    assert!(snapshot.nodes[0].completed.is_empty());
    assert_eq!(monitor.state().scrape_count(), 1);
}

#[tokio::test]
async fn test_monitor_built_from_discovery() {
    let node = MockQueryNode::start().await;
    node.set_completed(vec![completed_request("SELECT 1", &rfc_time(1))]);
    let definition = ClusterDefinition {
        name: CLUSTER.to_string(),
        seed_hosts: vec!["unreachable.invalid".to_string(), node.host()],
        credentials: credentials(),
    };
    let settings = TopologySettings {
        scheme: Scheme::Http,
        admin_port: node.port(),
        query_port: node.port(),
    };

    let mut monitor = build_monitor(&definition, settings, &rest_client())
        .await
        .unwrap();

    assert_eq!(monitor.nodes(), [node.host()]);
    assert_eq!(monitor.target().layout, DateLayout::Rfc3339Nano);
    let snapshot = monitor.execute().await;
    assert_eq!(snapshot.nodes[0].node, node.host());
    assert_eq!(snapshot.nodes[0].completed.len(), 1);
}
