// tests/integration/fixtures.rs

//! Common test fixtures: a scripted `HttpGet` and builders for the JSON documents
//! served by query nodes and the cluster manager.
//!
//! Not every test crate uses every fixture.
#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, TimeZone, Utc};
use n1ql_exporter::core::http::{Credentials, HttpGet, Scheme};
use n1ql_exporter::core::monitor::MonitorTarget;
use n1ql_exporter::core::timefmt::DateLayout;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Mutex;

pub const CLUSTER: &str = "PROD";
pub const QUERY_PORT: u16 = 8093;
pub const ADMIN_PORT: u16 = 8091;

pub fn credentials() -> Credentials {
    Credentials::new("admin", "secret")
}

/// `http://{host}:8093`
pub fn node_url(host: &str) -> String {
    format!("http://{host}:{QUERY_PORT}")
}

/// `http://{host}:8091`
pub fn admin_url(host: &str) -> String {
    format!("http://{host}:{ADMIN_PORT}")
}

pub fn target(nodes: &[&str]) -> MonitorTarget {
    MonitorTarget {
        cluster_name: CLUSTER.to_string(),
        nodes: nodes.iter().map(|n| n.to_string()).collect(),
        credentials: credentials(),
        scheme: Scheme::Http,
        query_port: QUERY_PORT,
        layout: DateLayout::Rfc3339Nano,
    }
}

/// 2018-05-10 17:35:00 UTC plus `secs` seconds.
pub fn at(secs: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2018, 5, 10, 17, 35, 0).unwrap() + chrono::Duration::seconds(secs)
}

/// [`at`] formatted the way 6.x+ servers report `requestTime`.
pub fn rfc_time(secs: i64) -> String {
    at(secs).to_rfc3339_opts(chrono::SecondsFormat::Nanos, true)
}

/// [`at`] formatted the way 5.x servers report `requestTime`.
pub fn legacy_time(secs: i64) -> String {
    format!("{} +0000 UTC", at(secs).format("%Y-%m-%d %H:%M:%S%.9f"))
}

pub fn active_request(statement: &str, elapsed: &str, execution: &str) -> Value {
    json!({
        "elapsedTime": elapsed,
        "executionTime": execution,
        "scanConsistency": "unbounded",
        "statement": statement,
    })
}

pub fn completed_request(statement: &str, request_time: &str) -> Value {
    json!({
        "elapsedTime": "12.5ms",
        "serviceTime": "10.25ms",
        "errorCount": 0,
        "phaseCounts": { "IndexScan": 4, "Fetch": 4 },
        "phaseOperators": { "IndexScan": 1, "Fetch": 1 },
        "requestTime": request_time,
        "resultCount": 4,
        "resultSize": 512,
        "statement": statement,
        "state": "completed",
    })
}

pub fn vitals(completed: i64, cpu_user: f64, cpu_sys: f64) -> Value {
    json!({
        "uptime": "1h2m3s",
        "request.completed.count": completed,
        "cpu.user.percent": cpu_user,
        "cpu.sys.percent": cpu_sys,
    })
}

/// A `/pools/default` document. `nodes` holds `(hostname, services)` pairs.
pub fn pools_default(name: &str, version: &str, nodes: &[(&str, &[&str])]) -> Value {
    let nodes: Vec<Value> = nodes
        .iter()
        .map(|(hostname, services)| {
            json!({
                "hostname": hostname,
                "services": services,
                "version": version,
                "status": "healthy",
            })
        })
        .collect();
    json!({ "name": name, "nodes": nodes })
}

/// An `HttpGet` serving canned bodies per URL. Unknown URLs answer with an empty
/// body, which is what the production client returns on any failure.
#[derive(Default)]
pub struct FakeHttp {
    responses: Mutex<HashMap<String, Bytes>>,
    requests: Mutex<Vec<(String, Credentials)>>,
}

impl FakeHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: impl Into<String>, body: impl Into<Bytes>) {
        self.responses.lock().unwrap().insert(url.into(), body.into());
    }

    pub fn respond_json(&self, url: impl Into<String>, body: &Value) {
        self.respond(url, body.to_string());
    }

    pub fn forget(&self, url: &str) {
        self.responses.lock().unwrap().remove(url);
    }

    /// Serves all three query endpoints of `host`.
    pub fn serve_node(&self, host: &str, active: Vec<Value>, completed: Vec<Value>, vitals: Value) {
        let base = node_url(host);
        self.respond_json(format!("{base}/admin/active_requests"), &Value::Array(active));
        self.respond_json(
            format!("{base}/admin/completed_requests"),
            &Value::Array(completed),
        );
        self.respond_json(format!("{base}/admin/vitals"), &vitals);
    }

    /// Serves `/pools/default` on the admin port of `host`.
    pub fn serve_pools(&self, host: &str, body: &Value) {
        self.respond_json(format!("{}/pools/default", admin_url(host)), body);
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn credentials_seen(&self) -> Vec<Credentials> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(_, creds)| creds.clone())
            .collect()
    }
}

#[async_trait]
impl HttpGet for FakeHttp {
    async fn get(&self, url: &str, credentials: &Credentials) -> Bytes {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), credentials.clone()));
        self.responses
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .unwrap_or_default()
    }
}
