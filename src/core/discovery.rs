// src/core/discovery.rs

//! Resolves which hosts of a cluster run which services, from the cluster manager's
//! `/pools/default` document.

use super::errors::ExporterError;
use super::http::{Credentials, HttpGet};
use serde::Deserialize;
use tracing::info;

pub const POOLS_DEFAULT_PATH: &str = "/pools/default";

const QUERY_SERVICE: &str = "n1ql";
const DATA_SERVICE: &str = "kv";
const INDEX_SERVICE: &str = "index";

/// A summary of a cluster's membership by role. Nodes may appear under several roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterMap {
    /// The pool name reported by the cluster manager.
    pub name: String,
    pub query_nodes: Vec<String>,
    pub index_nodes: Vec<String>,
    pub data_nodes: Vec<String>,
    pub total_nodes: usize,
    /// The server version string of the cluster, e.g. `6.6.0-7909-enterprise`.
    pub version: String,
}

#[derive(Debug, Deserialize)]
struct PoolsDefaultResponse {
    #[serde(default)]
    name: String,
    #[serde(default)]
    nodes: Vec<PoolNode>,
}

#[derive(Debug, Deserialize)]
struct PoolNode {
    hostname: String,
    #[serde(default)]
    services: Vec<String>,
    #[serde(default)]
    version: String,
}

/// Fetches `{base_url}/pools/default` and buckets its nodes by service.
///
/// `base_url` is `scheme://host:admin_port`; the same `:admin_port` suffix is stripped
/// from every reported node host name.
pub async fn discover_cluster(
    http: &dyn HttpGet,
    base_url: &str,
    admin_port: u16,
    credentials: &Credentials,
) -> Result<ClusterMap, ExporterError> {
    info!("Looking for nodes of cluster at {}", base_url);
    let url = format!("{base_url}{POOLS_DEFAULT_PATH}");
    let body = http.get(&url, credentials).await;
    if body.is_empty() {
        return Err(ExporterError::Discovery(format!("no response from {url}")));
    }

    let response: PoolsDefaultResponse = serde_json::from_slice(&body)
        .map_err(|e| ExporterError::Discovery(format!("invalid response from {url}: {e}")))?;

    Ok(build_cluster_map(response, admin_port))
}

fn build_cluster_map(response: PoolsDefaultResponse, admin_port: u16) -> ClusterMap {
    let port_suffix = format!(":{admin_port}");
    let mut map = ClusterMap {
        name: response.name,
        total_nodes: response.nodes.len(),
        ..ClusterMap::default()
    };

    for node in response.nodes {
        let host = node
            .hostname
            .strip_suffix(port_suffix.as_str())
            .unwrap_or(&node.hostname)
            .to_string();
        for service in &node.services {
            match service.as_str() {
                QUERY_SERVICE => map.query_nodes.push(host.clone()),
                DATA_SERVICE => map.data_nodes.push(host.clone()),
                INDEX_SERVICE => map.index_nodes.push(host.clone()),
                _ => {}
            }
        }
        if !node.version.is_empty() {
            map.version = node.version;
        }
    }

    map
}
