// src/core/topology.rs

//! Builds cluster monitors from discovered topology and merges periodic
//! re-discoveries into live monitors without losing their dedup state.

use super::discovery::discover_cluster;
use super::http::{Credentials, HttpGet, Scheme, base_url};
use super::monitor::{ClusterMonitor, MonitorTarget};
use super::timefmt::DateLayout;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{error, info, warn};

/// A configured cluster: its display name, the hosts used to discover it and the
/// credentials used for every call to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterDefinition {
    pub name: String,
    pub seed_hosts: Vec<String>,
    pub credentials: Credentials,
}

/// Settings shared by every cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologySettings {
    pub scheme: Scheme,
    pub admin_port: u16,
    pub query_port: u16,
}

/// A configured cluster and its monitor, if discovery has succeeded at least once.
#[derive(Debug)]
pub struct MonitorSlot {
    pub definition: ClusterDefinition,
    pub monitor: Option<ClusterMonitor>,
}

/// What a renewal did to one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenewalOutcome {
    /// The freshly discovered monitor replaced the slot's contents.
    Adopted,
    /// Only the node list changed; watermark and scrape count were kept.
    NodesReplaced,
    /// The discovered monitor belongs to another cluster; nothing changed.
    NameMismatch,
    /// Discovery failed; nothing changed.
    Unchanged,
}

/// Discovers `definition` through its seed hosts, in order, and builds a fresh monitor
/// for its query nodes. Returns `None` when no seed host answers.
pub async fn build_monitor(
    definition: &ClusterDefinition,
    settings: TopologySettings,
    http: &Arc<dyn HttpGet>,
) -> Option<ClusterMonitor> {
    for seed in &definition.seed_hosts {
        let admin_url = base_url(settings.scheme, seed, settings.admin_port);
        match discover_cluster(
            http.as_ref(),
            &admin_url,
            settings.admin_port,
            &definition.credentials,
        )
        .await
        {
            Ok(map) => {
                info!(
                    "Registering monitor {} (version {}) for hosts: {:?}",
                    definition.name, map.version, map.query_nodes
                );
                let target = MonitorTarget {
                    cluster_name: definition.name.clone(),
                    nodes: map.query_nodes,
                    credentials: definition.credentials.clone(),
                    scheme: settings.scheme,
                    query_port: settings.query_port,
                    layout: DateLayout::from_version(&map.version),
                };
                return Some(ClusterMonitor::new(target, Arc::clone(http)));
            }
            Err(e) => warn!(
                "Cannot discover cluster {} through {}: {}",
                definition.name, seed, e
            ),
        }
    }

    error!(
        "Cannot discover cluster {}: none of its {} seed host(s) answered",
        definition.name,
        definition.seed_hosts.len()
    );
    None
}

/// Discovers every configured cluster concurrently and returns one slot per definition,
/// in definition order.
pub async fn resolve_slots(
    definitions: &[ClusterDefinition],
    settings: TopologySettings,
    http: &Arc<dyn HttpGet>,
) -> Vec<MonitorSlot> {
    let monitors = join_all(
        definitions
            .iter()
            .map(|definition| build_monitor(definition, settings, http)),
    )
    .await;

    definitions
        .iter()
        .cloned()
        .zip(monitors)
        .map(|(definition, monitor)| MonitorSlot {
            definition,
            monitor,
        })
        .collect()
}

/// Merges a freshly discovered monitor into a slot.
///
/// An unset slot, or a monitor with no name or no nodes, adopts `fresh` wholesale.
/// Otherwise only the node list is replaced, so the watermark and scrape count
/// survive membership changes.
///
/// [`renew_slots`] always builds `fresh` from the slot's own definition, so the
/// names match there. A `fresh` monitor for a different cluster, which only a
/// direct caller can pass, leaves the slot untouched.
pub fn merge_monitor(slot: &mut Option<ClusterMonitor>, fresh: ClusterMonitor) -> RenewalOutcome {
    match slot {
        Some(existing)
            if !existing.cluster_name().is_empty() && !existing.nodes().is_empty() =>
        {
            if existing.cluster_name() != fresh.cluster_name() {
                warn!(
                    "Discovered cluster {} does not match monitor {}; keeping the monitor",
                    fresh.cluster_name(),
                    existing.cluster_name()
                );
                return RenewalOutcome::NameMismatch;
            }
            info!(
                "Renewing nodes for {}: {:?}",
                existing.cluster_name(),
                fresh.nodes()
            );
            existing.replace_nodes(fresh.nodes().to_vec());
            RenewalOutcome::NodesReplaced
        }
        _ => {
            info!("Adopting freshly discovered monitor {}", fresh.cluster_name());
            *slot = Some(fresh);
            RenewalOutcome::Adopted
        }
    }
}

/// Re-discovers every slot's cluster and merges the results.
///
/// Discovery runs concurrently; merges are applied afterwards, one slot at a time.
/// A slot whose discovery fails is left untouched.
pub async fn renew_slots(
    slots: &mut [MonitorSlot],
    settings: TopologySettings,
    http: &Arc<dyn HttpGet>,
) -> Vec<RenewalOutcome> {
    let discovered = join_all(
        slots
            .iter()
            .map(|slot| build_monitor(&slot.definition, settings, http)),
    )
    .await;

    slots
        .iter_mut()
        .zip(discovered)
        .map(|(slot, fresh)| match fresh {
            Some(fresh) => merge_monitor(&mut slot.monitor, fresh),
            None => {
                warn!(
                    "Keeping the current topology of {} until discovery succeeds",
                    slot.definition.name
                );
                RenewalOutcome::Unchanged
            }
        })
        .collect()
}
