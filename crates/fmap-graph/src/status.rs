//! Status aggregation: one health pulse per node.
//!
//! A pure pass over the built graph. Each node's pulse is derived from
//! its type-specific rule plus, for container-bearing workloads, the
//! per-cluster pod readiness table. Results land in a [`StatusMap`]
//! side-table keyed by node id; the nodes themselves are never touched,
//! so recomputing with the same inputs always yields the same map.
//!
//! Rule precedence when more than one rule fires for a node: type
//! overrides (application/rules/subscription) are authoritative for
//! their types; for everything else the pod-readiness verdict and the
//! generic per-cluster placement verdict combine by severity
//! (`Red > Yellow > Orange > Green`).

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde_json::Value;
use tracing::debug;

use fmap_model::{Node, NodeId, NodeSpecs, NodeStatus, NodeType, Pulse, ReplicaCounts, StatusIcon};

/// Derived status per node id.
pub type StatusMap = FxHashMap<NodeId, NodeStatus>;

/// Whether this node's template declares containers, i.e. deploys pods.
#[must_use]
pub fn must_have_pods(node: &Node) -> bool {
    node.has_container_template()
}

/// Compute the status of every node in the graph.
#[must_use]
pub fn status_map(nodes: &[Node]) -> StatusMap {
    let map: StatusMap = nodes
        .iter()
        .map(|node| (node.id.clone(), compute_status(node)))
        .collect();
    debug!(nodes = map.len(), "status aggregation complete");
    map
}

/// Compute the status of a single node.
#[must_use]
pub fn compute_status(node: &Node) -> NodeStatus {
    let mut pod_status_by_cluster = BTreeMap::new();
    let pods_pulse = must_have_pods(node)
        .then(|| pod_readiness_pulse(node, &mut pod_status_by_cluster));

    let pulse = match &node.node_type {
        NodeType::Package => pods_pulse.unwrap_or(Pulse::Green),
        NodeType::Application => {
            if application_channels(node).is_empty() {
                Pulse::Red
            } else {
                pods_pulse.unwrap_or(Pulse::Green)
            }
        }
        NodeType::Rules => {
            if matches!(
                node.specs,
                NodeSpecs::Rules {
                    has_decisions: true,
                    ..
                }
            ) {
                Pulse::Green
            } else {
                Pulse::Red
            }
        }
        NodeType::Subscription => subscription_pulse(node),
        _ => {
            let generic = generic_pulse(node);
            match pods_pulse {
                Some(pods) => pods.worst(generic),
                None => generic,
            }
        }
    };

    let (icon, icon_reason) = status_icon(node);
    NodeStatus {
        pulse,
        icon,
        icon_reason,
        pod_status_by_cluster,
    }
}

fn application_channels(node: &Node) -> &[String] {
    match &node.specs {
        NodeSpecs::Application { channels, .. } => channels,
        _ => &[],
    }
}

fn resource_name(node: &Node) -> &str {
    node.specs
        .raw()
        .and_then(|raw| raw.pointer("/metadata/name"))
        .and_then(Value::as_str)
        .unwrap_or("")
}

/// Per-cluster readiness for container-bearing nodes.
///
/// Ready counts come from the deployed resource record when it publishes
/// them; otherwise the node sits between the resource and its pods (an
/// intermediate object), so `Running` pods on that cluster are counted
/// from the pod model instead. A cluster with no record at all counts as
/// zero ready.
fn pod_readiness_pulse(node: &Node, table: &mut BTreeMap<String, ReplicaCounts>) -> Pulse {
    let Some(resource_model) = node.specs.resource_model() else {
        return Pulse::Orange;
    };
    if resource_model.is_empty() {
        return Pulse::Orange;
    }

    let desired = node
        .specs
        .raw()
        .and_then(|raw| raw.pointer("/spec/replicas"))
        .and_then(Value::as_u64)
        .map(|n| n as u32)
        .unwrap_or(0);
    let name = resource_name(node);

    let mut pulse = Pulse::Green;
    for cluster in node.id.cluster_names() {
        let counts = match resource_model.get(&format!("{name}-{cluster}")) {
            Some(record) if record.ready.is_some() => ReplicaCounts {
                available: record.available.unwrap_or(0),
                current: record.current.unwrap_or(0),
                desired: record.desired.unwrap_or(desired),
                ready: record.ready.unwrap_or(0),
            },
            Some(_) => {
                let ready = node
                    .specs
                    .pod_model()
                    .map(|pods| {
                        pods.values()
                            .filter(|pod| {
                                cluster.contains(pod.cluster.as_str())
                                    && pod.status == "Running"
                            })
                            .count() as u32
                    })
                    .unwrap_or(0);
                ReplicaCounts {
                    available: 0,
                    current: 0,
                    desired,
                    ready,
                }
            }
            None => ReplicaCounts {
                available: 0,
                current: 0,
                desired,
                ready: 0,
            },
        };
        if counts.is_short() {
            pulse = pulse.worst(Pulse::Yellow);
        }
        table.insert(cluster, counts);
    }
    pulse
}

/// Subscription rule: red on any failed target, yellow when partially
/// placed, orange when the deploy reports were never fetched.
fn subscription_pulse(node: &Node) -> Pulse {
    let NodeSpecs::Subscription {
        subscription_model, ..
    } = &node.specs
    else {
        return Pulse::Orange;
    };
    if subscription_model.is_empty() {
        return Pulse::Orange;
    }

    let mut pulse = Pulse::Green;
    let mut placed = false;
    for report in subscription_model.values() {
        if report.status.contains("Failed") {
            pulse = Pulse::Red;
        }
        if report.status == "Subscribed" {
            placed = true;
        }
        if report.status != "Subscribed" && report.status != "Propagated" && pulse != Pulse::Red {
            pulse = Pulse::Yellow;
        }
    }
    if pulse == Pulse::Green && !placed {
        pulse = Pulse::Yellow;
    }
    pulse
}

/// Generic workload rule: orange when the per-kind resource map was never
/// built, yellow when any target cluster is missing its entry.
fn generic_pulse(node: &Node) -> Pulse {
    let Some(resource_model) = node.specs.resource_model() else {
        return Pulse::Orange;
    };
    if resource_model.is_empty() {
        return Pulse::Orange;
    }

    let name = resource_name(node);
    let mut pulse = Pulse::Green;
    for cluster in node.id.cluster_names() {
        if !resource_model.contains_key(&format!("{name}-{cluster}")) {
            pulse = Pulse::Yellow;
        }
    }
    pulse
}

/// Icon summarizing nested resource state, with an optional reason
/// tooltip for failures.
fn status_icon(node: &Node) -> (Option<StatusIcon>, Option<String>) {
    if node.node_type == NodeType::Pod {
        let Some(pods) = node.specs.pod_model().filter(|pods| !pods.is_empty()) else {
            return (Some(StatusIcon::Warning), None);
        };
        let mut any_pending = false;
        let mut any_failure = false;
        for pod in pods.values() {
            match pod.status.to_lowercase().as_str() {
                "running" | "succeeded" => {}
                "pending" => any_pending = true,
                _ => any_failure = true,
            }
        }
        let icon = if any_failure {
            StatusIcon::Error
        } else if any_pending {
            StatusIcon::Pending
        } else {
            StatusIcon::Success
        };
        return (Some(icon), None);
    }

    match &node.status {
        Some(status) if status.eq_ignore_ascii_case("completed") => {
            (Some(StatusIcon::Success), None)
        }
        Some(_) => (Some(StatusIcon::Error), node.reason.clone()),
        None => (None, None),
    }
}
