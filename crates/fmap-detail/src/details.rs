//! Detail record projection: the selection panel's row list.

use chrono::{DateTime, Utc};
use serde_json::Value;

use fmap_model::{Node, NodeSpecs, NodeStatus, NodeType, Pulse};

use crate::text::age;
use crate::{DetailRow, LabelRow, LinkAction};

/// Pod phases surfaced as errors in the detail panel.
const POD_ERROR_STATES: [&str; 5] = [
    "CrashLoopBackOff",
    "ImageLoopBackOff",
    "Error",
    "InvalidImageName",
    "OOMKilled",
];

/// Project a node into its ordered detail rows: resource type, the
/// type-specific block, resource labels, and action links.
///
/// Deploy-status tables are a separate projection
/// ([`deploy_status_rows`]); callers compose the two.
#[must_use]
pub fn node_details(node: &Node, status: &NodeStatus, now: DateTime<Utc>) -> Vec<DetailRow> {
    let mut details = vec![DetailRow::Label(LabelRow::keyed(
        "resource.type",
        node.node_type.as_str(),
    ))];

    match &node.node_type {
        NodeType::Application => {
            push_yaml_block(
                &mut details,
                "resource.selector",
                raw_pointer(node, "/spec/selector"),
            );
        }
        NodeType::Subscription => {
            if let Some(channel) = raw_pointer(node, "/spec/channel").and_then(Value::as_str) {
                details.push(DetailRow::Label(LabelRow::keyed("resource.channel", channel)));
            }
            push_yaml_block(
                &mut details,
                "resource.placement",
                raw_pointer(node, "/spec/placement"),
            );
        }
        NodeType::Rules => {
            if let Some(replicas) =
                raw_pointer(node, "/spec/clusterReplicas").and_then(Value::as_u64)
            {
                details.push(DetailRow::Label(LabelRow::keyed(
                    "resource.replicas",
                    replicas.to_string(),
                )));
            }
            push_yaml_block(
                &mut details,
                "resource.cluster.labels",
                raw_pointer(node, "/spec/clusterLabels"),
            );
        }
        NodeType::Pod => push_pod_rows(&mut details, node, now),
        _ => {
            details.push(DetailRow::Label(LabelRow::keyed("resource.name", &node.name)));
            if let Some(namespace) = &node.namespace {
                details.push(DetailRow::Label(LabelRow::keyed(
                    "resource.namespace",
                    namespace,
                )));
            }
        }
    }

    push_label_rows(&mut details, node);
    push_links(&mut details, node, status);
    details
}

/// Per-pod rows, or the reduced-detail fallback when no pod data exists.
fn push_pod_rows(details: &mut Vec<DetailRow>, node: &Node, now: DateTime<Utc>) {
    let Some(pods) = node.specs.pod_model().filter(|pods| !pods.is_empty()) else {
        details.push(DetailRow::Label(LabelRow::keyed("resource.name", &node.name)));
        if let Some(namespace) = &node.namespace {
            details.push(DetailRow::Label(LabelRow::keyed(
                "resource.namespace",
                namespace,
            )));
        }
        details.push(DetailRow::Label(LabelRow::keyed("resource.status", "Unknown")));
        return;
    };

    for pod in pods.values() {
        details.push(DetailRow::Label(LabelRow::keyed("resource.name", &pod.name)));
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.namespace",
            &pod.namespace,
        )));
        details.push(DetailRow::Label(LabelRow::keyed("resource.status", &pod.status)));
        details.push(DetailRow::Label(LabelRow::keyed("resource.cluster", &pod.cluster)));
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.container",
            &pod.container,
        )));
        if let Some(host_ip) = &pod.host_ip {
            details.push(DetailRow::Label(LabelRow::keyed("resource.hostip", host_ip)));
        }
        if let Some(pod_ip) = &pod.pod_ip {
            details.push(DetailRow::Label(LabelRow::keyed("resource.podip", pod_ip)));
        }
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.startedAt",
            age(pod.started_at.as_deref(), now),
        )));
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.created",
            age(pod.created.as_deref(), now),
        )));
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.restarts",
            pod.restarts.to_string(),
        )));
    }
}

/// Trailing `key = value` rows for arbitrary resource labels.
fn push_label_rows(details: &mut Vec<DetailRow>, node: &Node) {
    let Some(labels) = raw_pointer(node, "/metadata/labels").and_then(Value::as_object) else {
        return;
    };
    if labels.is_empty() {
        return;
    }
    details.push(DetailRow::Label(LabelRow::header("resource.labels")));
    for (name, value) in labels {
        let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
        details.push(DetailRow::Label(LabelRow::bare(format!("{name} = {value}"))));
    }
}

/// Action links: jump to this node's YAML document, open search.
fn push_links(details: &mut Vec<DetailRow>, node: &Node, status: &NodeStatus) {
    if let Some(row) = node.specs.row() {
        details.push(DetailRow::Link {
            label: "props.view.yaml",
            action: LinkAction::ShowYaml { row },
            indent: true,
        });
    }
    // Orange means not deployed anywhere: a search link would come up empty.
    if status.pulse != Pulse::Orange {
        details.push(DetailRow::Link {
            label: "props.show.search.view",
            action: LinkAction::ShowSearch {
                kind: node.node_type.as_str().to_string(),
                name: node.name.clone(),
                namespace: node.namespace.clone(),
            },
            indent: true,
        });
    }
}

/// Project a node into its deploy-status table.
///
/// Container-bearing nodes report per-cluster `ready/desired` counts and
/// per-pod log rows; subscriptions report per-target states; plain
/// resources report deployed / not-deployed per cluster; applications
/// report selector and channel health.
#[must_use]
pub fn deploy_status_rows(node: &Node, status: &NodeStatus, now: DateTime<Utc>) -> Vec<DetailRow> {
    match &node.node_type {
        NodeType::Subscription => subscription_deploy_rows(node),
        NodeType::Application => application_deploy_rows(node),
        NodeType::Rules | NodeType::Clusters | NodeType::Package => Vec::new(),
        _ if node.has_container_template() => pod_deploy_rows(node, status, now),
        _ => resource_deploy_rows(node),
    }
}

/// Deployed / not-deployed per target cluster, for resources that never
/// produce pods.
fn resource_deploy_rows(node: &Node) -> Vec<DetailRow> {
    let mut details = vec![DetailRow::Label(LabelRow::header("resource.deploy.statuses"))];
    let name = raw_name(node);
    let empty = Default::default();
    let resource_model = node.specs.resource_model().unwrap_or(&empty);

    for cluster in node.id.cluster_names() {
        let deployed = resource_model.contains_key(&format!("{name}-{cluster}"));
        details.push(DetailRow::Label(LabelRow {
            label_value: Some(cluster),
            value: Some(if deployed { "Deployed" } else { "Not Deployed" }.to_string()),
            is_error: !deployed,
            ..LabelRow::default()
        }));
    }
    details.push(DetailRow::Spacer);
    details
}

/// Per-cluster `ready/desired` plus per-pod log rows.
fn pod_deploy_rows(node: &Node, status: &NodeStatus, now: DateTime<Utc>) -> Vec<DetailRow> {
    let mut details = vec![DetailRow::Label(LabelRow::header(
        "resource.deploy.pods.statuses",
    ))];

    for cluster in node.id.cluster_names() {
        let row = match status.pod_status_by_cluster.get(&cluster) {
            Some(counts) => LabelRow {
                label_value: Some(cluster),
                value: Some(format!("{}/{}", counts.ready, counts.desired)),
                is_error: counts.is_short(),
                ..LabelRow::default()
            },
            None => LabelRow {
                label_value: Some(cluster),
                value: Some("Not Deployed".to_string()),
                is_error: true,
                ..LabelRow::default()
            },
        };
        details.push(DetailRow::Label(row));
    }
    details.push(DetailRow::Spacer);

    for pod in node.specs.pod_model().into_iter().flat_map(|pods| pods.values()) {
        details.push(DetailRow::Label(LabelRow::header("resource.container.logs")));
        details.push(DetailRow::Link {
            label: "props.show.log",
            action: LinkAction::ShowPodLog {
                name: pod.name.clone(),
                namespace: pod.namespace.clone(),
                cluster: pod.cluster.clone(),
            },
            indent: true,
        });
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.clustername",
            &pod.cluster,
        )));
        details.push(DetailRow::Label(LabelRow::keyed("resource.pod", &pod.name)));
        if let Some(host_ip) = &pod.host_ip {
            details.push(DetailRow::Label(LabelRow::keyed("resource.hostip", host_ip)));
        }
        if let Some(pod_ip) = &pod.pod_ip {
            details.push(DetailRow::Label(LabelRow::keyed("resource.podip", pod_ip)));
        }
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.created",
            age(pod.started_at.as_deref(), now),
        )));
        details.push(DetailRow::Label(LabelRow {
            label_key: Some("resource.status"),
            value: Some(pod.status.clone()),
            is_error: POD_ERROR_STATES.contains(&pod.status.as_str()),
            ..LabelRow::default()
        }));
        details.push(DetailRow::Label(LabelRow::keyed(
            "resource.restarts",
            pod.restarts.to_string(),
        )));
        details.push(DetailRow::Spacer);
    }
    details
}

/// Per-target subscription states.
fn subscription_deploy_rows(node: &Node) -> Vec<DetailRow> {
    let mut details = vec![DetailRow::Label(LabelRow::header("resource.deploy.statuses"))];
    if let NodeSpecs::Subscription {
        subscription_model, ..
    } = &node.specs
    {
        for report in subscription_model.values() {
            details.push(DetailRow::Label(LabelRow {
                label_value: Some(report.cluster.clone()),
                value: Some(report.status.clone()),
                is_error: report.status.contains("Fail"),
                ..LabelRow::default()
            }));
        }
    }
    details.push(DetailRow::Spacer);
    details
}

/// Selector and channel health for the root application.
fn application_deploy_rows(node: &Node) -> Vec<DetailRow> {
    let mut details = Vec::new();
    details.push(DetailRow::Label(property_row(
        raw_pointer(node, "/spec/selector"),
        "spec.selector.matchExpressions",
        "selector not defined",
    )));
    details.push(DetailRow::Spacer);

    let channels = match &node.specs {
        NodeSpecs::Application { channels, .. } if !channels.is_empty() => Some(channels.join(",")),
        _ => None,
    };
    details.push(DetailRow::Label(match channels {
        Some(joined) => LabelRow::keyed("spec.app.channels", format!("[{joined}]")),
        None => LabelRow {
            label_key: Some("spec.app.channels"),
            value: Some("application has no linked channels".to_string()),
            is_error: true,
            ..LabelRow::default()
        },
    }));
    details
}

/// Compact `k=v` rendering of a raw property, or an error row carrying
/// the fallback text when the property is missing.
fn property_row(value: Option<&Value>, key: &'static str, missing: &str) -> LabelRow {
    match value {
        Some(value) => {
            let text = serde_json::to_string(value)
                .unwrap_or_default()
                .replace(':', "=")
                .replace(['{', '}', '"', ' '], "");
            LabelRow::keyed(key, text)
        }
        None => LabelRow {
            label_key: Some(key),
            value: Some(missing.to_string()),
            is_error: true,
            ..LabelRow::default()
        },
    }
}

/// Short description rendered under the node label.
#[must_use]
pub fn node_description(node: &Node) -> Option<String> {
    match &node.node_type {
        NodeType::Application | NodeType::Subscription => node.namespace.clone(),
        NodeType::Deployable => match &node.specs {
            NodeSpecs::Deployable { chart_name, .. } => chart_name.clone(),
            _ => None,
        },
        _ => None,
    }
}

fn raw_pointer<'a>(node: &'a Node, pointer: &str) -> Option<&'a Value> {
    node.specs.raw().and_then(|raw| raw.pointer(pointer))
}

fn raw_name(node: &Node) -> String {
    raw_pointer(node, "/metadata/name")
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

/// Header plus one row per line of a key-sorted YAML dump.
///
/// Missing values dump as the empty mapping, matching the selector and
/// placement panes which always render the block.
fn push_yaml_block(details: &mut Vec<DetailRow>, header: &'static str, value: Option<&Value>) {
    let empty = Value::Object(serde_json::Map::new());
    let value = value.unwrap_or(&empty);
    let Ok(yaml) = serde_yaml::to_string(value) else {
        return;
    };
    details.push(DetailRow::Label(LabelRow::header(header)));
    for line in yaml.lines().filter(|line| !line.is_empty()) {
        details.push(DetailRow::Label(LabelRow::bare(line)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fmap_model::{NodeId, PodRecord, ReplicaCounts, ResourceRecord};
    use serde_json::json;
    use std::collections::BTreeMap;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 6, 10, 12, 0, 0).unwrap()
    }

    fn label_values(rows: &[DetailRow]) -> Vec<String> {
        rows.iter()
            .filter_map(|row| match row {
                DetailRow::Label(l) => l.value.clone(),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn application_details_dump_the_selector() {
        let mut node = Node::new(NodeType::Application, "guestbook");
        node.specs = NodeSpecs::Application {
            raw: Some(json!({
                "kind": "Application",
                "spec": {"selector": {"matchLabels": {"app": "guestbook"}}},
            })),
            row: Some(0),
            channels: vec!["dev".to_string()],
            active_channel: None,
        };
        let rows = node_details(&node, &NodeStatus::default(), now());
        let values = label_values(&rows);
        assert!(values.iter().any(|v| v == "application"));
        assert!(values.iter().any(|v| v.contains("app: guestbook")));
        // The YAML link is present because the node has a row.
        assert!(rows.iter().any(|row| matches!(
            row,
            DetailRow::Link {
                action: LinkAction::ShowYaml { row: 0 },
                ..
            }
        )));
    }

    #[test]
    fn orange_pulse_suppresses_the_search_link() {
        let node = Node::new(NodeType::Deployment, "web");
        let status = NodeStatus {
            pulse: Pulse::Orange,
            ..NodeStatus::default()
        };
        let rows = node_details(&node, &status, now());
        assert!(!rows.iter().any(|row| matches!(
            row,
            DetailRow::Link {
                action: LinkAction::ShowSearch { .. },
                ..
            }
        )));
    }

    #[test]
    fn pod_without_data_degrades_to_unknown() {
        let node = Node::new(NodeType::Pod, "web").with_namespace("default");
        let rows = node_details(&node, &NodeStatus::default(), now());
        let values = label_values(&rows);
        assert!(values.iter().any(|v| v == "Unknown"));
        assert!(values.iter().any(|v| v == "default"));
    }

    #[test]
    fn pod_rows_include_age_and_restarts() {
        let mut node = Node::new(NodeType::Pod, "web");
        if let NodeSpecs::Workload { pod_model, .. } = &mut node.specs {
            pod_model.insert(
                "web-1".to_string(),
                PodRecord {
                    name: "web-1".to_string(),
                    namespace: "default".to_string(),
                    cluster: "east".to_string(),
                    container: "main".to_string(),
                    status: "Running".to_string(),
                    started_at: Some("2020-06-10T11:00:00Z".to_string()),
                    restarts: 3,
                    ..PodRecord::default()
                },
            );
        }
        let rows = node_details(&node, &NodeStatus::default(), now());
        let values = label_values(&rows);
        assert!(values.iter().any(|v| v == "an hour ago"));
        assert!(values.iter().any(|v| v == "3"));
    }

    #[test]
    fn resource_labels_render_as_pairs() {
        let mut node = Node::new(NodeType::Service, "svc");
        node.specs = NodeSpecs::Workload {
            raw: Some(json!({"metadata": {"labels": {"app": "guestbook", "tier": "front"}}})),
            row: None,
            pod_model: BTreeMap::new(),
            resource_model: BTreeMap::new(),
        };
        let rows = node_details(&node, &NodeStatus::default(), now());
        let values = label_values(&rows);
        assert!(values.iter().any(|v| v == "app = guestbook"));
        assert!(values.iter().any(|v| v == "tier = front"));
    }

    #[test]
    fn resource_deploy_rows_flag_missing_clusters() {
        let mut node = Node::new(NodeType::Service, "svc");
        node.id = NodeId::member(
            &["east".to_string(), "west".to_string()],
            &NodeType::Service,
            "svc",
        );
        node.specs = NodeSpecs::Workload {
            raw: Some(json!({"metadata": {"name": "svc"}})),
            row: None,
            pod_model: BTreeMap::new(),
            resource_model: [(
                "svc-east".to_string(),
                ResourceRecord {
                    name: "svc".to_string(),
                    cluster: "east".to_string(),
                    ..ResourceRecord::default()
                },
            )]
            .into_iter()
            .collect(),
        };
        let rows = deploy_status_rows(&node, &NodeStatus::default(), now());
        let east = rows.iter().find_map(|row| match row {
            DetailRow::Label(l) if l.label_value.as_deref() == Some("east") => Some(l),
            _ => None,
        });
        let west = rows.iter().find_map(|row| match row {
            DetailRow::Label(l) if l.label_value.as_deref() == Some("west") => Some(l),
            _ => None,
        });
        assert_eq!(east.and_then(|l| l.value.clone()).as_deref(), Some("Deployed"));
        assert!(west.is_some_and(|l| l.is_error));
    }

    #[test]
    fn pod_deploy_rows_show_ready_over_desired() {
        let mut node = Node::new(NodeType::Deployment, "web");
        node.id = NodeId::member(&["east".to_string()], &NodeType::Deployment, "web");
        node.specs = NodeSpecs::Workload {
            raw: Some(json!({
                "spec": {"template": {"spec": {"containers": [{"name": "c"}]}}},
            })),
            row: None,
            pod_model: BTreeMap::new(),
            resource_model: BTreeMap::new(),
        };
        let status = NodeStatus {
            pod_status_by_cluster: [(
                "east".to_string(),
                ReplicaCounts {
                    ready: 1,
                    desired: 3,
                    ..ReplicaCounts::default()
                },
            )]
            .into_iter()
            .collect(),
            ..NodeStatus::default()
        };
        let rows = deploy_status_rows(&node, &status, now());
        let east = rows.iter().find_map(|row| match row {
            DetailRow::Label(l) if l.label_value.as_deref() == Some("east") => Some(l),
            _ => None,
        });
        assert_eq!(east.and_then(|l| l.value.clone()).as_deref(), Some("1/3"));
        assert!(east.is_some_and(|l| l.is_error));
    }

    #[test]
    fn crashing_pods_get_log_links_and_error_rows() {
        let mut node = Node::new(NodeType::Deployment, "web");
        node.specs = NodeSpecs::Workload {
            raw: Some(json!({
                "spec": {"template": {"spec": {"containers": [{"name": "c"}]}}},
            })),
            row: None,
            pod_model: [(
                "web-1".to_string(),
                PodRecord {
                    name: "web-1".to_string(),
                    namespace: "default".to_string(),
                    cluster: "east".to_string(),
                    status: "CrashLoopBackOff".to_string(),
                    ..PodRecord::default()
                },
            )]
            .into_iter()
            .collect(),
            resource_model: BTreeMap::new(),
        };
        let rows = deploy_status_rows(&node, &NodeStatus::default(), now());
        assert!(rows.iter().any(|row| matches!(
            row,
            DetailRow::Link {
                action: LinkAction::ShowPodLog { .. },
                ..
            }
        )));
        assert!(rows.iter().any(|row| matches!(
            row,
            DetailRow::Label(l)
                if l.value.as_deref() == Some("CrashLoopBackOff") && l.is_error
        )));
    }

    #[test]
    fn subscription_deploy_rows_flag_failures() {
        let mut node = Node::new(NodeType::Subscription, "sub");
        if let NodeSpecs::Subscription {
            subscription_model, ..
        } = &mut node.specs
        {
            subscription_model.insert(
                "sub-east".to_string(),
                ResourceRecord {
                    cluster: "east".to_string(),
                    status: "PropagationFailed".to_string(),
                    ..ResourceRecord::default()
                },
            );
        }
        let rows = deploy_status_rows(&node, &NodeStatus::default(), now());
        assert!(rows.iter().any(|row| matches!(
            row,
            DetailRow::Label(l) if l.is_error && l.label_value.as_deref() == Some("east")
        )));
    }

    #[test]
    fn application_without_channels_reports_the_error() {
        let node = Node::new(NodeType::Application, "guestbook");
        let rows = deploy_status_rows(&node, &NodeStatus::default(), now());
        assert!(rows.iter().any(|row| matches!(
            row,
            DetailRow::Label(l)
                if l.label_key == Some("spec.app.channels") && l.is_error
        )));
    }

    #[test]
    fn descriptions_by_type() {
        let app = Node::new(NodeType::Application, "app").with_namespace("ns");
        assert_eq!(node_description(&app).as_deref(), Some("ns"));

        let mut deployable = Node::new(NodeType::Deployable, "dep");
        if let NodeSpecs::Deployable { chart_name, .. } = &mut deployable.specs {
            *chart_name = Some("nginx".to_string());
        }
        assert_eq!(node_description(&deployable).as_deref(), Some("nginx"));

        let pod = Node::new(NodeType::Pod, "pod");
        assert_eq!(node_description(&pod), None);
    }
}
