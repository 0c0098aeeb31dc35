//! Tooltip projection: hover records with search deep links.

use fmap_model::{Node, NodeSpecs, NodeType};

use crate::Tooltip;

/// Cluster names shown before the list truncates to "and N more".
const MAX_TOOLTIP_CLUSTERS: usize = 4;

/// Node types with first-class tooltip naming; anything else shows an
/// explicit type row.
fn is_default_type(node_type: &NodeType) -> bool {
    node_type.has_shape()
}

/// Search deep link for a `kind:... name:...` filter.
fn search_href(search_root: &str, kind: &str, name: &str) -> String {
    format!(r#"{search_root}/search?filters={{"textsearch":"kind:{kind} name:{name}"}}"#)
}

/// Search deep link filtered to one cluster.
fn cluster_href(search_root: &str, cluster: &str) -> String {
    format!(r#"{search_root}/search?filters={{"textsearch":"cluster:{cluster}"}}"#)
}

/// Project a node into its hover tooltips.
///
/// `search_root` is the console's base path for the search page.
#[must_use]
pub fn node_tooltips(node: &Node, search_root: &str) -> Vec<Tooltip> {
    let mut tooltips = Vec::new();

    match &node.node_type {
        NodeType::Subscription => {
            push_name_tooltips(&mut tooltips, node, search_root);
            if let Some(channel) = subscription_channel(node) {
                // Channel references are `namespace/name`; link the name.
                let name = channel.split_once('/').map_or(channel.as_str(), |(_, n)| n);
                tooltips.push(Tooltip::Entry {
                    name: resolve("resource.channel"),
                    value: name.to_string(),
                    href: Some(search_href(search_root, "channel", name)),
                });
            }
        }
        NodeType::Clusters => {
            let NodeSpecs::Clusters { cluster_names } = &node.specs else {
                return tooltips;
            };
            let shown = cluster_names.len().min(MAX_TOOLTIP_CLUSTERS);
            for name in &cluster_names[..shown] {
                tooltips.push(Tooltip::Entry {
                    name: resolve("resource.cluster"),
                    value: name.clone(),
                    href: Some(cluster_href(search_root, name)),
                });
            }
            if cluster_names.len() > MAX_TOOLTIP_CLUSTERS {
                let more = cluster_names.len() - MAX_TOOLTIP_CLUSTERS;
                tooltips.push(Tooltip::Summary(format!("and {more} more")));
            }
        }
        _ => push_name_tooltips(&mut tooltips, node, search_root),
    }
    tooltips
}

/// Name, optional type, and namespace entries shared by most node types.
fn push_name_tooltips(tooltips: &mut Vec<Tooltip>, node: &Node, search_root: &str) {
    let kind = node.node_type.as_str();
    let href = search_href(search_root, kind, &node.name);
    if is_default_type(&node.node_type) {
        tooltips.push(Tooltip::Entry {
            name: resolve(&format!("resource.{kind}")),
            value: node.name.clone(),
            href: Some(href),
        });
    } else {
        tooltips.push(Tooltip::Entry {
            name: resolve("resource.type"),
            value: kind.to_string(),
            href: None,
        });
        tooltips.push(Tooltip::Entry {
            name: resolve("resource.name"),
            value: node.name.clone(),
            href: Some(href),
        });
    }
    if let Some(namespace) = &node.namespace {
        tooltips.push(Tooltip::Entry {
            name: resolve("resource.namespace"),
            value: namespace.clone(),
            href: Some(search_href(search_root, "namespace", namespace)),
        });
    }
}

fn subscription_channel(node: &Node) -> Option<String> {
    match &node.specs {
        NodeSpecs::Subscription { channel, raw, .. } => channel.clone().or_else(|| {
            raw.as_ref()
                .and_then(|raw| raw.pointer("/spec/channel"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_string)
        }),
        _ => None,
    }
}

/// Default English text for a label key; unknown keys display as-is.
#[must_use]
pub fn label_text(key: &str) -> &str {
    match key {
        "resource.type" => "Type",
        "resource.name" => "Name",
        "resource.namespace" => "Namespace",
        "resource.status" => "Status",
        "resource.cluster" => "Cluster",
        "resource.clustername" => "Cluster name",
        "resource.container" => "Container",
        "resource.channel" => "Channel",
        "resource.labels" => "Labels",
        "resource.selector" => "Selector",
        "resource.placement" => "Placement",
        "resource.replicas" => "Cluster replicas",
        "resource.cluster.labels" => "Cluster labels",
        "resource.pod" => "Pod",
        "resource.hostip" => "Host IP",
        "resource.podip" => "Pod IP",
        "resource.created" => "Created",
        "resource.startedAt" => "Started",
        "resource.restarts" => "Restarts",
        "resource.deploy.statuses" => "Cluster deploy status",
        "resource.deploy.pods.statuses" => "Cluster pod status",
        "resource.container.logs" => "Container logs",
        "resource.application" => "Application",
        "resource.subscription" => "Subscription",
        "resource.rules" => "Rules",
        "resource.deployable" => "Deployable",
        "resource.deployment" => "Deployment",
        "resource.service" => "Service",
        "resource.package" => "Package",
        "spec.selector.matchExpressions" => "Match expressions",
        "spec.app.channels" => "Channels",
        "props.view.yaml" => "View YAML",
        "props.show.search.view" => "Show in search",
        "props.show.log" => "Show log",
        other => other,
    }
}

fn resolve(key: &str) -> String {
    label_text(key).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmap_model::NodeSpecs;
    use serde_json::json;

    const ROOT: &str = "/multicloud";

    #[test]
    fn default_type_gets_a_single_named_entry() {
        let node = Node::new(NodeType::Deployment, "web").with_namespace("default");
        let tooltips = node_tooltips(&node, ROOT);
        assert_eq!(tooltips.len(), 2);
        let Tooltip::Entry { name, value, href } = &tooltips[0] else {
            panic!("expected entry");
        };
        assert_eq!(name, "Deployment");
        assert_eq!(value, "web");
        assert_eq!(
            href.as_deref(),
            Some(r#"/multicloud/search?filters={"textsearch":"kind:deployment name:web"}"#)
        );
    }

    #[test]
    fn unknown_types_show_an_explicit_type_row() {
        let node = Node::new(NodeType::Other("helmrelease".to_string()), "rel");
        let tooltips = node_tooltips(&node, ROOT);
        assert!(matches!(
            &tooltips[0],
            Tooltip::Entry { name, value, href: None } if name == "Type" && value == "helmrelease"
        ));
        assert!(matches!(
            &tooltips[1],
            Tooltip::Entry { name, .. } if name == "Name"
        ));
    }

    #[test]
    fn subscription_links_its_channel_name() {
        let mut node = Node::new(NodeType::Subscription, "sub");
        node.specs = NodeSpecs::Subscription {
            raw: Some(json!({"spec": {"channel": "ch-ns/dev-channel"}})),
            row: None,
            has_rules: false,
            is_placed: false,
            channel: None,
            subscription_model: Default::default(),
        };
        let tooltips = node_tooltips(&node, ROOT);
        assert!(tooltips.iter().any(|t| matches!(
            t,
            Tooltip::Entry { name, value, .. } if name == "Channel" && value == "dev-channel"
        )));
    }

    #[test]
    fn clusters_truncate_to_four_plus_summary() {
        let mut node = Node::new(NodeType::Clusters, "clusters");
        node.specs = NodeSpecs::Clusters {
            cluster_names: (1..=6).map(|i| format!("cluster{i}")).collect(),
        };
        let tooltips = node_tooltips(&node, ROOT);
        let named = tooltips
            .iter()
            .filter(|t| matches!(t, Tooltip::Entry { .. }))
            .count();
        assert_eq!(named, 4);
        assert!(matches!(
            tooltips.last(),
            Some(Tooltip::Summary(text)) if text == "and 2 more"
        ));
    }

    #[test]
    fn few_clusters_skip_the_summary() {
        let mut node = Node::new(NodeType::Clusters, "clusters");
        node.specs = NodeSpecs::Clusters {
            cluster_names: vec!["east".to_string(), "west".to_string()],
        };
        let tooltips = node_tooltips(&node, ROOT);
        assert_eq!(tooltips.len(), 2);
        assert!(!tooltips.iter().any(|t| matches!(t, Tooltip::Summary(_))));
    }

    #[test]
    fn unknown_label_keys_pass_through() {
        assert_eq!(label_text("resource.name"), "Name");
        assert_eq!(label_text("something.else"), "something.else");
    }
}
