//! Resource graph builder: raw topology payload in, graph snapshot out.
//!
//! The builder never fails. A loaded, error-free fetch produces a fresh
//! snapshot (and refreshes the cache); anything else falls back to the
//! cached graph for the active channel, and when that misses too, to a
//! single-node placeholder carrying just the root application. Fetch
//! errors travel as flags on [`SnapshotDetails`], never as panics or
//! `Err` values.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use rustc_hash::{FxHashMap, FxHashSet};
use serde_json::Value;
use tracing::{debug, trace};

use fmap_model::{
    GraphSnapshot, Link, Node, NodeId, NodeSpecs, NodeType, PodRecord, RequestStatus,
    ResourceRecord, SnapshotDetails,
};

use crate::cache::{SnapshotCache, StoredChannels, StoredElements};
use crate::yaml::{canonical_yaml, join_documents, strip_volatile};

/// Replica-set hash suffix on generated pod names: 8-10 hex characters
/// followed by a 4-5 character alphanumeric suffix, dash-delimited.
static POD_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-[0-9a-fA-F]{8,10}-[0-9a-zA-Z]{4,5}$").expect("pod suffix pattern is valid")
});

/// `pod-template-hash` label key attached by deployments.
const POD_TEMPLATE_HASH: &str = "pod-template-hash";
/// OpenShift deployment-config label carrying the declared resource name.
const DEPLOYMENT_CONFIG_NAME: &str = "openshift.io/deployment-config.name";

/// What the caller is looking at: the root application plus cache wiring.
#[derive(Debug, Clone, Default)]
pub struct TopologyRequest {
    /// Root application name.
    pub name: String,
    pub namespace: Option<String>,
    /// Cache key for this view, supplied by the caller.
    pub store_key: String,
    /// Channel requested by the active filter set, if any.
    pub channel: Option<String>,
}

/// Raw fetch result from the data collaborator.
///
/// Nodes and links have already been shaped by the per-domain topology
/// extractor; pods and resources are the flat search results this
/// builder re-indexes under their owning nodes.
#[derive(Debug, Clone, Default)]
pub struct TopologyFetch {
    pub status: RequestStatus,
    pub loaded: bool,
    pub reloading: bool,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub pods: Vec<PodRecord>,
    pub resources: Vec<ResourceRecord>,
}

/// Build a graph snapshot from the latest fetch, consulting and updating
/// the snapshot cache.
#[must_use]
pub fn build_snapshot(
    request: &TopologyRequest,
    fetch: TopologyFetch,
    cache: &mut SnapshotCache,
) -> GraphSnapshot {
    let load_error = fetch.status.is_error();
    let reloading = fetch.reloading;

    if fetch.loaded && !load_error {
        return build_fresh(request, fetch, cache);
    }

    // Not loaded yet: a redraw mid-fetch can serve the stored graph for
    // the same channel, marked so callers can tell cached from fresh.
    if !reloading
        && let Some(snapshot) = restore_stored(request, cache, load_error)
    {
        return snapshot;
    }

    placeholder(request, load_error, reloading)
}

/// The channel remembered for a store key from a previous build.
pub fn active_channel(store_key: &str, cache: &mut SnapshotCache) -> Option<String> {
    cache
        .channels(store_key)
        .and_then(|entry| entry.active_channel.clone())
}

/// Strip the generated suffix from a pod name to recover its workload.
///
/// `myapp-7d8f9c6b5-xk2pl` and `myapp-worker` both resolve to the text
/// before the suffix; names without any dash are returned unchanged.
#[must_use]
pub fn strip_pod_suffix(name: &str) -> String {
    let stripped = POD_SUFFIX.replace(name, "");
    if stripped != name {
        return stripped.into_owned();
    }
    match name.rfind('-') {
        Some(idx) => name[..idx].to_string(),
        None => name.to_string(),
    }
}

fn build_fresh(
    request: &TopologyRequest,
    fetch: TopologyFetch,
    cache: &mut SnapshotCache,
) -> GraphSnapshot {
    let TopologyFetch {
        status,
        mut nodes,
        links,
        pods,
        resources,
        reloading,
        ..
    } = fetch;
    let load_error = status.is_error();
    let links = dedup_links(links);

    // One walk: collect channels and clusters, index pod nodes by name,
    // and emit each raw document's canonical YAML while recording the
    // line each node's block starts on.
    let mut clusters = Vec::new();
    let mut channels = Vec::new();
    let mut active_channel = None;
    let mut original_map = BTreeMap::new();
    let mut pod_nodes: FxHashMap<String, usize> = FxHashMap::default();
    let mut blocks = Vec::new();
    let mut row = 0usize;

    for (index, node) in nodes.iter_mut().enumerate() {
        match &node.specs {
            NodeSpecs::Application {
                channels: node_channels,
                active_channel: node_active,
                ..
            } => {
                active_channel = node_active.clone();
                channels = node_channels.clone();
            }
            NodeSpecs::Clusters { cluster_names } => {
                for name in cluster_names {
                    if !clusters.contains(name) {
                        clusters.push(name.clone());
                    }
                }
            }
            _ => {}
        }
        if node.node_type == NodeType::Pod {
            pod_nodes.insert(node.name.clone(), index);
        }

        if let Some(raw) = node.specs.raw() {
            if let Some(kind) = raw.get("kind").and_then(Value::as_str) {
                original_map.insert(kind.to_string(), raw.clone());
            }
            let mut cleaned = raw.clone();
            strip_volatile(&mut cleaned);
            let block = canonical_yaml(&cleaned);
            set_row(&mut node.specs, row);
            row += block.lines().count() + 1;
            blocks.push(block);
        }
    }
    let yaml = join_documents(&blocks);

    associate_pods(&mut nodes, &pod_nodes, &pods);
    index_resources(&mut nodes, &resources);

    cache.store_channels(
        &request.store_key,
        StoredChannels {
            active_channel: active_channel.clone(),
            channels: channels.clone(),
        },
    );
    let element_key =
        SnapshotCache::element_key(&request.store_key, active_channel.as_deref().unwrap_or(""));
    cache.store_elements(
        &element_key,
        StoredElements {
            clusters: clusters.clone(),
            links: links.clone(),
            nodes: nodes.clone(),
            yaml: yaml.clone(),
        },
    );

    debug!(
        nodes = nodes.len(),
        links = links.len(),
        yaml_lines = row,
        "built fresh topology snapshot"
    );

    GraphSnapshot {
        nodes,
        links,
        clusters,
        channels,
        active_channel,
        pods,
        yaml,
        original_map,
        details: SnapshotDetails {
            loaded: true,
            stored_version: false,
            load_error,
            reloading,
        },
    }
}

fn restore_stored(
    request: &TopologyRequest,
    cache: &mut SnapshotCache,
    load_error: bool,
) -> Option<GraphSnapshot> {
    let (remembered, channels) = match cache.channels(&request.store_key) {
        Some(entry) => (entry.active_channel.clone(), entry.channels.clone()),
        None => (None, Vec::new()),
    };
    // The requested channel wins over the remembered one.
    let active_channel = request.channel.clone().or(remembered);
    let key =
        SnapshotCache::element_key(&request.store_key, active_channel.as_deref().unwrap_or(""));
    let stored = cache.elements(&key)?.clone();

    trace!(key = %key, "serving stored topology snapshot");
    Some(GraphSnapshot {
        nodes: stored.nodes,
        links: stored.links,
        clusters: stored.clusters,
        channels,
        active_channel,
        pods: Vec::new(),
        yaml: stored.yaml,
        original_map: BTreeMap::new(),
        details: SnapshotDetails {
            loaded: true,
            stored_version: true,
            load_error,
            reloading: false,
        },
    })
}

/// Minimal graph carrying only the root application identity.
fn placeholder(request: &TopologyRequest, load_error: bool, reloading: bool) -> GraphSnapshot {
    let mut node = Node::new(NodeType::Application, request.name.clone());
    node.namespace = request.namespace.clone();
    GraphSnapshot {
        nodes: vec![node],
        links: Vec::new(),
        details: SnapshotDetails {
            loaded: false,
            stored_version: false,
            load_error,
            reloading,
        },
        ..GraphSnapshot::default()
    }
}

/// Drop self-loops and duplicate (source, target, label) triples.
fn dedup_links(links: Vec<Link>) -> Vec<Link> {
    let mut seen = FxHashSet::default();
    links
        .into_iter()
        .filter(|link| link.source != link.target)
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Attach pod status records to their owning pod nodes, keyed by the
/// full pod name.
fn associate_pods(nodes: &mut [Node], pod_nodes: &FxHashMap<String, usize>, pods: &[PodRecord]) {
    for pod in pods {
        let owner = strip_pod_suffix(&pod.name);
        let Some(&index) = pod_nodes.get(&owner) else {
            trace!(pod = %pod.name, "no owning node for pod");
            continue;
        };
        if let Some(node) = nodes.get_mut(index)
            && let NodeSpecs::Workload { pod_model, .. } = &mut node.specs
        {
            pod_model.insert(pod.name.clone(), pod.clone());
        }
    }
}

/// Index deployed-resource search results under their owning nodes.
///
/// Pod records lose their generated suffix; a `pod-template-hash` label
/// strips the hash segment from any name; OpenShift deployment-config
/// labels replace the name entirely. Matched records land in the owning
/// node's per-kind map under `{name}-{cluster}`.
fn index_resources(nodes: &mut [Node], resources: &[ResourceRecord]) {
    let mut by_name: FxHashMap<String, Vec<usize>> = FxHashMap::default();
    for (index, node) in nodes.iter().enumerate() {
        by_name.entry(node.name.clone()).or_default().push(index);
    }

    for record in resources {
        let owner = owning_name(record);
        let Some(candidates) = by_name.get(&owner) else {
            continue;
        };
        // Prefer the node whose type matches the record kind; resources
        // of a kind no node declares fall back to the first name match.
        let index = candidates
            .iter()
            .copied()
            .find(|&i| nodes[i].node_type.as_str() == record.kind)
            .or_else(|| candidates.first().copied());
        let Some(index) = index else { continue };

        let key = format!("{}-{}", record.name, record.cluster);
        match &mut nodes[index].specs {
            NodeSpecs::Subscription {
                subscription_model,
                is_placed,
                ..
            } if record.kind == "subscription" => {
                if record.status == "Subscribed" {
                    *is_placed = true;
                }
                subscription_model.insert(key, record.clone());
            }
            NodeSpecs::Workload { resource_model, .. } => {
                resource_model.insert(key, record.clone());
            }
            _ => {}
        }
    }
}

/// The node name a search record belongs to, after label adjustments.
fn owning_name(record: &ResourceRecord) -> String {
    let mut name = record.name.clone();
    let mut deployable_name = None;

    for label in record
        .label
        .as_deref()
        .unwrap_or("")
        .split(';')
        .filter(|l| !l.is_empty())
    {
        let Some((key, value)) = label.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        if key == POD_TEMPLATE_HASH {
            name = name.replace(&format!("-{value}"), "");
        }
        if key == DEPLOYMENT_CONFIG_NAME || label.contains("deploymentconfig") {
            deployable_name = Some(value.to_string());
        }
    }

    if let Some(declared) = deployable_name {
        return declared;
    }
    if record.kind == "pod" {
        return strip_pod_suffix(&name);
    }
    name
}

/// Record the YAML row a node's document starts on.
fn set_row(specs: &mut NodeSpecs, value: usize) {
    match specs {
        NodeSpecs::Application { row, .. }
        | NodeSpecs::Subscription { row, .. }
        | NodeSpecs::Rules { row, .. }
        | NodeSpecs::Deployable { row, .. }
        | NodeSpecs::Workload { row, .. } => *row = Some(value),
        NodeSpecs::Clusters { .. } | NodeSpecs::Bare => {}
    }
}
