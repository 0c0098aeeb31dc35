//! Graph vertices and edges: node types, composite ids, the tagged specs union.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::records::{PodRecord, ResourceRecord};

/// Marker segment separating the cluster list inside a member-scoped id.
const CLUSTERS_MARKER: &str = "--clusters--";

/// The kind of resource a node represents.
///
/// Design types describe the application model (what the user declared);
/// topology types describe what was observed running. Unknown kinds from
/// the fetch collaborator degrade to [`NodeType::Other`] and take the
/// generic rendering path rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeType {
    Application,
    Subscription,
    Rules,
    Clusters,
    Deployable,
    Service,
    Deployment,
    Pod,
    Package,
    /// Any kind outside the declared design/topology sets.
    Other(String),
}

impl NodeType {
    /// Parse a raw kind string; unknown kinds become [`NodeType::Other`].
    #[must_use]
    pub fn parse(kind: &str) -> Self {
        match kind {
            "application" => Self::Application,
            "subscription" => Self::Subscription,
            "rules" => Self::Rules,
            "clusters" => Self::Clusters,
            "deployable" => Self::Deployable,
            "service" => Self::Service,
            "deployment" => Self::Deployment,
            "pod" => Self::Pod,
            "package" => Self::Package,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name of this type.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Application => "application",
            Self::Subscription => "subscription",
            Self::Rules => "rules",
            Self::Clusters => "clusters",
            Self::Deployable => "deployable",
            Self::Service => "service",
            Self::Deployment => "deployment",
            Self::Pod => "pod",
            Self::Package => "package",
            Self::Other(kind) => kind,
        }
    }

    /// True for design-time types (application model declarations).
    #[must_use]
    pub fn is_design(&self) -> bool {
        matches!(
            self,
            Self::Application | Self::Subscription | Self::Rules | Self::Clusters | Self::Deployable
        )
    }

    /// True for types observed from a running cluster.
    #[must_use]
    pub fn is_topology(&self) -> bool {
        !self.is_design()
    }

    /// Whether the type has a declared diagram shape.
    ///
    /// Shapeless nodes are nudged down during layout so their label does
    /// not collide with the row above.
    #[must_use]
    pub fn has_shape(&self) -> bool {
        !matches!(self, Self::Other(_))
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for NodeType {
    fn from(kind: String) -> Self {
        Self::parse(&kind)
    }
}

impl From<NodeType> for String {
    fn from(node_type: NodeType) -> Self {
        node_type.as_str().to_string()
    }
}

/// Stable composite key identifying one node within a snapshot.
///
/// Two forms exist:
/// - design ids: `{type}--{name}`
/// - member-scoped ids: `member--clusters--{c1,c2}--{type}--{name}`,
///   embedding the target cluster list so status aggregation can recover
///   it without a join against the cluster nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(String);

impl NodeId {
    /// Design-time id: `{type}--{name}`.
    #[must_use]
    pub fn design(node_type: &NodeType, name: &str) -> Self {
        Self(format!("{}--{}", node_type.as_str(), name))
    }

    /// Member-scoped id embedding the target cluster list.
    #[must_use]
    pub fn member(clusters: &[String], node_type: &NodeType, name: &str) -> Self {
        Self(format!(
            "member{}{}--{}--{}",
            CLUSTERS_MARKER,
            clusters.join(","),
            node_type.as_str(),
            name
        ))
    }

    /// Adopt an id string produced by an external topology extractor.
    #[must_use]
    pub fn from_raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Cluster names embedded in a member-scoped id.
    ///
    /// Parses the comma-separated list between the `--clusters--` marker
    /// and the following `--` segment; empty for design ids.
    #[must_use]
    pub fn cluster_names(&self) -> Vec<String> {
        let Some(start) = self.0.find(CLUSTERS_MARKER) else {
            return Vec::new();
        };
        let rest = &self.0[start + CLUSTERS_MARKER.len()..];
        let list = match rest.find("--") {
            Some(end) => &rest[..end],
            None => rest,
        };
        list.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Type-tagged payload of a node.
///
/// Each variant carries only the fields meaningful for that node type;
/// passes over the graph match exhaustively instead of probing a dynamic
/// bag. Nodes arriving malformed (no specs, no raw document) carry
/// [`NodeSpecs::Bare`] and render with reduced detail.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum NodeSpecs {
    Application {
        raw: Option<Value>,
        /// Starting line of this node's document in the snapshot YAML.
        row: Option<usize>,
        channels: Vec<String>,
        active_channel: Option<String>,
    },
    Subscription {
        raw: Option<Value>,
        row: Option<usize>,
        /// The subscription references placement rules; layout reserves a
        /// slot to its right for the deferred rule node.
        has_rules: bool,
        /// At least one target cluster reported `Subscribed`.
        is_placed: bool,
        channel: Option<String>,
        /// Per-target deploy reports keyed `{name}-{cluster}`.
        subscription_model: BTreeMap<String, ResourceRecord>,
    },
    Rules {
        raw: Option<Value>,
        row: Option<usize>,
        has_decisions: bool,
    },
    Clusters {
        cluster_names: Vec<String>,
    },
    Deployable {
        raw: Option<Value>,
        row: Option<usize>,
        /// Kind of the wrapped template, lowercased (`chart`, `service`, ...).
        template_kind: Option<String>,
        chart_name: Option<String>,
    },
    /// Concrete workload kinds: service, deployment, pod, package, other.
    Workload {
        raw: Option<Value>,
        row: Option<usize>,
        /// Pod snapshots owned by this workload, keyed by full pod name.
        pod_model: BTreeMap<String, PodRecord>,
        /// Deployed instances keyed `{name}-{cluster}`.
        resource_model: BTreeMap<String, ResourceRecord>,
    },
    /// Malformed or minimal node; reduced-detail rendering.
    #[default]
    Bare,
}

impl NodeSpecs {
    /// The raw resource document, when one was fetched.
    #[must_use]
    pub fn raw(&self) -> Option<&Value> {
        match self {
            Self::Application { raw, .. }
            | Self::Subscription { raw, .. }
            | Self::Rules { raw, .. }
            | Self::Deployable { raw, .. }
            | Self::Workload { raw, .. } => raw.as_ref(),
            Self::Clusters { .. } | Self::Bare => None,
        }
    }

    /// Starting line of this node's document in the snapshot YAML.
    #[must_use]
    pub fn row(&self) -> Option<usize> {
        match self {
            Self::Application { row, .. }
            | Self::Subscription { row, .. }
            | Self::Rules { row, .. }
            | Self::Deployable { row, .. }
            | Self::Workload { row, .. } => *row,
            Self::Clusters { .. } | Self::Bare => None,
        }
    }

    /// Per-kind deployed-instance map, for variants that carry one.
    #[must_use]
    pub fn resource_model(&self) -> Option<&BTreeMap<String, ResourceRecord>> {
        match self {
            Self::Workload { resource_model, .. } => Some(resource_model),
            Self::Subscription {
                subscription_model, ..
            } => Some(subscription_model),
            _ => None,
        }
    }

    /// Pod snapshots owned by this node, for workload variants.
    #[must_use]
    pub fn pod_model(&self) -> Option<&BTreeMap<String, PodRecord>> {
        match self {
            Self::Workload { pod_model, .. } => Some(pod_model),
            _ => None,
        }
    }

    /// Default specs variant for a node type with no payload yet.
    #[must_use]
    pub fn empty_for(node_type: &NodeType) -> Self {
        match node_type {
            NodeType::Application => Self::Application {
                raw: None,
                row: None,
                channels: Vec::new(),
                active_channel: None,
            },
            NodeType::Subscription => Self::Subscription {
                raw: None,
                row: None,
                has_rules: false,
                is_placed: false,
                channel: None,
                subscription_model: BTreeMap::new(),
            },
            NodeType::Rules => Self::Rules {
                raw: None,
                row: None,
                has_decisions: false,
            },
            NodeType::Clusters => Self::Clusters {
                cluster_names: Vec::new(),
            },
            NodeType::Deployable => Self::Deployable {
                raw: None,
                row: None,
                template_kind: None,
                chart_name: None,
            },
            _ => Self::Workload {
                raw: None,
                row: None,
                pod_model: BTreeMap::new(),
                resource_model: BTreeMap::new(),
            },
        }
    }
}

/// One logical resource in the topology graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub name: String,
    pub namespace: Option<String>,
    /// Free-form status string reported by the topology extractor
    /// (helm release state, job completion, ...).
    pub status: Option<String>,
    /// Failure reason accompanying a non-completed status.
    pub reason: Option<String>,
    pub specs: NodeSpecs,
}

impl Node {
    /// Minimal node with empty specs for the given type.
    #[must_use]
    pub fn new(node_type: NodeType, name: impl Into<String>) -> Self {
        let name = name.into();
        let id = NodeId::design(&node_type, &name);
        let specs = NodeSpecs::empty_for(&node_type);
        Self {
            id,
            node_type,
            name,
            namespace: None,
            status: None,
            reason: None,
            specs,
        }
    }

    /// Builder-style namespace setter.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Whether the raw template declares at least one container, i.e.
    /// this node is expected to deploy pods.
    #[must_use]
    pub fn has_container_template(&self) -> bool {
        self.specs
            .raw()
            .and_then(|raw| raw.pointer("/spec/template/spec/containers"))
            .and_then(Value::as_array)
            .is_some_and(|containers| !containers.is_empty())
    }
}

/// Directed edge between two node identities.
///
/// Duplicate (source, target) pairs are legal when they represent
/// distinct relationship kinds; the builder dedups exact triples only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Link {
    pub source: NodeId,
    pub target: NodeId,
    /// Relationship kind shown on the edge, e.g. `uses`, `deploys`.
    pub label: Option<String>,
}

impl Link {
    #[must_use]
    pub fn new(source: NodeId, target: NodeId) -> Self {
        Self {
            source,
            target,
            label: None,
        }
    }

    #[must_use]
    pub fn labeled(source: NodeId, target: NodeId, label: impl Into<String>) -> Self {
        Self {
            source,
            target,
            label: Some(label.into()),
        }
    }
}
