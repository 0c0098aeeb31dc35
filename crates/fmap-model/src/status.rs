//! Health classification: the pulse enum, status icons, replica tables.
//!
//! Status is derived state. The aggregator in `fmap-graph` produces one
//! [`NodeStatus`] per node into a side-table; nothing here is stored back
//! onto the nodes themselves.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Discrete health classification of a node.
///
/// The variant order *is* the severity order used when two rules fire for
/// the same node: `Red > Yellow > Orange > Green`, so combining verdicts
/// is a plain `max`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Pulse {
    /// Healthy: everything requested is placed and ready.
    #[default]
    Green,
    /// Resource never created or fetched.
    Orange,
    /// Partially placed or short of desired replicas.
    Yellow,
    /// Failed.
    Red,
}

impl Pulse {
    /// The more severe of two pulses.
    #[must_use]
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }

    /// CSS-ish wire name used by the render surface.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Red => "red",
        }
    }
}

/// Icon overlaid on a node to summarize nested resource state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusIcon {
    Success,
    Pending,
    Warning,
    Error,
}

/// Replica counts for one target cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReplicaCounts {
    pub available: u32,
    pub current: u32,
    pub desired: u32,
    pub ready: u32,
}

impl ReplicaCounts {
    /// True when the cluster is short of its desired replica count.
    #[must_use]
    pub fn is_short(&self) -> bool {
        self.ready < self.desired
    }
}

/// Derived status for one node.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NodeStatus {
    pub pulse: Pulse,
    pub icon: Option<StatusIcon>,
    /// Tooltip text accompanying an error icon (failure reason).
    pub icon_reason: Option<String>,
    /// Per-cluster replica table for container-bearing nodes.
    pub pod_status_by_cluster: BTreeMap<String, ReplicaCounts>,
}
