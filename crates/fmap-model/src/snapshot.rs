//! The immutable graph snapshot handed to the render surface.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::node::{Link, Node};
use crate::records::PodRecord;

/// Load-state flags accompanying a snapshot.
///
/// Fetch failures never cross the builder boundary as errors; they
/// surface here and the render surface owns the user-visible messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SnapshotDetails {
    /// The snapshot reflects a completed fetch (fresh or cached).
    pub loaded: bool,
    /// The snapshot was served from the cache, not the latest fetch.
    pub stored_version: bool,
    /// The latest fetch ended in an error.
    pub load_error: bool,
    /// A refresh fetch is currently in flight.
    pub reloading: bool,
}

/// One immutable-per-render topology view.
///
/// Created on every successful fetch, restored from the snapshot cache
/// when a redraw happens before a new fetch completes, or synthesized as
/// a single-node placeholder when nothing is available yet.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    /// Names of all member clusters appearing in the view.
    pub clusters: Vec<String>,
    /// Channels the root application can activate.
    pub channels: Vec<String>,
    pub active_channel: Option<String>,
    /// The fetch's flat pod list, passed through for table views.
    /// Cache-restored snapshots carry an empty list.
    pub pods: Vec<PodRecord>,
    /// Canonical key-sorted YAML of every raw document, `---` separated.
    pub yaml: String,
    /// Latest raw document per resource kind.
    pub original_map: BTreeMap<String, Value>,
    pub details: SnapshotDetails,
}

impl GraphSnapshot {
    /// True when this is the single-node placeholder (no data yet).
    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        !self.details.loaded
    }
}
