#![forbid(unsafe_code)]

//! Fleetmap public facade crate.
//!
//! Fleetmap is the headless engine behind a multi-cluster Kubernetes
//! application console's topology view. This crate re-exports the
//! stable surface of the pipeline crates and offers a lightweight
//! prelude for day-to-day usage.
//!
//! The pipeline runs synchronously inside one UI callback:
//! fetch payload → [`build_snapshot`] → [`status_map`] → [`layout`] →
//! render surface, with [`plan_highlights`] serving the template editor
//! on the side.

// --- Model re-exports ------------------------------------------------------

pub use fmap_model::{
    GraphSnapshot, Link, Node, NodeId, NodeSpecs, NodeStatus, NodeType, PodRecord, Pulse,
    ReplicaCounts, RequestStatus, ResourceRecord, SnapshotDetails, StatusIcon,
};

// --- Graph re-exports ------------------------------------------------------

pub use fmap_graph::{
    CacheStats, SnapshotCache, StatusMap, StoredChannels, StoredElements, TopologyFetch,
    TopologyRequest, active_channel, build_snapshot, compute_status, status_map,
};

// --- Layout re-exports -----------------------------------------------------

pub use fmap_layout::{
    ConstraintSolver, ForceDirectedSolver, LayoutConfig, LayoutMode, PlacedLayout, Point,
    SolverGraph, SolverOptions, grid_layout, layout,
};

// --- Detail re-exports -----------------------------------------------------

pub use fmap_detail::{
    DetailRow, LabelRow, LinkAction, Tooltip, deploy_status_rows, label_text, node_description,
    node_details, node_tooltips, wrapped_label,
};

// --- Diff re-exports -------------------------------------------------------

pub use fmap_diff::{
    Decoration, EditorSurface, HighlightPlan, LineTree, TabDecision, TabState, highlight_changes,
    parse_line_tree, plan_highlights, select_tab, unique_name,
};

// --- Prelude --------------------------------------------------------------

pub mod prelude {
    pub use crate::{
        ForceDirectedSolver, GraphSnapshot, LayoutConfig, Link, Node, NodeId, NodeType,
        PlacedLayout, Pulse, SnapshotCache, TopologyFetch, TopologyRequest, build_snapshot,
        layout, plan_highlights, status_map,
    };
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn pipeline_runs_end_to_end_on_a_placeholder() {
        let request = TopologyRequest {
            name: "guestbook".to_string(),
            store_key: "view".to_string(),
            ..TopologyRequest::default()
        };
        let mut cache = SnapshotCache::with_default_capacity();
        let snapshot = build_snapshot(&request, TopologyFetch::default(), &mut cache);

        let statuses = status_map(&snapshot.nodes);
        assert_eq!(statuses.len(), 1);

        let mut solver = ForceDirectedSolver::new();
        let placed = layout(
            &snapshot.nodes,
            &snapshot.links,
            &LayoutConfig::default(),
            &mut solver,
        );
        assert_eq!(placed.positions.len(), 1);
    }
}
