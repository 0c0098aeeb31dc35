#![forbid(unsafe_code)]

//! Topology layout engine.
//!
//! Positions every node of a graph snapshot in world-unit f64
//! coordinates. The engine is fully deterministic: same graph, same
//! config, same positions — there is no RNG and the external solve is
//! seeded from the deterministic row pass.
//!
//! # Pipeline
//! 1. Row seeding ([`rows`]): recursive top-down placement by graph
//!    depth, with type-specific handling for subscriptions, clusters,
//!    pods, and deferred rule nodes.
//! 2. Constrained solve ([`solver`]): graphs with a single root keep the
//!    seeded positions as-is (`preset`); anything else is handed to a
//!    [`ConstraintSolver`] that relaxes edge lengths and removes
//!    overlaps while keeping the top-to-bottom flow.
//! 3. Grid placement ([`grid`]): elements with no edges at all are laid
//!    out on a label-sorted grid with a caller-supplied column count.

pub mod grid;
pub mod rows;
pub mod solver;

use std::collections::BTreeMap;

use tracing::debug;

use fmap_model::{Link, Node, NodeId};
use rustc_hash::FxHashMap;

pub use grid::grid_layout;
pub use solver::{ConstraintSolver, ForceDirectedSolver, SolverGraph, SolverOptions};

/// A position in world units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Configuration knobs for the layout engine.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Base node size in world units; every spacing rule is a multiple.
    pub node_size: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { node_size: 50.0 }
    }
}

impl LayoutConfig {
    /// Horizontal slot width within a row.
    #[must_use]
    pub fn unit(&self) -> f64 {
        self.node_size * 3.0
    }

    /// Vertical distance between rows.
    #[must_use]
    pub fn row_pitch(&self) -> f64 {
        self.node_size * 2.4
    }

    /// Vertical nudge applied to cluster rows.
    #[must_use]
    pub fn cluster_nudge(&self) -> f64 {
        self.node_size / 2.0
    }
}

/// How the final positions were produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutMode {
    /// Single-root graph: the seeded row placement is final.
    Preset,
    /// Multi-root graph: the external solver refined the seeds.
    Solved,
}

/// Result of a layout pass: one position per node id.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLayout {
    pub mode: LayoutMode,
    pub positions: BTreeMap<NodeId, Point>,
}

impl PlacedLayout {
    /// Position of a node, if it was part of the laid-out graph.
    #[must_use]
    pub fn position(&self, id: &NodeId) -> Option<Point> {
        self.positions.get(id).copied()
    }

    /// Bounding box of all positions as `(min_x, min_y, max_x, max_y)`.
    #[must_use]
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut iter = self.positions.values();
        let first = iter.next()?;
        let mut bounds = (first.x, first.y, first.x, first.y);
        for p in iter {
            bounds.0 = bounds.0.min(p.x);
            bounds.1 = bounds.1.min(p.y);
            bounds.2 = bounds.2.max(p.x);
            bounds.3 = bounds.3.max(p.y);
        }
        Some(bounds)
    }
}

/// Index-based adjacency over the snapshot's nodes.
///
/// Links referencing unknown ids are ignored rather than erroring; the
/// fetch collaborator occasionally races nodes against links.
pub(crate) struct LayoutGraph<'a> {
    pub nodes: &'a [Node],
    pub adj: Vec<Vec<usize>>,
    pub radj: Vec<Vec<usize>>,
}

impl<'a> LayoutGraph<'a> {
    pub(crate) fn new(nodes: &'a [Node], links: &[Link]) -> Self {
        let index: FxHashMap<&NodeId, usize> = nodes
            .iter()
            .enumerate()
            .map(|(i, node)| (&node.id, i))
            .collect();
        let mut adj = vec![Vec::new(); nodes.len()];
        let mut radj = vec![Vec::new(); nodes.len()];
        for link in links {
            if let (Some(&from), Some(&to)) = (index.get(&link.source), index.get(&link.target)) {
                if from == to {
                    continue;
                }
                adj[from].push(to);
                radj[to].push(from);
            }
        }
        Self { nodes, adj, radj }
    }

    /// Nodes with no incoming edges, in node order.
    pub(crate) fn roots(&self) -> Vec<usize> {
        (0..self.nodes.len())
            .filter(|&i| self.radj[i].is_empty())
            .collect()
    }
}

/// Lay out a connected topology graph.
///
/// Seeds every node with the deterministic row pass, then either keeps
/// the seeds (exactly one root) or hands them to `solver` for edge
/// relaxation, flow enforcement, and overlap removal.
#[must_use]
pub fn layout(
    nodes: &[Node],
    links: &[Link],
    config: &LayoutConfig,
    solver: &mut dyn ConstraintSolver,
) -> PlacedLayout {
    let graph = LayoutGraph::new(nodes, links);
    let roots = graph.roots();
    let mut seeds = rows::seed_rows(&graph, &roots, config);

    let mode = if roots.len() == 1 {
        LayoutMode::Preset
    } else {
        let solver_graph = SolverGraph::from_adjacency(&graph.adj);
        solver.solve(&solver_graph, &mut seeds, &SolverOptions::for_config(config));
        LayoutMode::Solved
    };
    debug!(nodes = nodes.len(), roots = roots.len(), ?mode, "layout pass complete");

    let positions = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| (node.id.clone(), seeds[i]))
        .collect();
    PlacedLayout { mode, positions }
}
