//! Constrained-layout solve for multi-root graphs.
//!
//! The row pass produces good seeds; the solver's job is only to relax
//! edge lengths and pull apart overlaps without destroying the
//! top-to-bottom flow. The seam is a trait so tests can observe or
//! replace the solve; the bundled [`ForceDirectedSolver`] drives the
//! `force_graph` physics simulation from the seeds (every node starts at
//! its seeded position, so the result is reproducible — no RNG anywhere).

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use tracing::trace;

use crate::{LayoutConfig, Point};

/// Edge list handed to the solver; node indices match the seed slice.
#[derive(Debug, Clone, Default)]
pub struct SolverGraph {
    pub node_count: usize,
    pub edges: Vec<(usize, usize)>,
}

impl SolverGraph {
    /// Flatten an adjacency list into the solver's edge list.
    #[must_use]
    pub fn from_adjacency(adj: &[Vec<usize>]) -> Self {
        let edges = adj
            .iter()
            .enumerate()
            .flat_map(|(from, outs)| outs.iter().map(move |&to| (from, to)))
            .collect();
        Self {
            node_count: adj.len(),
            edges,
        }
    }
}

/// Iteration budgets and separations for the constrained solve.
#[derive(Debug, Clone)]
pub struct SolverOptions {
    /// Passes of physics relaxation working toward ideal edge lengths.
    pub edge_relax_iterations: usize,
    /// Passes enforcing the top-to-bottom flow constraint.
    pub flow_iterations: usize,
    /// Passes of pairwise overlap removal.
    pub overlap_iterations: usize,
    /// Minimum vertical separation along a directed edge.
    pub flow_separation: f64,
    /// Minimum distance between node centers before they count as
    /// overlapping.
    pub node_spacing: f64,
}

impl SolverOptions {
    /// Budgets from the layout config: 10 edge passes, 20 flow passes,
    /// 20 overlap passes.
    #[must_use]
    pub fn for_config(config: &LayoutConfig) -> Self {
        Self {
            edge_relax_iterations: 10,
            flow_iterations: 20,
            overlap_iterations: 20,
            flow_separation: config.node_size * 1.2,
            node_spacing: config.node_size * 1.3,
        }
    }
}

/// The solve seam: refine seeded positions in place.
pub trait ConstraintSolver {
    fn solve(&mut self, graph: &SolverGraph, seeds: &mut [Point], options: &SolverOptions);
}

/// Force-directed solve over the `force_graph` simulation.
#[derive(Debug, Clone, Default)]
pub struct ForceDirectedSolver {
    _private: (),
}

impl ForceDirectedSolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One physics step per edge-relaxation pass.
    const STEP: f32 = 0.016;
}

impl ConstraintSolver for ForceDirectedSolver {
    fn solve(&mut self, graph: &SolverGraph, seeds: &mut [Point], options: &SolverOptions) {
        if seeds.is_empty() {
            return;
        }

        // Coincident seeds degenerate the physics forces; nudge exact
        // duplicates apart by index before simulating.
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                if seeds[i] == seeds[j] {
                    seeds[j].x += (j - i) as f64 * 1e-3;
                }
            }
        }

        // Phase 1: edge-length relaxation. Nodes start at their seeded
        // positions and carry their index as user data so positions can
        // be read back without assuming iteration order.
        let mut sim: ForceGraph<usize, ()> = ForceGraph::new(SimulationParameters {
            force_charge: 150.0,
            force_spring: 0.05,
            force_max: 100.0,
            node_speed: 3000.0,
            damping_factor: 0.9,
        });
        let mut handles = Vec::with_capacity(seeds.len());
        for (index, seed) in seeds.iter().enumerate() {
            handles.push(sim.add_node(NodeData {
                x: seed.x as f32,
                y: seed.y as f32,
                mass: 10.0,
                is_anchor: false,
                user_data: index,
            }));
        }
        for &(from, to) in &graph.edges {
            if from < handles.len() && to < handles.len() {
                sim.add_edge(handles[from], handles[to], EdgeData::default());
            }
        }
        for _ in 0..options.edge_relax_iterations {
            sim.update(Self::STEP);
        }
        sim.visit_nodes(|node| {
            let index = node.data.user_data;
            if let Some(seed) = seeds.get_mut(index) {
                *seed = Point::new(f64::from(node.x()), f64::from(node.y()));
            }
        });

        // Phase 2: flow constraints. Every directed edge keeps its
        // target at least one separation below its source.
        for _ in 0..options.flow_iterations {
            let mut changed = false;
            for &(from, to) in &graph.edges {
                if from >= seeds.len() || to >= seeds.len() {
                    continue;
                }
                let min_y = seeds[from].y + options.flow_separation;
                if seeds[to].y < min_y {
                    seeds[to].y = min_y;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }

        // Phase 3: overlap removal. Overlapping pairs push apart along
        // x, keeping their left/right order (index order on ties).
        for _ in 0..options.overlap_iterations {
            let mut moved = false;
            for i in 0..seeds.len() {
                for j in (i + 1)..seeds.len() {
                    let dx = seeds[j].x - seeds[i].x;
                    let dy = seeds[j].y - seeds[i].y;
                    if dx.abs() >= options.node_spacing || dy.abs() >= options.node_spacing {
                        continue;
                    }
                    let push = (options.node_spacing - dx.abs()) / 2.0;
                    if dx >= 0.0 {
                        seeds[i].x -= push;
                        seeds[j].x += push;
                    } else {
                        seeds[i].x += push;
                        seeds[j].x -= push;
                    }
                    moved = true;
                }
            }
            if !moved {
                break;
            }
        }
        trace!(
            nodes = seeds.len(),
            edges = graph.edges.len(),
            "constrained solve complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_component_graph() -> (SolverGraph, Vec<Point>) {
        // Two chains seeded on top of each other.
        let graph = SolverGraph {
            node_count: 4,
            edges: vec![(0, 1), (2, 3)],
        };
        let seeds = vec![
            Point::new(0.0, 0.0),
            Point::new(0.0, 120.0),
            Point::new(0.0, 0.0),
            Point::new(0.0, 120.0),
        ];
        (graph, seeds)
    }

    fn options() -> SolverOptions {
        SolverOptions::for_config(&LayoutConfig::default())
    }

    #[test]
    fn from_adjacency_flattens_edges() {
        let adj = vec![vec![1, 2], vec![2], vec![]];
        let graph = SolverGraph::from_adjacency(&adj);
        assert_eq!(graph.node_count, 3);
        assert_eq!(graph.edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn flow_constraint_holds_after_solve() {
        let (graph, mut seeds) = two_component_graph();
        let options = options();
        ForceDirectedSolver::new().solve(&graph, &mut seeds, &options);
        for &(from, to) in &graph.edges {
            assert!(
                seeds[to].y >= seeds[from].y + options.flow_separation - 1e-6,
                "edge ({from},{to}) violates flow: {} vs {}",
                seeds[from].y,
                seeds[to].y
            );
        }
    }

    #[test]
    fn overlapping_seeds_are_pulled_apart() {
        let (graph, mut seeds) = two_component_graph();
        let options = options();
        ForceDirectedSolver::new().solve(&graph, &mut seeds, &options);
        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                let dx = (seeds[i].x - seeds[j].x).abs();
                let dy = (seeds[i].y - seeds[j].y).abs();
                assert!(
                    dx >= options.node_spacing - 1e-6 || dy >= options.node_spacing - 1e-6,
                    "nodes {i} and {j} still overlap"
                );
            }
        }
    }

    #[test]
    fn solve_is_deterministic() {
        let (graph, seeds) = two_component_graph();
        let options = options();
        let mut a = seeds.clone();
        let mut b = seeds;
        ForceDirectedSolver::new().solve(&graph, &mut a, &options);
        ForceDirectedSolver::new().solve(&graph, &mut b, &options);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_graph_is_a_no_op() {
        let graph = SolverGraph::default();
        let mut seeds: Vec<Point> = Vec::new();
        ForceDirectedSolver::new().solve(&graph, &mut seeds, &options());
        assert!(seeds.is_empty());
    }
}
