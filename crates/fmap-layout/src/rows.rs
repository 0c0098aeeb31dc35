//! Deterministic row seeding: top-down placement by graph depth.
//!
//! Rows are placed root-to-leaf. Each row is spread horizontally at a
//! fixed slot width; the frontier for the next row is the de-duplicated
//! set of not-yet-placed successors, ordered by a fixed kind precedence
//! so reruns produce identical rows. Three node types break the plain
//! recursion:
//!
//! - `rules` nodes are never placed inline — they are collected and
//!   placed last, to the right of the leftmost subscription that
//!   references them;
//! - `clusters` nodes get their own vertical band when the frontier also
//!   holds deployables (a hybrid row);
//! - `pod` nodes inherit the x of their owning deployment, looked up in
//!   a position map that grows as rows are placed.

use std::cmp::Ordering;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use fmap_model::{Node, NodeSpecs, NodeType};

use crate::{LayoutConfig, LayoutGraph, Point};

/// Vertical nudge for nodes with no declared shape, clearing the label
/// of the row above.
const SHAPELESS_NUDGE: f64 = 30.0;

/// Deployable ordering by wrapped template kind.
const KIND_ORDER: [&str; 4] = ["chart", "service", "deployment", "other"];

/// Seed a position for every node reachable from `roots`.
///
/// Unreachable nodes (cyclic leftovers) keep the origin; the solver
/// untangles them on multi-root graphs.
pub(crate) fn seed_rows(
    graph: &LayoutGraph<'_>,
    roots: &[usize],
    config: &LayoutConfig,
) -> Vec<Point> {
    let mut pass = RowPass {
        graph,
        config,
        positions: vec![Point::default(); graph.nodes.len()],
        placed: vec![false; graph.nodes.len()],
        position_map: FxHashMap::default(),
        deployables: Vec::new(),
        place_last: Vec::new(),
    };
    pass.place_row(0.0, roots.to_vec(), 0.0);
    pass.center_deployable_parents();
    pass.place_deferred_rules();
    pass.positions
}

struct RowPass<'g, 'a> {
    graph: &'g LayoutGraph<'a>,
    config: &'g LayoutConfig,
    positions: Vec<Point>,
    placed: Vec<bool>,
    /// Incrementally built lookup, keyed `deployment/{name}` etc., used
    /// by pod nodes to inherit their deployment's x.
    position_map: FxHashMap<String, Point>,
    deployables: Vec<usize>,
    place_last: Vec<usize>,
}

impl RowPass<'_, '_> {
    fn place_row(&mut self, y: f64, row: Vec<usize>, offset_row: f64) {
        if row.is_empty() {
            return;
        }

        // Remember deployables so their parents can be re-centered later.
        for &n in &row {
            if self.graph.nodes[n].node_type == NodeType::Deployable {
                self.deployables.push(n);
            }
        }

        let unit = self.config.unit();
        let width = row.len() as f64 * unit;

        // Normally center the row; a lone node under a lone parent sits
        // directly beneath it instead.
        let mut x = -(width / 2.0) + offset_row;
        if row.len() == 1 {
            let incomers = &self.graph.radj[row[0]];
            if incomers.len() == 1 && self.placed[incomers[0]] {
                x = self.positions[incomers[0]].x;
            }
        }

        let mut had_rule = false;
        for &n in &row {
            self.placed[n] = true;
            let node = &self.graph.nodes[n];
            let mut pos = Point::new(x, y);
            let key = match &node.node_type {
                NodeType::Subscription => {
                    // Leave a slot for the deferred rule node of the
                    // preceding subscription.
                    if had_rule {
                        x += unit;
                        pos.x = x;
                    }
                    had_rule = subscription_has_rules(node);
                    format!("subscription/{}", node.name)
                }
                NodeType::Clusters => {
                    pos.y += self.config.cluster_nudge();
                    "clusters".to_string()
                }
                NodeType::Deployment => format!("deployment/{}", node.name),
                NodeType::Pod => {
                    if let Some(owner) =
                        self.position_map.get(&format!("deployment/{}", node.name))
                    {
                        pos.x = owner.x;
                    }
                    format!("pod/{}", node.name)
                }
                other => {
                    if !other.has_shape() {
                        pos.y += SHAPELESS_NUDGE;
                    }
                    other.as_str().to_string()
                }
            };
            self.position_map.insert(key, pos);
            self.positions[n] = pos;
            x += unit;
        }

        // Build the next frontier: unplaced successors, ordered per
        // parent, de-duplicated across parents.
        let mut next_row: Vec<usize> = Vec::new();
        for &n in &row {
            let mut outgoers: SmallVec<[usize; 8]> = self.graph.adj[n]
                .iter()
                .copied()
                .filter(|&m| !self.placed[m])
                .collect();
            outgoers.sort_by(|&a, &b| {
                compare_successors(&self.graph.nodes[a], &self.graph.nodes[b])
            });
            next_row.extend(outgoers);
        }
        let mut seen = FxHashSet::default();
        next_row.retain(|&n| seen.insert(n));

        // Rules are deferred entirely; clusters leave the frontier when
        // it also holds deployables, taking their own band below.
        let mut cluster_list: Vec<usize> = Vec::new();
        let place_last = &mut self.place_last;
        next_row.retain(|&n| match self.graph.nodes[n].node_type {
            NodeType::Rules => {
                if !place_last.contains(&n) {
                    place_last.push(n);
                }
                false
            }
            NodeType::Clusters => {
                cluster_list.push(n);
                false
            }
            _ => true,
        });
        if next_row.is_empty() {
            next_row = std::mem::take(&mut cluster_list);
        }
        let hybrid = !cluster_list.is_empty();

        let next_y = y + self.config.row_pitch();
        self.place_row(next_y, next_row, if hybrid { width / 2.0 } else { 0.0 });
        if hybrid {
            self.place_row(next_y + self.config.row_pitch(), cluster_list, 0.0);
        }
    }

    /// Re-center each deployable's single parent over the midpoint of
    /// its non-rule children. Skipped entirely if any deployable has
    /// more than one parent.
    fn center_deployable_parents(&mut self) {
        let mut parents: Vec<usize> = Vec::new();
        for &d in &self.deployables {
            let incomers = &self.graph.radj[d];
            if incomers.len() != 1 {
                return;
            }
            if !parents.contains(&incomers[0]) {
                parents.push(incomers[0]);
            }
        }

        for &parent in &parents {
            let child_xs: Vec<f64> = self.graph.adj[parent]
                .iter()
                .copied()
                .filter(|&c| self.graph.nodes[c].node_type != NodeType::Rules)
                .filter(|&c| self.placed[c])
                .map(|c| self.positions[c].x)
                .collect();
            let Some(first) = child_xs.first().copied() else {
                continue;
            };
            let (min, max) = child_xs
                .iter()
                .fold((first, first), |(lo, hi), &x| (lo.min(x), hi.max(x)));
            let x = (min + max) / 2.0;
            self.positions[parent].x = x;

            // A re-centered clusters row drags its lone subscription along.
            if self.graph.nodes[parent].node_type == NodeType::Clusters {
                let incomers = &self.graph.radj[parent];
                if incomers.len() == 1
                    && self.graph.nodes[incomers[0]].node_type == NodeType::Subscription
                {
                    self.positions[incomers[0]].x = x;
                }
            }
        }
    }

    /// Place deferred rule nodes one slot right of the leftmost
    /// subscription that references them, at that row's height.
    fn place_deferred_rules(&mut self) {
        for idx in 0..self.place_last.len() {
            let rule = self.place_last[idx];
            let subscriptions = &self.graph.radj[rule];
            let Some(&first) = subscriptions.first() else {
                continue;
            };
            let y = self.positions[first].y;
            let mut x = self.positions[first].x;
            for &sub in &subscriptions[1..] {
                if self.positions[sub].x < x {
                    x = self.positions[sub].x;
                }
            }
            self.positions[rule] = Point::new(x + self.config.unit(), y);
            self.placed[rule] = true;
        }
    }
}

fn subscription_has_rules(node: &Node) -> bool {
    matches!(node.specs, NodeSpecs::Subscription { has_rules: true, .. })
}

fn subscription_is_placed(node: &Node) -> bool {
    matches!(node.specs, NodeSpecs::Subscription { is_placed: true, .. })
}

fn deployable_kind_rank(node: &Node) -> usize {
    let kind = match &node.specs {
        NodeSpecs::Deployable { template_kind, .. } => {
            template_kind.as_deref().unwrap_or("other")
        }
        _ => "other",
    };
    KIND_ORDER
        .iter()
        .position(|k| k.eq_ignore_ascii_case(kind))
        .unwrap_or(10)
}

/// Frontier ordering: placed subscriptions before unplaced ones (then by
/// name), deployables by wrapped template kind; mixed pairs keep their
/// incoming order.
fn compare_successors(a: &Node, b: &Node) -> Ordering {
    match (&a.node_type, &b.node_type) {
        (NodeType::Subscription, NodeType::Subscription) => subscription_is_placed(b)
            .cmp(&subscription_is_placed(a))
            .then_with(|| a.name.cmp(&b.name)),
        (NodeType::Deployable, NodeType::Deployable) => {
            deployable_kind_rank(a).cmp(&deployable_kind_rank(b))
        }
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{LayoutConfig, LayoutGraph};
    use fmap_model::Link;

    fn node(node_type: NodeType, name: &str) -> Node {
        Node::new(node_type, name)
    }

    fn subscription(name: &str, has_rules: bool) -> Node {
        let mut n = Node::new(NodeType::Subscription, name);
        if let NodeSpecs::Subscription { has_rules: hr, .. } = &mut n.specs {
            *hr = has_rules;
        }
        n
    }

    fn link(from: &Node, to: &Node) -> Link {
        Link::new(from.id.clone(), to.id.clone())
    }

    fn seed(nodes: &[Node], links: &[Link]) -> Vec<Point> {
        let graph = LayoutGraph::new(nodes, links);
        let roots = graph.roots();
        seed_rows(&graph, &roots, &LayoutConfig::default())
    }

    #[test]
    fn chain_descends_one_row_per_depth() {
        let app = node(NodeType::Application, "app");
        let sub = subscription("sub", false);
        let dep = node(NodeType::Deployable, "dep");
        let links = vec![link(&app, &sub), link(&sub, &dep)];
        let nodes = vec![app, sub, dep];
        let points = seed(&nodes, &links);
        assert_eq!(points[0].y, 0.0);
        assert_eq!(points[1].y, 120.0);
        assert_eq!(points[2].y, 240.0);
        // Lone children inherit the parent x all the way down.
        assert_eq!(points[0].x, points[1].x);
        assert_eq!(points[1].x, points[2].x);
    }

    #[test]
    fn clusters_rows_get_the_vertical_nudge() {
        let sub = subscription("sub", false);
        let clusters = node(NodeType::Clusters, "clusters");
        let links = vec![link(&sub, &clusters)];
        let nodes = vec![sub, clusters];
        let points = seed(&nodes, &links);
        assert_eq!(points[1].y, 120.0 + 25.0);
    }

    #[test]
    fn shapeless_nodes_clear_the_label() {
        let dep = node(NodeType::Deployment, "web");
        let custom = node(NodeType::Other("sidecar".to_string()), "proxy");
        let links = vec![link(&dep, &custom)];
        let nodes = vec![dep, custom];
        let points = seed(&nodes, &links);
        assert_eq!(points[1].y, 120.0 + 30.0);
    }

    #[test]
    fn pods_inherit_their_deployment_x() {
        let app = node(NodeType::Application, "app");
        let web = node(NodeType::Deployment, "web");
        let api = node(NodeType::Deployment, "api");
        let pod = node(NodeType::Pod, "web");
        let links = vec![
            link(&app, &web),
            link(&app, &api),
            link(&web, &pod),
            link(&api, &pod),
        ];
        let nodes = vec![app, web, api, pod];
        let points = seed(&nodes, &links);
        assert_eq!(points[3].x, points[1].x, "pod sits under deployment web");
    }

    #[test]
    fn ruled_subscription_leaves_a_slot_for_its_rules() {
        let app = node(NodeType::Application, "app");
        let sub1 = subscription("sub1", true);
        let sub2 = subscription("sub2", false);
        let rules = node(NodeType::Rules, "placement");
        let links = vec![
            link(&app, &sub1),
            link(&app, &sub2),
            link(&sub1, &rules),
        ];
        let nodes = vec![app, sub1, sub2, rules];
        let points = seed(&nodes, &links);
        // sub1 at -150; sub2 skips the reserved slot and lands at 150.
        assert_eq!(points[1].x, -150.0);
        assert_eq!(points[2].x, 150.0);
        // The rules node fills the reserved slot at the row's height.
        assert_eq!(points[3], Point::new(0.0, 120.0));
    }

    #[test]
    fn rules_prefer_the_leftmost_referencing_subscription() {
        let app = node(NodeType::Application, "app");
        let sub1 = subscription("sub1", true);
        let sub2 = subscription("sub2", true);
        let rules = node(NodeType::Rules, "placement");
        let links = vec![
            link(&app, &sub1),
            link(&app, &sub2),
            link(&sub1, &rules),
            link(&sub2, &rules),
        ];
        let nodes = vec![app, sub1, sub2, rules];
        let points = seed(&nodes, &links);
        let leftmost = points[1].x.min(points[2].x);
        assert_eq!(points[3].x, leftmost + 150.0);
    }

    #[test]
    fn hybrid_frontier_splits_clusters_into_their_own_band() {
        let sub = subscription("sub", false);
        let dep = node(NodeType::Deployable, "dep");
        let clusters = node(NodeType::Clusters, "clusters");
        let links = vec![link(&sub, &dep), link(&sub, &clusters)];
        let nodes = vec![sub, dep, clusters];
        let points = seed(&nodes, &links);
        assert_eq!(points[1].y, 120.0);
        // Clusters land one band lower, plus their nudge.
        assert_eq!(points[2].y, 240.0 + 25.0);
    }

    #[test]
    fn deployables_order_by_template_kind() {
        let sub = subscription("sub", false);
        let mk = |name: &str, kind: &str| {
            let mut n = node(NodeType::Deployable, name);
            if let NodeSpecs::Deployable { template_kind, .. } = &mut n.specs {
                *template_kind = Some(kind.to_string());
            }
            n
        };
        let d_other = mk("zz", "ConfigMap");
        let d_chart = mk("chart", "chart");
        let d_service = mk("svc", "Service");
        let links = vec![
            link(&sub, &d_other),
            link(&sub, &d_chart),
            link(&sub, &d_service),
        ];
        let nodes = vec![sub, d_other, d_chart, d_service];
        let points = seed(&nodes, &links);
        // chart < service < unknown kind, left to right.
        assert!(points[2].x < points[3].x);
        assert!(points[3].x < points[1].x);
    }

    #[test]
    fn lone_parent_recenters_over_deployables() {
        let sub = subscription("sub", false);
        let d1 = node(NodeType::Deployable, "d1");
        let d2 = node(NodeType::Deployable, "d2");
        let d3 = node(NodeType::Deployable, "d3");
        let links = vec![link(&sub, &d1), link(&sub, &d2), link(&sub, &d3)];
        let nodes = vec![sub, d1, d2, d3];
        let points = seed(&nodes, &links);
        let (min, max) = (points[1].x.min(points[2].x).min(points[3].x),
                          points[1].x.max(points[2].x).max(points[3].x));
        assert_eq!(points[0].x, (min + max) / 2.0);
    }

    #[test]
    fn shared_deployables_skip_recentering() {
        let sub_a = subscription("a", false);
        let sub_b = subscription("b", false);
        let shared = node(NodeType::Deployable, "shared");
        let links = vec![link(&sub_a, &shared), link(&sub_b, &shared)];
        let nodes = vec![sub_a, sub_b, shared];
        let graph = LayoutGraph::new(&nodes, &links);
        let roots = graph.roots();
        let before = seed_rows(&graph, &roots, &LayoutConfig::default());
        // Two parents: the centering pass must leave the row placement alone.
        assert_eq!(before[0].x, -150.0);
        assert_eq!(before[1].x, 0.0);
    }

    #[test]
    fn seeding_is_deterministic() {
        let app = node(NodeType::Application, "app");
        let sub1 = subscription("s1", true);
        let sub2 = subscription("s2", false);
        let rules = node(NodeType::Rules, "r");
        let clusters = node(NodeType::Clusters, "clusters");
        let dep = node(NodeType::Deployable, "d");
        let links = vec![
            link(&app, &sub1),
            link(&app, &sub2),
            link(&sub1, &rules),
            link(&sub1, &clusters),
            link(&sub1, &dep),
            link(&sub2, &clusters),
        ];
        let nodes = vec![app, sub1, sub2, rules, clusters, dep];
        assert_eq!(seed(&nodes, &links), seed(&nodes, &links));
    }
}
