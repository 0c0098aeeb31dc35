//! Grid placement for elements with no edges.
//!
//! Unconnected elements never enter the row pass; they sit below the
//! diagram on a label-sorted grid whose column count the caller picks
//! per section.

use std::collections::BTreeMap;

use fmap_model::NodeId;

use crate::{LayoutConfig, Point};

/// Vertical pitch factor for grid cells.
const GRID_ROW_FACTOR: f64 = 2.7;

/// Place unconnected elements on a grid, sorted by display label.
///
/// `columns` bounds the grid width; the actual column count is the
/// smaller of the element count and the bound, never zero.
#[must_use]
pub fn grid_layout(
    elements: &[(NodeId, String)],
    columns: usize,
    config: &LayoutConfig,
) -> BTreeMap<NodeId, Point> {
    let count = elements.len();
    if count == 0 {
        return BTreeMap::new();
    }
    let cols = count.min(columns).max(1);

    let mut sorted: Vec<&(NodeId, String)> = elements.iter().collect();
    sorted.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));

    let cell_w = config.unit();
    let cell_h = config.node_size * GRID_ROW_FACTOR;
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, (id, _))| {
            let col = index % cols;
            let row = index / cols;
            (
                id.clone(),
                Point::new(col as f64 * cell_w, row as f64 * cell_h),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmap_model::NodeType;

    fn element(name: &str) -> (NodeId, String) {
        (
            NodeId::design(&NodeType::Service, name),
            name.to_string(),
        )
    }

    #[test]
    fn empty_input_gives_empty_grid() {
        let placed = grid_layout(&[], 4, &LayoutConfig::default());
        assert!(placed.is_empty());
    }

    #[test]
    fn grid_is_label_sorted_row_major() {
        let elements = vec![element("charlie"), element("alpha"), element("bravo")];
        let placed = grid_layout(&elements, 2, &LayoutConfig::default());

        let alpha = placed[&elements[1].0];
        let bravo = placed[&elements[2].0];
        let charlie = placed[&elements[0].0];
        assert_eq!(alpha, Point::new(0.0, 0.0));
        assert_eq!(bravo, Point::new(150.0, 0.0));
        assert_eq!(charlie, Point::new(0.0, 135.0));
    }

    #[test]
    fn column_bound_is_respected() {
        let elements: Vec<_> = (0..6).map(|i| element(&format!("svc-{i}"))).collect();
        let placed = grid_layout(&elements, 3, &LayoutConfig::default());
        let max_x = placed.values().map(|p| p.x).fold(0.0f64, f64::max);
        assert!(max_x <= 2.0 * 150.0);
        assert_eq!(placed.len(), 6);
    }

    #[test]
    fn fewer_elements_than_columns_stay_on_one_row() {
        let elements = vec![element("a"), element("b")];
        let placed = grid_layout(&elements, 5, &LayoutConfig::default());
        assert!(placed.values().all(|p| p.y == 0.0));
    }
}
