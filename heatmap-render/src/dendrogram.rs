//! Dendrogram geometry: cluster layout of a `ClusterTree` and elbow links.
//!
//! Trees are laid out in "tree space" first: `along` runs parallel to the grid
//! axis the tree orders, `depth` runs from the root (0) to the leaves
//! (`depth_extent`). Each axis then maps tree space onto its container.

use heatmap_core::{Axis, ClusterTree, Layout, NodeId, Point};
use serde::Serialize;

/// One parent → child edge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramLink {
    pub source: NodeId,
    pub target: NodeId,
    /// Elbow path in container coordinates
    pub points: Vec<Point>,
    /// Hover target rectangle in container coordinates: x, y, width, height
    pub hit_box: (f64, f64, f64, f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DendrogramLayout {
    pub axis: Axis,
    pub links: Vec<DendrogramLink>,
}

impl DendrogramLayout {
    /// Link whose hover target contains `point` (container coordinates).
    /// Deeper links win when targets overlap.
    pub fn link_at(&self, point: Point) -> Option<&DendrogramLink> {
        self.links.iter().rev().find(|link| {
            let (x, y, w, h) = link.hit_box;
            point.x >= x && point.x <= x + w && point.y >= y && point.y <= y + h
        })
    }

    /// Links whose source lies in the subtree rooted at `source`
    pub fn subtree_links(&self, tree: &ClusterTree, source: NodeId) -> Vec<usize> {
        let subtree = tree.descendants(source);
        self.links
            .iter()
            .enumerate()
            .filter(|(_, link)| subtree.contains(&link.source))
            .map(|(i, _)| i)
            .collect()
    }
}

/// Node coordinates in tree space, indexed by node id
struct TreeSpace {
    along: Vec<f64>,
    depth: Vec<f64>,
}

fn cluster_layout(tree: &ClusterTree, extent: f64, depth_extent: f64) -> TreeSpace {
    let n = tree.len();
    let mut along = vec![0.0; n];
    let leaves = tree.leaf_nodes();
    let leaf_count = leaves.len().max(1) as f64;
    for (i, id) in leaves.iter().enumerate() {
        along[*id] = (i as f64 + 0.5) / leaf_count * extent;
    }
    // Ascending ids visit children before parents
    for id in 0..n {
        let node = tree.node(id);
        if let (Some(left), Some(right)) = (node.left, node.right) {
            along[id] = (along[left] + along[right]) / 2.0;
        }
    }

    let heights = tree.heights();
    let root_height = heights[tree.root()] as f64;
    let depth = heights
        .iter()
        .map(|&h| {
            let t = if root_height > 0.0 { h as f64 / root_height } else { 1.0 };
            (1.0 - t) * depth_extent
        })
        .collect();

    TreeSpace { along, depth }
}

/// Lay out the dendrogram for `axis`. Trees of depth 0 draw nothing.
///
/// `offset` is the number of grid positions before the first clustered item
/// (the pinned block on the column axis).
pub fn layout_dendrogram(tree: &ClusterTree, axis: Axis, layout: &Layout, offset: usize, spacing: f64) -> Option<DendrogramLayout> {
    if tree.depth() == 0 {
        return None;
    }
    let leaf_count = tree.leaf_nodes().len() as f64;

    let (extent, depth_extent) = match axis {
        Axis::Rows => (layout.cell.height * leaf_count, layout.row_cluster_width - 10.0),
        Axis::Columns => (layout.cell.width * leaf_count, layout.column_cluster_height - spacing),
    };
    let space = cluster_layout(tree, extent, depth_extent);

    let row_cluster_width = layout.row_cluster_width;
    let column_cluster_height = layout.column_cluster_height;
    let shift = offset as f64 * layout.cell.width;
    let to_container = |along: f64, depth: f64| match axis {
        Axis::Rows => Point::new(row_cluster_width - depth, along),
        Axis::Columns => Point::new(along + shift, column_cluster_height - depth),
    };

    let mut links = Vec::new();
    for (source, node) in tree.nodes().iter().enumerate() {
        let (Some(left), Some(right)) = (node.left, node.right) else {
            continue;
        };
        let child_depth = space.depth[left].max(space.depth[right]);
        for target in [left, right] {
            let (sa, sd) = (space.along[source], space.depth[source]);
            let (ta, td) = (space.along[target], space.depth[target]);
            let points = vec![to_container(sa, sd), to_container(ta, sd), to_container(ta, td)];

            // Hover box in tree space, then mapped through its two corners
            let depth_span = (child_depth - sd).abs() + spacing;
            let a = to_container(sa.min(ta), sd);
            let b = to_container(sa.max(ta), sd + depth_span);
            let hit_box = (a.x.min(b.x), a.y.min(b.y), (a.x - b.x).abs(), (a.y - b.y).abs());

            links.push(DendrogramLink {
                source,
                target,
                points,
                hit_box,
            });
        }
    }

    Some(DendrogramLayout { axis, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use heatmap_core::{hcluster, place_containers, HeatmapOptions, LayoutInput, Observation};

    fn tree(values: &[f64]) -> ClusterTree {
        let observations: Vec<Observation> = values
            .iter()
            .enumerate()
            .map(|(idx, v)| Observation { idx, values: vec![*v] })
            .collect();
        let mut tree = hcluster(&observations).unwrap();
        tree.sort();
        tree
    }

    fn layout(rows: usize, columns: usize) -> Layout {
        place_containers(
            &LayoutInput {
                row_labels_width: 100.0,
                column_labels_height: 50.0,
                column_count: columns,
                visible_row_count: rows,
                metadata_track_count: 0,
                row_depth: 2,
                column_depth: 2,
            },
            &HeatmapOptions::default(),
        )
    }

    #[test]
    fn test_single_leaf_draws_nothing() {
        let t = tree(&[1.0]);
        assert!(layout_dendrogram(&t, Axis::Columns, &layout(3, 1), 0, 10.0).is_none());
    }

    #[test]
    fn test_every_edge_becomes_a_link() {
        let t = tree(&[0.0, 0.1, 5.0]);
        let d = layout_dendrogram(&t, Axis::Rows, &layout(3, 3), 0, 10.0).unwrap();
        assert_eq!(d.links.len(), 4);
        assert!(d.links.iter().all(|l| l.points.len() == 3));
    }

    #[test]
    fn test_row_leaves_sit_at_cell_centers() {
        let t = tree(&[0.0, 1.0]);
        let l = layout(2, 2);
        let d = layout_dendrogram(&t, Axis::Rows, &l, 0, 10.0).unwrap();
        let mut ys: Vec<f64> = d.links.iter().map(|link| link.points[2].y).collect();
        ys.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((ys[0] - l.cell.height / 2.0).abs() < 1e-9);
        assert!((ys[1] - 1.5 * l.cell.height).abs() < 1e-9);
        // Leaves reach the edge next to the grid
        assert!(d.links.iter().all(|link| (link.points[2].x - 10.0).abs() < 1e-9));
    }

    #[test]
    fn test_column_links_shift_past_pinned_block() {
        let t = tree(&[0.0, 1.0]);
        let l = layout(2, 4);
        let d = layout_dendrogram(&t, Axis::Columns, &l, 2, 10.0).unwrap();
        let min_x = d
            .links
            .iter()
            .flat_map(|link| link.points.iter().map(|p| p.x))
            .fold(f64::INFINITY, f64::min);
        assert!((min_x - 2.5 * l.cell.width).abs() < 1e-9);
    }

    #[test]
    fn test_hit_test_finds_link() {
        let t = tree(&[0.0, 1.0]);
        let d = layout_dendrogram(&t, Axis::Rows, &layout(2, 2), 0, 10.0).unwrap();
        let link = &d.links[0];
        let (x, y, w, h) = link.hit_box;
        let found = d.link_at(Point::new(x + w / 2.0, y + h / 2.0)).unwrap();
        assert_eq!(found.source, link.source);
    }
}
