/*!
# Hierarchical clustering

Average-linkage agglomerative clustering with Euclidean distance. Trees are
stored in an arena: nodes live in a flat `Vec` and refer to children by index.
Children are always created before their parent, so ascending node order is a
valid post-order and descending order visits parents before children.
*/

use serde::Serialize;

pub type NodeId = usize;

/// One point to cluster: the label index it belongs to and its coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub idx: usize,
    pub values: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterNode {
    pub left: Option<NodeId>,
    pub right: Option<NodeId>,
    /// Label index, for leaves only
    pub idx: Option<usize>,
    /// Coordinates, for leaves only
    pub value: Vec<f64>,
    /// Leaf: mean of `value`. Internal: the larger child mean.
    pub mean: f64,
    /// Linkage distance at which the node was formed (0 for leaves)
    pub distance: f64,
}

impl ClusterNode {
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterTree {
    nodes: Vec<ClusterNode>,
    root: NodeId,
}

impl ClusterTree {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> &ClusterNode {
        &self.nodes[id]
    }

    pub fn nodes(&self) -> &[ClusterNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Swap children so the subtree with the higher mean comes first.
    pub fn sort(&mut self) {
        for id in 0..self.nodes.len() {
            match (self.nodes[id].left, self.nodes[id].right) {
                (Some(left), Some(right)) => {
                    let (left_mean, right_mean) = (self.nodes[left].mean, self.nodes[right].mean);
                    let node = &mut self.nodes[id];
                    if left_mean < right_mean {
                        node.left = Some(right);
                        node.right = Some(left);
                    }
                    node.mean = left_mean.max(right_mean);
                }
                _ => {
                    let node = &mut self.nodes[id];
                    node.mean = mean(&node.value);
                }
            }
        }
    }

    /// Maximum number of edges from the root to a leaf
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max_depth = 0;
        for id in (0..self.nodes.len()).rev() {
            let d = depths[id];
            max_depth = max_depth.max(d);
            for child in [self.nodes[id].left, self.nodes[id].right].into_iter().flatten() {
                depths[child] = d + 1;
            }
        }
        max_depth
    }

    /// Leaf node ids in in-order (display) sequence
    pub fn leaf_nodes(&self) -> Vec<NodeId> {
        let mut order = Vec::new();
        let mut stack = Vec::new();
        let mut current = Some(self.root);
        loop {
            if let Some(id) = current {
                stack.push(id);
                current = self.nodes[id].left;
            } else if let Some(id) = stack.pop() {
                if self.nodes[id].is_leaf() {
                    order.push(id);
                }
                current = self.nodes[id].right;
            } else {
                break;
            }
        }
        order
    }

    /// Leaf label indices in display sequence
    pub fn leaf_order(&self) -> Vec<usize> {
        self.leaf_nodes()
            .into_iter()
            .filter_map(|id| self.nodes[id].idx)
            .collect()
    }

    /// Edges from each node down to its deepest leaf, indexed by node id
    pub fn heights(&self) -> Vec<usize> {
        let mut heights = vec![0usize; self.nodes.len()];
        for id in 0..self.nodes.len() {
            let node = &self.nodes[id];
            heights[id] = [node.left, node.right]
                .into_iter()
                .flatten()
                .map(|child| heights[child] + 1)
                .max()
                .unwrap_or(0);
        }
        heights
    }

    /// `(label index, pos)` pairs with positions starting at `offset`
    pub fn positions(&self, offset: usize) -> Vec<(usize, usize)> {
        self.leaf_order()
            .into_iter()
            .enumerate()
            .map(|(i, idx)| (idx, offset + i))
            .collect()
    }

    /// `id` and every node below it
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(self.nodes[node].left);
            stack.extend(self.nodes[node].right);
        }
        out
    }

    /// Label indices of the leaves under `id`
    pub fn leaves_under(&self, id: NodeId) -> Vec<usize> {
        self.descendants(id)
            .into_iter()
            .filter_map(|node| self.nodes[node].idx)
            .collect()
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}

/// Cluster `observations` into a binary tree.
///
/// Returns `None` for empty input and a single-leaf tree for one observation.
/// Ties are broken by the lowest pair of cluster slots, so identical input
/// always yields the identical tree.
pub fn hcluster(observations: &[Observation]) -> Option<ClusterTree> {
    let n = observations.len();
    if n == 0 {
        return None;
    }

    let mut nodes: Vec<ClusterNode> = observations
        .iter()
        .map(|obs| ClusterNode {
            left: None,
            right: None,
            idx: Some(obs.idx),
            value: obs.values.clone(),
            mean: mean(&obs.values),
            distance: 0.0,
        })
        .collect();

    // slot -> (node id, member count); merged-away slots become None
    let mut slots: Vec<Option<(NodeId, usize)>> = (0..n).map(|i| Some((i, 1))).collect();
    let mut dist = vec![vec![0.0f64; n]; n];
    for i in 0..n {
        for j in (i + 1)..n {
            let d = euclidean(&observations[i].values, &observations[j].values);
            dist[i][j] = d;
            dist[j][i] = d;
        }
    }

    for _ in 1..n {
        let mut best: Option<(usize, usize, f64)> = None;
        for i in 0..n {
            if slots[i].is_none() {
                continue;
            }
            for j in (i + 1)..n {
                if slots[j].is_none() {
                    continue;
                }
                let d = dist[i][j];
                if best.map_or(true, |(_, _, b)| d < b) {
                    best = Some((i, j, d));
                }
            }
        }
        let Some((i, j, d)) = best else { break };
        let (Some((left, size_i)), Some((right, size_j))) = (slots[i], slots[j]) else {
            break;
        };

        let id = nodes.len();
        nodes.push(ClusterNode {
            left: Some(left),
            right: Some(right),
            idx: None,
            value: Vec::new(),
            mean: 0.0,
            distance: d,
        });

        // Lance-Williams update for average linkage
        let total = (size_i + size_j) as f64;
        for k in 0..n {
            if k == i || k == j || slots[k].is_none() {
                continue;
            }
            let merged = (size_i as f64 * dist[i][k] + size_j as f64 * dist[j][k]) / total;
            dist[i][k] = merged;
            dist[k][i] = merged;
        }
        slots[i] = Some((id, size_i + size_j));
        slots[j] = None;
    }

    let root = nodes.len() - 1;
    Some(ClusterTree { nodes, root })
}
