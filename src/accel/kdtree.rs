use std::f32::consts::PI;

use log::{debug, trace};

use super::node::{KdTreeNode, NodeKind};
use crate::geometry::AABB;

/// Deepest level a node may sit at (the root is depth 0). The kernel sizes its
/// traversal stack from the same value, so the two must change together.
pub const MAX_KD_DEPTH: u32 = 6;

/// Flattened kd-tree, ready for upload. Node 0 is the root.
#[derive(Debug, Default)]
pub struct KdTree {
    pub nodes: Vec<KdTreeNode>,
    pub indices: Vec<u32>,
}

#[derive(Clone, Copy, Debug)]
struct Split {
    axis: usize,
    position: f32,
    score: f32,
}

struct Builder<'a> {
    object_bounds: &'a [AABB],
    nodes: Vec<KdTreeNode>,
    indices: Vec<u32>,
}

impl KdTree {
    /// Build the tree over `object_bounds`, whose union must be `scene_bounds`.
    ///
    /// The caller is responsible for `scene_bounds`; for an empty scene any
    /// box will do and the result is a single empty leaf.
    pub fn build(scene_bounds: AABB, object_bounds: &[AABB]) -> KdTree {
        let mut builder = Builder {
            object_bounds,
            nodes: Vec::new(),
            indices: Vec::new(),
        };
        let candidates: Vec<u32> = (0..object_bounds.len() as u32).collect();
        builder.build_node(scene_bounds, candidates, 0);

        let tree = KdTree { nodes: builder.nodes, indices: builder.indices };
        debug!(
            "built kd-tree over {} objects: {} nodes, {} leaves, {} shared indices, depth {}",
            object_bounds.len(),
            tree.nodes.len(),
            tree.nodes.iter().filter(|n| n.is_leaf()).count(),
            tree.indices.len(),
            tree.depth()
        );
        tree
    }

    pub fn root(&self) -> &KdTreeNode {
        &self.nodes[0]
    }

    /// Primitive indices referenced by `node`, empty for interior nodes
    pub fn leaf_primitives(&self, node: &KdTreeNode) -> Vec<u32> {
        match node.kind() {
            NodeKind::Interior { .. } | NodeKind::Leaf { count: 0, .. } => Vec::new(),
            NodeKind::Leaf { count: 1, first } => vec![first],
            NodeKind::Leaf { count, first } => self.indices[first as usize..(first + count) as usize].to_vec(),
        }
    }

    /// Length of the longest root-to-leaf path, counted in edges
    pub fn depth(&self) -> u32 {
        if self.nodes.is_empty() {
            return 0;
        }
        let mut deepest = 0;
        let mut stack = vec![(0u32, 0u32)];
        while let Some((index, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let NodeKind::Interior { above_child, .. } = self.nodes[index as usize].kind() {
                stack.push((index + 1, depth + 1));
                stack.push((above_child, depth + 1));
            }
        }
        deepest
    }
}

impl Builder<'_> {
    fn build_node(&mut self, bounds: AABB, candidates: Vec<u32>, depth: u32) {
        let node_index = self.nodes.len();
        self.nodes.push(KdTreeNode::new(bounds));

        let split = if depth >= MAX_KD_DEPTH || candidates.is_empty() {
            None
        } else {
            self.choose_split(&bounds, &candidates)
        };

        let Some(Split { axis, position, score }) = split else {
            self.make_leaf(node_index, &candidates);
            return;
        };
        trace!("node {node_index}: split {} objects on axis {axis} at {position} (score {score})", candidates.len());

        let (below, above): (Vec<u32>, Vec<u32>) = (
            candidates.iter().copied().filter(|&i| {
                let b = &self.object_bounds[i as usize];
                goes_below(b.minimum[axis], b.maximum[axis], position)
            }).collect(),
            candidates.iter().copied().filter(|&i| goes_above(self.object_bounds[i as usize].maximum[axis], position)).collect(),
        );
        drop(candidates);

        let (below_bounds, above_bounds) = bounds.split(axis, position);
        self.build_node(below_bounds, below, depth + 1);
        let above_child = self.nodes.len() as u32;
        self.nodes[node_index].make_interior(axis, position, above_child);
        self.build_node(above_bounds, above, depth + 1);
    }

    fn make_leaf(&mut self, node_index: usize, candidates: &[u32]) {
        let node = &mut self.nodes[node_index];
        match candidates {
            [] => node.make_leaf(0, 0),
            [only] => node.make_leaf(1, *only),
            _ => {
                let offset = self.indices.len() as u32;
                self.indices.extend_from_slice(candidates);
                node.make_leaf(candidates.len() as u32, offset);
            }
        }
    }

    /// Best-scoring plane among every candidate's extent endpoints, or `None`
    /// if no plane scores above zero
    fn choose_split(&self, bounds: &AABB, candidates: &[u32]) -> Option<Split> {
        let total = candidates.len();
        let mut best: Option<Split> = None;
        let mut best_score = 0.0;
        let mut extents = Vec::with_capacity(total);

        for axis in 0..3 {
            let (lower, upper) = (bounds.minimum[axis], bounds.maximum[axis]);
            extents.clear();
            extents.extend(candidates.iter().map(|&i| {
                let b = &self.object_bounds[i as usize];
                (b.minimum[axis], b.maximum[axis])
            }));

            for &(extent_lower, extent_upper) in extents.iter() {
                for position in [extent_lower, extent_upper] {
                    if position < lower || position > upper {
                        continue;
                    }
                    let below = extents.iter().filter(|(l, u)| goes_below(*l, *u, position)).count();
                    let above = extents.iter().filter(|(_, u)| goes_above(*u, position)).count();
                    let score = split_score(lower, upper, position, below, above, total);
                    if score > best_score {
                        best_score = score;
                        best = Some(Split { axis, position, score });
                    }
                }
            }
        }

        best
    }
}

// an object starting before the plane belongs below it; one ending after it belongs
// above; straddlers belong to both. Zero-width extents lying on the plane go below
// so that flat objects are never dropped.
fn goes_below(extent_lower: f32, extent_upper: f32, position: f32) -> bool {
    extent_lower < position || (extent_lower == position && extent_upper == position)
}

fn goes_above(extent_upper: f32, position: f32) -> bool {
    extent_upper > position
}

/// How desirable the plane `position` is for a node spanning `lower..upper`.
///
/// With primitives on both sides this is `sin(pi * below / total) * sin(pi * above / total)`,
/// which peaks for an even split and drops to zero as straddlers pile onto
/// both sides. With one side empty it is the fraction of the range that side
/// covers, so planes that cut away the most empty space win.
pub(crate) fn split_score(lower: f32, upper: f32, position: f32, below: usize, above: usize, total: usize) -> f32 {
    let range = upper - lower;
    if total == 0 || range <= 0.0 {
        return 0.0;
    }
    match (below, above) {
        (0, 0) => 0.0,
        (_, 0) => (upper - position) / range,
        (0, _) => (position - lower) / range,
        _ => {
            let total = total as f32;
            f32::sin(PI * below as f32 / total) * f32::sin(PI * above as f32 / total)
        }
    }
}
