use bytemuck::{Pod, Zeroable};

use crate::geometry::{ClFloat3, Vec3, AABB};

const TAG_BITS: u32 = 2;
const TAG_MASK: u32 = (1 << TAG_BITS) - 1;
const LEAF_TAG: u32 = 3;

/// Largest child index or primitive count that fits beside the tag
pub const MAX_NODE_PAYLOAD: u32 = u32::MAX >> TAG_BITS;

/// One kd-tree node exactly as the kernel reads it.
///
/// Bit layout, little end first:
/// - `payload`: split position (`f32` bits) for interior nodes; for leaves the
///   only primitive index, the offset into the index array, or 0 when empty
/// - `flags`: bits 0..2 hold the tag (0, 1, 2 = interior split axis, 3 = leaf);
///   bits 2..32 hold the above child's index or the leaf's primitive count
/// - `lower_bound`, `upper_bound`: the node's own bounds, for traversal pruning
///
/// The below child of an interior node is always stored directly after it.
#[repr(C, packed)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct KdTreeNode {
    payload: u32,
    flags: u32,
    pub lower_bound: ClFloat3,
    pub upper_bound: ClFloat3,
}

/// Decoded view of a [`KdTreeNode`]
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum NodeKind {
    Interior {
        axis: usize,
        split: f32,
        above_child: u32,
    },
    Leaf {
        count: u32,
        /// Sole primitive index if `count == 1`, index array offset if `count > 1`
        first: u32,
    },
}

impl KdTreeNode {
    /// Empty leaf spanning `bounds`; every node starts out like this until classified
    pub fn new(bounds: AABB) -> KdTreeNode {
        KdTreeNode {
            payload: 0,
            flags: LEAF_TAG,
            lower_bound: bounds.minimum.into(),
            upper_bound: bounds.maximum.into(),
        }
    }

    pub fn make_leaf(&mut self, count: u32, first: u32) {
        debug_assert!(count <= MAX_NODE_PAYLOAD);
        self.payload = first;
        self.flags = (count << TAG_BITS) | LEAF_TAG;
    }

    pub fn make_interior(&mut self, axis: usize, split: f32, above_child: u32) {
        debug_assert!(axis < 3);
        debug_assert!(above_child <= MAX_NODE_PAYLOAD);
        self.payload = split.to_bits();
        self.flags = (above_child << TAG_BITS) | axis as u32;
    }

    pub fn is_leaf(&self) -> bool {
        self.flags & TAG_MASK == LEAF_TAG
    }

    pub fn kind(&self) -> NodeKind {
        let flags = self.flags;
        let payload = self.payload;
        match flags & TAG_MASK {
            LEAF_TAG => NodeKind::Leaf { count: flags >> TAG_BITS, first: payload },
            axis => NodeKind::Interior {
                axis: axis as usize,
                split: f32::from_bits(payload),
                above_child: flags >> TAG_BITS,
            },
        }
    }

    pub fn bounds(&self) -> AABB {
        let lower: Vec3 = { self.lower_bound }.into();
        let upper: Vec3 = { self.upper_bound }.into();
        AABB::new(lower, upper)
    }
}

impl std::fmt::Debug for KdTreeNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KdTreeNode")
            .field("kind", &self.kind())
            .field("bounds", &self.bounds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_node() -> KdTreeNode {
        KdTreeNode::new(AABB::new(Vec3::zero(), Vec3::splat(1.0)))
    }

    #[test]
    fn node_matches_kernel_layout() {
        assert_eq!(std::mem::size_of::<KdTreeNode>(), 40);
    }

    #[test]
    fn fresh_node_is_empty_leaf() {
        let node = unit_node();
        assert!(node.is_leaf());
        assert_eq!(node.kind(), NodeKind::Leaf { count: 0, first: 0 });
    }

    #[test]
    fn interior_encoding_decodes() {
        let mut node = unit_node();
        node.make_interior(2, 0.25, 17);
        assert!(!node.is_leaf());
        assert_eq!(node.kind(), NodeKind::Interior { axis: 2, split: 0.25, above_child: 17 });

        let words: [u32; 10] = bytemuck::cast(node);
        assert_eq!(words[0], 0.25f32.to_bits());
        assert_eq!(words[1], (17 << 2) | 2);
    }

    #[test]
    fn leaf_encoding_decodes() {
        let mut node = unit_node();
        node.make_leaf(5, 12);
        assert_eq!(node.kind(), NodeKind::Leaf { count: 5, first: 12 });

        let words: [u32; 10] = bytemuck::cast(node);
        assert_eq!(words[1], (5 << 2) | 3);
    }

    #[test]
    fn bounds_survive_packing() {
        let bounds = AABB::new(Vec3(-1.0, -2.0, -3.0), Vec3(1.0, 2.0, 3.0));
        assert_eq!(KdTreeNode::new(bounds).bounds(), bounds);
    }
}
