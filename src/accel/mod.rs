//! Acceleration structure
//! A kd-tree over object bounds, flattened into one node array and one index
//! array so both can be uploaded to the device as-is.

pub mod kdtree;
pub mod node;

pub use kdtree::{KdTree, MAX_KD_DEPTH};
pub use node::{KdTreeNode, NodeKind};

#[cfg(test)]
mod tests;
