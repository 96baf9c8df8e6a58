use std::collections::BTreeSet;

use rand::{rngs::StdRng, Rng, SeedableRng};

use super::kdtree::split_score;
use super::{KdTree, NodeKind, MAX_KD_DEPTH};
use crate::geometry::{Vec3, AABB};

fn build(object_bounds: &[AABB]) -> KdTree {
    let scene_bounds = AABB::enclosing(object_bounds.iter().copied()).unwrap_or_default();
    KdTree::build(scene_bounds, object_bounds)
}

fn random_boxes(rng: &mut StdRng, count: usize) -> Vec<AABB> {
    (0..count)
        .map(|_| {
            let center = Vec3(rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0), rng.gen_range(-50.0..50.0));
            let half = Vec3(rng.gen_range(0.1..8.0), rng.gen_range(0.1..8.0), rng.gen_range(0.1..8.0));
            AABB::new(center - half, center + half)
        })
        .collect()
}

fn overlaps(a: &AABB, b: &AABB) -> bool {
    (0..3).all(|axis| a.minimum[axis] <= b.maximum[axis] && b.minimum[axis] <= a.maximum[axis])
}

#[test]
fn empty_scene_is_single_empty_leaf() {
    let tree = KdTree::build(AABB::default(), &[]);
    assert_eq!(tree.nodes.len(), 1);
    assert_eq!(tree.root().kind(), NodeKind::Leaf { count: 0, first: 0 });
    assert!(tree.indices.is_empty());
}

#[test]
fn single_box_is_root_leaf() {
    let tree = build(&[AABB::new(Vec3::splat(-1.0), Vec3::splat(1.0))]);
    assert_eq!(tree.nodes.len(), 1);
    assert_eq!(tree.root().kind(), NodeKind::Leaf { count: 1, first: 0 });
    assert_eq!(tree.leaf_primitives(tree.root()), vec![0]);
}

#[test]
fn distant_boxes_split_on_x() {
    let objects = [
        AABB::new(Vec3(-10.0, -1.0, -1.0), Vec3(-9.0, 1.0, 1.0)),
        AABB::new(Vec3(9.0, -1.0, -1.0), Vec3(10.0, 1.0, 1.0)),
    ];
    let tree = build(&objects);

    match tree.root().kind() {
        NodeKind::Interior { axis, .. } => assert_eq!(axis, 0),
        kind => panic!("root should be interior, was {kind:?}"),
    }

    let populated: Vec<Vec<u32>> = tree
        .nodes
        .iter()
        .map(|node| tree.leaf_primitives(node))
        .filter(|prims| !prims.is_empty())
        .collect();
    assert_eq!(populated.len(), 2);
    assert!(populated.contains(&vec![0]));
    assert!(populated.contains(&vec![1]));
}

#[test]
fn straddling_object_lands_in_both_children() {
    // the wide box straddles every plane that separates the two small ones
    let objects = [
        AABB::new(Vec3(-10.0, 0.0, 0.0), Vec3(-8.0, 1.0, 1.0)),
        AABB::new(Vec3(8.0, 0.0, 0.0), Vec3(10.0, 1.0, 1.0)),
        AABB::new(Vec3(-9.0, 0.0, 0.0), Vec3(9.0, 1.0, 1.0)),
    ];
    let tree = build(&objects);
    let appearances = tree
        .nodes
        .iter()
        .filter(|node| tree.leaf_primitives(node).contains(&2))
        .count();
    assert!(appearances >= 2, "straddler appeared in {appearances} leaves");
}

#[test]
fn clustered_objects_share_one_leaf_in_order() {
    // identical boxes cannot be separated, so they end up together at the root
    let object = AABB::new(Vec3::splat(0.0), Vec3::splat(1.0));
    let tree = build(&[object; 4]);
    assert_eq!(tree.root().kind(), NodeKind::Leaf { count: 4, first: 0 });
    assert_eq!(tree.indices, vec![0, 1, 2, 3]);
}

#[test]
fn ties_keep_first_axis() {
    // separating on x and on y score identically; x is tried first
    let objects = [
        AABB::new(Vec3(0.0, 0.0, 0.0), Vec3(1.0, 1.0, 1.0)),
        AABB::new(Vec3(2.0, 2.0, 0.0), Vec3(3.0, 3.0, 1.0)),
    ];
    let tree = build(&objects);
    match tree.root().kind() {
        NodeKind::Interior { axis, split, .. } => {
            assert_eq!(axis, 0);
            assert_eq!(split, 1.0);
        }
        kind => panic!("root should be interior, was {kind:?}"),
    }
}

#[test]
fn flat_object_is_not_dropped() {
    let objects = [
        AABB::new(Vec3(0.0, 0.0, 0.0), Vec3(0.0, 4.0, 4.0)),
        AABB::new(Vec3(3.0, 0.0, 0.0), Vec3(4.0, 4.0, 4.0)),
    ];
    let tree = build(&objects);
    let covered: BTreeSet<u32> = tree.nodes.iter().flat_map(|n| tree.leaf_primitives(n)).collect();
    assert_eq!(covered, BTreeSet::from([0, 1]));
}

#[test]
fn random_scenes_hold_tree_invariants() {
    let mut rng = StdRng::seed_from_u64(0x6b64);
    for round in 0..50 {
        let count = rng.gen_range(1..120);
        let objects = random_boxes(&mut rng, count);
        let tree = build(&objects);

        assert!(tree.depth() <= MAX_KD_DEPTH, "round {round}: depth {}", tree.depth());

        let mut covered = BTreeSet::new();
        for (index, node) in tree.nodes.iter().enumerate() {
            let bounds = node.bounds();
            assert!(bounds.is_valid(), "round {round}: node {index} has inverted bounds");
            match node.kind() {
                NodeKind::Leaf { .. } => {
                    for prim in tree.leaf_primitives(node) {
                        assert!((prim as usize) < objects.len());
                        assert!(overlaps(&objects[prim as usize], &bounds));
                        covered.insert(prim);
                    }
                }
                NodeKind::Interior { axis, split, above_child } => {
                    let below = tree.nodes[index + 1].bounds();
                    let above = tree.nodes[above_child as usize].bounds();
                    assert!(above_child as usize > index + 1);
                    assert_eq!(AABB::surrounding_box(below, above), bounds);
                    assert_eq!(bounds.split(axis, split), (below, above));
                }
            }
        }
        assert_eq!(covered.len(), objects.len(), "round {round}: some objects are unreachable");
    }
}

#[test]
fn identical_input_builds_identical_tree() {
    let mut rng = StdRng::seed_from_u64(7);
    let objects = random_boxes(&mut rng, 64);
    let a = build(&objects);
    let b = build(&objects);
    assert_eq!(bytemuck::cast_slice::<_, u8>(&a.nodes), bytemuck::cast_slice::<_, u8>(&b.nodes));
    assert_eq!(a.indices, b.indices);
}

#[test]
fn score_prefers_even_splits() {
    let even = split_score(0.0, 10.0, 5.0, 5, 5, 10);
    let skewed = split_score(0.0, 10.0, 5.0, 2, 8, 10);
    let straddled = split_score(0.0, 10.0, 5.0, 9, 9, 10);
    assert!((even - 1.0).abs() < 1e-6);
    assert!(even > skewed);
    assert!(skewed > straddled);
}

#[test]
fn score_rewards_cutting_empty_space() {
    // everything lies below the plane, the rest of the range is empty
    assert!((split_score(0.0, 10.0, 2.0, 3, 0, 3) - 0.8).abs() < 1e-6);
    // everything lies above the plane
    assert!((split_score(0.0, 10.0, 7.0, 0, 3, 3) - 0.7).abs() < 1e-6);
    assert_eq!(split_score(0.0, 10.0, 10.0, 3, 0, 3), 0.0);
    assert_eq!(split_score(4.0, 4.0, 4.0, 1, 0, 1), 0.0);
}
