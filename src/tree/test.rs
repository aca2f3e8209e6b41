//! Invariant checker co-located with the tree: `assert_invariants` checks
//! color/black-height/parent-symmetry/summary consistency and BST order
//! after a mutation, and `logical_fuzz` drives random insert/remove
//! sequences against a `BTreeSet` shadow model.

use std::collections::BTreeSet;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::key::{DerivedKey, FromHead, Monoid};
use crate::tree::{Branch, Handle, Tree};

/// Walks the whole tree checking color rule, black height, parent/child
/// symmetry, and summary consistency; separately walks the public
/// `generate()` traversal checking strict BST order and density. Panics on
/// the first violation.
pub(crate) fn assert_invariants<H, S, P, K>(tree: &Tree<H, S, P, K>)
where
    S: Monoid + FromHead<H> + PartialEq + std::fmt::Debug,
    K: DerivedKey<S, H> + std::fmt::Debug,
{
    if let Some(root) = tree.root {
        assert!(
            tree.arena.hard_get(root).parent.is_none(),
            "root has a parent (invariant 1)"
        );
        assert!(
            tree.arena.hard_get(root).is_black(),
            "root is not Black (invariant 2)"
        );
    }

    let mut count = 0usize;
    check_subtree(tree, tree.root, &mut count);
    assert_eq!(count, tree.len(), "arena density mismatch (invariant 6)");

    match (tree.root, tree.leftmost, tree.rightmost) {
        (None, None, None) => {}
        (Some(root), Some(lm), Some(rm)) => {
            assert_eq!(
                lm,
                tree.furthest_under(root, Branch::Left),
                "leftmost cache stale (invariant 6)"
            );
            assert_eq!(
                rm,
                tree.furthest_under(root, Branch::Right),
                "rightmost cache stale (invariant 6)"
            );
        }
        _ => panic!("root/leftmost/rightmost disagree about emptiness (invariant 6)"),
    }

    let mut previous = None;
    let mut seen = 0usize;
    for (key, _payload) in tree.generate() {
        if let Some(prev) = &previous {
            assert!(*prev < key, "BST order violated (invariant 4)");
        }
        previous = Some(key);
        seen += 1;
    }
    assert_eq!(seen, tree.len(), "generate() length mismatch (invariant 6)");
}

fn check_subtree<H, S, P, K>(tree: &Tree<H, S, P, K>, h: Option<Handle>, count: &mut usize) -> usize
where
    S: Monoid + FromHead<H> + PartialEq + std::fmt::Debug,
    K: DerivedKey<S, H>,
{
    let h = match h {
        None => return 1, // a null leaf counts as one Black node.
        Some(h) => h,
    };
    *count += 1;

    let node = tree.arena.hard_get(h);
    let (is_red, left, right) = (node.is_red(), node.left, node.right);

    if is_red {
        assert!(
            left.map_or(true, |l| !tree.arena.hard_get(l).is_red()),
            "red node with red left child (invariant 2)"
        );
        assert!(
            right.map_or(true, |r| !tree.arena.hard_get(r).is_red()),
            "red node with red right child (invariant 2)"
        );
    }

    if let Some(l) = left {
        assert_eq!(
            tree.arena.hard_get(l).parent,
            Some(h),
            "parent/child asymmetry, left (invariant 1)"
        );
    }
    if let Some(r) = right {
        assert_eq!(
            tree.arena.hard_get(r).parent,
            Some(h),
            "parent/child asymmetry, right (invariant 1)"
        );
    }

    let left_bh = check_subtree(tree, left, count);
    let right_bh = check_subtree(tree, right, count);
    assert_eq!(left_bh, right_bh, "black height mismatch (invariant 3)");

    if !S::IS_EMPTY {
        let expected = tree
            .summary_under(left)
            .combine(&S::from_head(&tree.arena.hard_get(h).head))
            .combine(&tree.summary_under(right));
        assert_eq!(
            expected,
            tree.summary_under(Some(h)),
            "summary consistency violated (invariant 5)"
        );
    }

    left_bh + if is_red { 0 } else { 1 }
}

/// Random insert/remove against a `BTreeSet<i32>` shadow model.
pub(crate) fn logical_fuzz(seed: u64, operations: usize) {
    let mut tree: Tree<i32, (), i32, i32> = Tree::new();
    let mut shadow: BTreeSet<i32> = BTreeSet::new();
    let mut handles: Vec<(i32, Handle)> = Vec::new();
    let mut rng = SmallRng::seed_from_u64(seed);

    for _ in 0..operations {
        if handles.is_empty() || rng.gen_bool(0.6) {
            let v: i32 = rng.gen_range(0..1_000);
            if shadow.insert(v) {
                let h = tree.insert(v, v);
                handles.push((v, h));
            }
        } else {
            let idx = rng.gen_range(0..handles.len());
            let (v, h) = handles.swap_remove(idx);
            assert_eq!(tree.remove(h), v);
            shadow.remove(&v);
        }
        assert_invariants(&tree);
    }

    let collected: Vec<i32> = tree.generate().map(|(k, _)| k).collect();
    let expected: Vec<i32> = shadow.iter().copied().collect();
    assert_eq!(collected, expected, "tree diverged from BTreeSet shadow");
}

#[test]
fn fuzz_small() {
    for seed in 0..8u64 {
        logical_fuzz(seed, 300);
    }
}

#[test]
fn scenario_1_insertion_shape() {
    let mut tree: Tree<i32, (), i32, i32> = Tree::new();
    for v in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        tree.insert(v, v);
        assert_invariants(&tree);
    }

    let collected: Vec<i32> = tree.generate().map(|(k, _)| k).collect();
    assert_eq!(collected, (1..=9).collect::<Vec<_>>());
    assert_eq!(*tree.payload_at(tree.root().unwrap()), 5);
    assert!(tree.arena.hard_get(tree.root().unwrap()).is_black());
    assert_eq!(*tree.head_at(tree.leftmost().unwrap()), 1);
    assert_eq!(*tree.head_at(tree.rightmost().unwrap()), 9);
}

#[test]
fn scenario_2_search_variants() {
    let mut tree: Tree<i32, (), i32, i32> = Tree::new();
    for v in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        tree.insert(v, v);
    }

    let found = tree.find(&4).expect("4 should be present");
    assert_eq!(*tree.payload_at(found), 4);

    let before = tree.rightmost_before(&4).expect("predecessor of 4");
    assert_eq!(*tree.head_at(before), 3);

    let after = tree.leftmost_after(&4).expect("successor of 4");
    assert_eq!(*tree.head_at(after), 5);
}

#[test]
fn scenario_3_remove_root_repeatedly() {
    let mut tree: Tree<i32, (), i32, i32> = Tree::new();
    for v in [5, 3, 8, 1, 4, 7, 9, 2, 6] {
        tree.insert(v, v);
    }

    for _ in 0..9 {
        let root = tree.root().expect("tree not yet empty");
        tree.remove(root);
        assert_invariants(&tree);
    }
    assert!(tree.is_empty());
}

#[test]
fn scenario_4_order_statistic() {
    use crate::key::Count;

    let mut tree: Tree<(), Count, i32, Count> = Tree::new();
    let mut handles = Vec::new();
    for v in 0..100 {
        let h = tree.insert_after(v, (), tree.rightmost());
        handles.push(h);
        assert_invariants(&tree);
    }

    for (k, h) in handles.iter().enumerate() {
        assert_eq!(tree.summary_before(*h), Count(k));
    }

    let h_51_old = handles[51];
    tree.remove(handles[50]);
    assert_invariants(&tree);
    assert_eq!(tree.summary_before(h_51_old), Count(50));
}

#[test]
fn scenario_5_neighbor_insertion() {
    let mut tree: Tree<i32, (), i32, i32> = Tree::new();
    for v in 1..=1000 {
        tree.insert_after(v, v, tree.rightmost());
    }
    assert_invariants(&tree);
    assert_eq!(*tree.head_at(tree.leftmost().unwrap()), 1);
    assert_eq!(*tree.head_at(tree.rightmost().unwrap()), 1000);

    let collected: Vec<i32> = tree.generate().map(|(k, _)| k).collect();
    assert_eq!(collected, (1..=1000).collect::<Vec<_>>());
}

#[test]
fn scenario_6_append() {
    let mut a: Tree<i32, (), i32, i32> = (1..=50).map(|v| (v, v)).collect();
    let mut b: Tree<i32, (), i32, i32> = (51..=100).map(|v| (v, v)).collect();

    a.append(&mut b);
    assert_invariants(&a);
    assert!(b.is_empty());

    let collected: Vec<i32> = a.generate().map(|(k, _)| k).collect();
    assert_eq!(collected, (1..=100).collect::<Vec<_>>());
}
