use augtree::{Tree, Weight};

/// A rope-like weighted-position list. Each node's head is its own length;
/// its derived key is the cumulative length of everything before it — its
/// start offset.
#[test]
fn cumulative_offsets_track_insertion_order() {
    let mut tree: Tree<f64, Weight, &str, Weight> = Tree::new();

    let a = tree.insert_after("aaa", 3.0, tree.rightmost()); // [0, 3)
    let b = tree.insert_after("bbbbb", 5.0, tree.rightmost()); // [3, 8)
    let c = tree.insert_after("cc", 2.0, tree.rightmost()); // [8, 10)

    assert_eq!(tree.summary_before(a), Weight(0.0));
    assert_eq!(tree.summary_before(b), Weight(3.0));
    assert_eq!(tree.summary_before(c), Weight(8.0));

    let total = tree
        .summary_before(c)
        .combine(&Weight(*tree.head_at(c)))
        .0;
    assert_eq!(total, 10.0);
}

#[test]
fn search_by_offset() {
    let mut tree: Tree<f64, Weight, &str, Weight> = Tree::new();
    let a = tree.insert_after("aaa", 3.0, tree.rightmost());
    let b = tree.insert_after("bbbbb", 5.0, tree.rightmost());
    let c = tree.insert_after("cc", 2.0, tree.rightmost());

    assert_eq!(tree.rightmost_before(&Weight(8.0)), Some(b));
    assert_eq!(tree.leftmost_after(&Weight(3.0)), Some(c));
    assert_eq!(tree.find(&Weight(3.0)), Some(b));
    assert_eq!(tree.find(&Weight(0.0)), Some(a));
}

#[test]
fn insert_before_middle_shifts_nothing_upstream() {
    let mut tree: Tree<f64, Weight, &str, Weight> = Tree::new();
    let a = tree.insert_after("aaa", 3.0, tree.rightmost());
    let c = tree.insert_after("cc", 2.0, tree.rightmost());
    let b = tree.insert_before("bbbbb", 5.0, Some(c));

    assert_eq!(tree.summary_before(a), Weight(0.0));
    assert_eq!(tree.summary_before(b), Weight(3.0));
    assert_eq!(tree.summary_before(c), Weight(8.0));
}
