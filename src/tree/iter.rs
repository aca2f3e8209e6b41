use crate::key::{DerivedKey, FromHead, Monoid};

use super::arena::Handle;
use super::tree::Tree;

/// In-order sequence cursor. Walks in order from a starting handle, yielding
/// `(derived key, payload)` pairs. The running prefix always starts at `∅`,
/// even when starting mid-tree via `Tree::generate_from` — yielded keys are
/// then suffix-relative, a deliberate choice callers needing absolute keys
/// must compose with `Tree::summary_before`.
pub struct Cursor<'a, H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    tree: &'a Tree<H, S, P, K>,
    current: Option<Handle>,
    running_prefix: S,
}

impl<'a, H, S, P, K> Cursor<'a, H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    pub(crate) fn new(tree: &'a Tree<H, S, P, K>, start: Option<Handle>) -> Self {
        Cursor {
            tree,
            current: start,
            running_prefix: S::identity(),
        }
    }
}

impl<'a, H, S, P, K> Iterator for Cursor<'a, H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    type Item = (K, &'a P);

    fn next(&mut self) -> Option<Self::Item> {
        let h = self.current?;
        let head = self.tree.head_at(h);
        let key = K::derive(&self.running_prefix, head);
        self.running_prefix = self.running_prefix.combine(&S::from_head(head));
        self.current = self.tree.successor(h);
        Some((key, self.tree.payload_at(h)))
    }
}

impl<'a, H, S, P, K> IntoIterator for &'a Tree<H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    type Item = (K, &'a P);
    type IntoIter = Cursor<'a, H, S, P, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.generate()
    }
}
