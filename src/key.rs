//! The key scheme contract: the three entities a caller supplies to make a
//! [`Tree`][crate::tree::Tree] usable as an ordered map, an order-statistic
//! list, or a weighted-position list (a rope-like structure) over the same
//! engine.
//!
//! A node's ordering position is never stored. It's always *derived*, on the
//! fly, from a running prefix [`Monoid`] summary and the node's own `Head`
//! value (see [`DerivedKey::derive`]). This is what lets one red-black engine
//! serve all three lookup modes: the only thing that varies between modes is
//! which `Summary`/`Head`/derived-key types are plugged in.

use core::cmp::Ordering;

/// A monoid used to aggregate per-node [`Head`](DerivedKey) values into
/// cached subtree summaries.
///
/// Implementations must be associative: `a.combine(&b).combine(&c) ==
/// a.combine(&b.combine(&c))`. Combination order is *not* required to be
/// commutative — tree order matters, left-to-right.
pub trait Monoid: Clone {
    /// `true` for zero-sized summaries (e.g. `()`), which lets every
    /// summary-dependent operation short-circuit to O(1) instead of the
    /// usual O(log n) climb. Override when `Self` has no runtime state.
    const IS_EMPTY: bool = false;

    /// The identity element, `∅`.
    fn identity() -> Self;

    /// Associative combine, `⊕`. `self` precedes `other` in tree order.
    fn combine(&self, other: &Self) -> Self;
}

/// Embeds a single per-node `Head` value into a fresh, singleton `Summary`
/// (the monoid's "seed" operation, `Summary(head)`).
pub trait FromHead<H> {
    /// Build the summary of a subtree consisting of exactly one node
    /// carrying `head`.
    fn from_head(head: &H) -> Self;
}

impl Monoid for () {
    const IS_EMPTY: bool = true;

    fn identity() -> Self {}

    fn combine(&self, _other: &Self) -> Self {}
}

impl<H> FromHead<H> for () {
    fn from_head(_head: &H) -> Self {}
}

/// A totally ordered value synthesized from a prefix [`Monoid`] summary and
/// a node's `Head`: `Key(prefix_summary, head)`.
///
/// The key used to decide tree shape when adding nodes, and the key types
/// used for lookups, are both just types implementing this trait over the
/// same `Summary`/`Head` pair — there is no separate trait for each, only a
/// different type parameter bound at each call site.
pub trait DerivedKey<S: Monoid, H>: Ord + Sized {
    /// Compute this node's derived key from the summary of everything
    /// strictly before its subtree and its own head.
    fn derive(prefix: &S, head: &H) -> Self;
}

/// Three-way result of comparing a query key against a node's derived key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Query key is less than the node's derived key: descend left.
    Before,
    /// Query key equals the node's derived key: stop here.
    Matching,
    /// Query key is greater than the node's derived key: descend right.
    After,
}

impl Comparison {
    pub(crate) fn from_ordering(ord: Ordering) -> Self {
        match ord {
            Ordering::Less => Comparison::Before,
            Ordering::Equal => Comparison::Matching,
            Ordering::Greater => Comparison::After,
        }
    }
}

/// The classic ordered-map scheme: any ordered, cloneable type can serve as
/// its own `Head` with the empty summary, since its derived key never
/// depends on tree position. [`crate::map::OrderedMap`] is built on exactly
/// this blanket impl.
impl<T: Ord + Clone> DerivedKey<(), T> for T {
    fn derive(_prefix: &(), head: &T) -> T {
        head.clone()
    }
}

/// A monoid counting subtree size. Pairs with `Head = ()` to turn the
/// engine into an order-statistic tree: the derived key of a node is simply
/// the number of nodes strictly before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Count(pub usize);

impl Monoid for Count {
    fn identity() -> Self {
        Count(0)
    }

    fn combine(&self, other: &Self) -> Self {
        Count(self.0 + other.0)
    }
}

impl FromHead<()> for Count {
    fn from_head(_head: &()) -> Self {
        Count(1)
    }
}

impl DerivedKey<Count, ()> for Count {
    fn derive(prefix: &Count, _head: &()) -> Self {
        *prefix
    }
}

/// A monoid summing `f64` weights. Pairs with `Head = f64` to turn the
/// engine into a weighted-position list: the derived key of a node is the
/// cumulative weight of everything strictly before it — its start offset,
/// in rope terms.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Weight(pub f64);

impl Monoid for Weight {
    fn identity() -> Self {
        Weight(0.0)
    }

    fn combine(&self, other: &Self) -> Self {
        Weight(self.0 + other.0)
    }
}

impl FromHead<f64> for Weight {
    fn from_head(head: &f64) -> Self {
        Weight(*head)
    }
}

impl PartialOrd for Weight {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.0.partial_cmp(&other.0)
    }
}

impl DerivedKey<Weight, f64> for Weight {
    fn derive(prefix: &Weight, _head: &f64) -> Self {
        *prefix
    }
}

// `Weight` can't derive `Eq`/`Ord` (backed by `f64`), but the derived-key
// bound requires a strict total order. Treat `NaN` as a logic error rather
// than silently reordering the tree under it.
impl Eq for Weight {}

impl Ord for Weight {
    fn cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .expect("Weight comparison against NaN")
    }
}
