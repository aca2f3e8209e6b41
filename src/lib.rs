//! An augmented, arena-backed red-black tree that serves three lookup modes
//! — intrinsic key, order statistic, and weighted position — over a single
//! engine, by never storing a node's ordering key directly and instead
//! deriving it on the fly from a monoid-valued prefix summary and the
//! node's own `Head` value.
//!
//! ```
//! use augtree::OrderedMap;
//!
//! let mut m: OrderedMap<&str, i32> = OrderedMap::new();
//! m.insert("a", 1);
//! m.insert("b", 2);
//! assert_eq!(m.get(&"a"), Some(&1));
//! assert_eq!(m.iter().map(|(_, v)| *v).sum::<i32>(), 3);
//! ```
//!
//! ```
//! use augtree::SequenceList;
//!
//! let mut seq: SequenceList<&str> = SequenceList::new();
//! let first = seq.push_back("a");
//! seq.push_back("c");
//! seq.insert_after(first, "b");
//! assert_eq!(seq.iter().copied().collect::<Vec<_>>(), ["a", "b", "c"]);
//! ```
//!
//! For anything the two convenience wrappers don't cover — weighted
//! positions, custom query-key types, positional neighbor insertion on an
//! intrinsic-key tree — use [`Tree`] directly.

mod key;
mod macros;
mod map;
mod seq;
mod tree;

pub use crate::key::{Comparison, Count, DerivedKey, FromHead, Monoid, Weight};
pub use crate::map::OrderedMap;
pub use crate::seq::SequenceList;
pub use crate::tree::{Branch, Cursor, Handle, Tree};
