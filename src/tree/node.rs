use crate::key::{FromHead, Monoid};

use super::arena::Handle;

/// Red-black node color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Color {
    Red,
    Black,
}

/// Which child of a node, or which direction to walk/rotate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Left,
    Right,
}

impl Branch {
    pub(crate) fn opposite(self) -> Branch {
        match self {
            Branch::Left => Branch::Right,
            Branch::Right => Branch::Left,
        }
    }
}

/// Where a node may be attached: the tree root, or a specific child slot of
/// a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Slot {
    Root,
    Child(Branch, Handle),
}

/// An arena-resident red-black node.
///
/// Invariant: `summary == left.summary ⊕ Summary(head) ⊕ right.summary`,
/// treating a missing child's summary as `∅`. This is maintained by
/// [`super::tree::Tree::update_summary_at`], never computed ad hoc.
pub(crate) struct Node<H, S, P> {
    pub parent: Option<Handle>,
    pub left: Option<Handle>,
    pub right: Option<Handle>,
    pub color: Color,
    pub head: H,
    pub summary: S,
    pub payload: P,
}

impl<H, S: Monoid, P> Node<H, S, P> {
    pub fn new(head: H, payload: P) -> Self
    where
        S: FromHead<H>,
    {
        Node {
            parent: None,
            left: None,
            right: None,
            color: Color::Red,
            summary: S::from_head(&head),
            head,
            payload,
        }
    }

    pub fn child(&self, dir: Branch) -> Option<Handle> {
        match dir {
            Branch::Left => self.left,
            Branch::Right => self.right,
        }
    }

    pub fn set_child(&mut self, dir: Branch, handle: Option<Handle>) {
        match dir {
            Branch::Left => self.left = handle,
            Branch::Right => self.right = handle,
        }
    }

    pub fn is_red(&self) -> bool {
        self.color == Color::Red
    }

    pub fn is_black(&self) -> bool {
        self.color == Color::Black
    }
}
