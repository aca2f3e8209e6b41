use core::cmp::Ordering;
use core::mem;

use crate::key::{Comparison, DerivedKey, FromHead, Monoid};

use super::arena::{Handle, NodeArena};
use super::node::{Branch, Color, Node, Slot};

/// The generic engine behind every mode this crate supports: an augmented,
/// arena-backed red-black tree over nodes carrying a `Head` value and a
/// cached `Summary`, ordered by an on-the-fly-derived key.
///
/// `H` is the per-node head, `S` the monoid summary, `P` the payload, and
/// `K` the strict total order used to decide tree shape. Query lookups use a
/// separate, possibly different `Q: DerivedKey<S, H>` type parameter per
/// call.
pub struct Tree<H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    pub(crate) arena: NodeArena<H, S, P>,
    pub(crate) root: Option<Handle>,
    pub(crate) leftmost: Option<Handle>,
    pub(crate) rightmost: Option<Handle>,
    len: usize,
    _key: core::marker::PhantomData<fn() -> K>,
}

impl<H, S, P, K> Tree<H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    pub fn new() -> Self {
        Tree {
            arena: NodeArena::new(),
            root: None,
            leftmost: None,
            rightmost: None,
            len: 0,
            _key: core::marker::PhantomData,
        }
    }

    pub fn reserve_capacity(&mut self, additional: usize) {
        self.arena.reserve_capacity(additional);
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    pub fn root(&self) -> Option<Handle> {
        self.root
    }

    pub fn leftmost(&self) -> Option<Handle> {
        self.leftmost
    }

    pub fn rightmost(&self) -> Option<Handle> {
        self.rightmost
    }

    // ---- Inspectors ----

    pub fn payload_at(&self, h: Handle) -> &P {
        &self.arena.hard_get(h).payload
    }

    pub fn payload_at_mut(&mut self, h: Handle) -> &mut P {
        &mut self.arena.hard_get_mut(h).payload
    }

    pub fn head_at(&self, h: Handle) -> &H {
        &self.arena.hard_get(h).head
    }

    pub fn key_at(&self, h: Handle) -> K {
        let prefix = self.summary_before(h);
        K::derive(&prefix, &self.arena.hard_get(h).head)
    }

    pub fn element_at(&self, h: Handle) -> (K, &P) {
        (self.key_at(h), self.payload_at(h))
    }

    // ---- Navigation ----

    pub fn successor(&self, h: Handle) -> Option<Handle> {
        let node = self.arena.hard_get(h);
        if let Some(r) = node.right {
            return Some(self.furthest_under(r, Branch::Left));
        }
        let mut x = h;
        let mut p = node.parent;
        while let Some(pp) = p {
            let pnode = self.arena.hard_get(pp);
            if pnode.right == Some(x) {
                x = pp;
                p = pnode.parent;
            } else {
                return Some(pp);
            }
        }
        None
    }

    pub fn predecessor(&self, h: Handle) -> Option<Handle> {
        let node = self.arena.hard_get(h);
        if let Some(l) = node.left {
            return Some(self.furthest_under(l, Branch::Right));
        }
        let mut x = h;
        let mut p = node.parent;
        while let Some(pp) = p {
            let pnode = self.arena.hard_get(pp);
            if pnode.left == Some(x) {
                x = pp;
                p = pnode.parent;
            } else {
                return Some(pp);
            }
        }
        None
    }

    pub fn step(&self, h: Handle, dir: Branch) -> Option<Handle> {
        match dir {
            Branch::Left => self.predecessor(h),
            Branch::Right => self.successor(h),
        }
    }

    pub fn furthest_under(&self, h: Handle, dir: Branch) -> Handle {
        let mut cur = h;
        while let Some(next) = self.arena.hard_get(cur).child(dir) {
            cur = next;
        }
        cur
    }

    pub fn furthest_toward(&self, dir: Branch) -> Option<Handle> {
        match dir {
            Branch::Left => self.leftmost,
            Branch::Right => self.rightmost,
        }
    }

    pub(crate) fn slot_of(&self, h: Handle) -> Slot {
        match self.arena.hard_get(h).parent {
            None => Slot::Root,
            Some(p) => Slot::Child(self.child_dir(p, h), p),
        }
    }

    /// Which side of `parent` is `child` attached to. `child` must currently
    /// be one of `parent`'s children.
    fn child_dir(&self, parent: Handle, child: Handle) -> Branch {
        let p = self.arena.hard_get(parent);
        if p.left == Some(child) {
            Branch::Left
        } else {
            debug_assert_eq!(
                p.right,
                Some(child),
                "Internal invariant failed: node isn't a child of its claimed parent"
            );
            Branch::Right
        }
    }

    // ---- Summary queries ----

    pub fn summary_under(&self, h: Option<Handle>) -> S {
        match h {
            Some(h) => self.arena.hard_get(h).summary.clone(),
            None => S::identity(),
        }
    }

    pub fn summary_before(&self, h: Handle) -> S {
        if S::IS_EMPTY {
            return S::identity();
        }
        let node = self.arena.hard_get(h);
        let mut acc = self.summary_under(node.left);
        let mut x = h;
        let mut p = node.parent;
        while let Some(pp) = p {
            let pnode = self.arena.hard_get(pp);
            if pnode.right == Some(x) {
                let left_summary = self.summary_under(pnode.left);
                let seed = S::from_head(&pnode.head);
                acc = left_summary.combine(&seed).combine(&acc);
            }
            x = pp;
            p = pnode.parent;
        }
        acc
    }

    pub fn summary_after(&self, h: Handle) -> S {
        if S::IS_EMPTY {
            return S::identity();
        }
        let node = self.arena.hard_get(h);
        let mut acc = self.summary_under(node.right);
        let mut x = h;
        let mut p = node.parent;
        while let Some(pp) = p {
            let pnode = self.arena.hard_get(pp);
            if pnode.left == Some(x) {
                let seed = S::from_head(&pnode.head);
                let right_summary = self.summary_under(pnode.right);
                acc = acc.combine(&seed).combine(&right_summary);
            }
            x = pp;
            p = pnode.parent;
        }
        acc
    }

    pub(crate) fn update_summary_at(&mut self, h: Handle) {
        if S::IS_EMPTY {
            return;
        }
        let (left, right) = {
            let node = self.arena.hard_get(h);
            (node.left, node.right)
        };
        let left_summary = self.summary_under(left);
        let right_summary = self.summary_under(right);
        let node = self.arena.hard_get_mut(h);
        let seed = S::from_head(&node.head);
        node.summary = left_summary.combine(&seed).combine(&right_summary);
    }

    pub(crate) fn update_summaries_at_and_above(&mut self, h: Handle) {
        if S::IS_EMPTY {
            return;
        }
        let mut cur = Some(h);
        while let Some(c) = cur {
            self.update_summary_at(c);
            cur = self.arena.hard_get(c).parent;
        }
    }

    /// The running prefix after descending past `h` to its `Right` child,
    /// `prefix ⊕ left.summary ⊕ head`.
    fn advance_prefix(&self, h: Handle, prefix: &S) -> S {
        let node = self.arena.hard_get(h);
        let left_summary = self.summary_under(node.left);
        let seed = S::from_head(&node.head);
        prefix.combine(&left_summary).combine(&seed)
    }

    fn compare_at<Q>(&self, query: &Q, h: Handle, prefix: &S) -> Comparison
    where
        Q: DerivedKey<S, H>,
    {
        let derived = Q::derive(prefix, &self.arena.hard_get(h).head);
        Comparison::from_ordering(query.cmp(&derived))
    }

    // ---- Search ----

    pub fn find<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        self.topmost_matching(query)
    }

    pub fn topmost_matching<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        let mut cur = self.root;
        let mut prefix = S::identity();
        while let Some(h) = cur {
            match self.compare_at(query, h, &prefix) {
                Comparison::Before => cur = self.arena.hard_get(h).left,
                Comparison::Matching => return Some(h),
                Comparison::After => {
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
            }
        }
        None
    }

    pub fn leftmost_matching<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        let mut cur = self.root;
        let mut prefix = S::identity();
        let mut found = None;
        while let Some(h) = cur {
            match self.compare_at(query, h, &prefix) {
                Comparison::Before => cur = self.arena.hard_get(h).left,
                Comparison::Matching => {
                    found = Some(h);
                    cur = self.arena.hard_get(h).left;
                }
                Comparison::After => {
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
            }
        }
        found
    }

    pub fn rightmost_matching<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        let mut cur = self.root;
        let mut prefix = S::identity();
        let mut found = None;
        while let Some(h) = cur {
            match self.compare_at(query, h, &prefix) {
                Comparison::Before => cur = self.arena.hard_get(h).left,
                Comparison::Matching => {
                    found = Some(h);
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
                Comparison::After => {
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
            }
        }
        found
    }

    /// Rightmost node whose derived key is strictly less than `query`. On an
    /// exact match, treated as "still not strictly before" and the descent
    /// continues left, same as the `Before` case.
    pub fn rightmost_before<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        let mut cur = self.root;
        let mut prefix = S::identity();
        let mut candidate = None;
        while let Some(h) = cur {
            match self.compare_at(query, h, &prefix) {
                Comparison::Before | Comparison::Matching => {
                    cur = self.arena.hard_get(h).left;
                }
                Comparison::After => {
                    candidate = Some(h);
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
            }
        }
        candidate
    }

    /// Leftmost node whose derived key is strictly greater than `query`.
    /// Symmetric to `rightmost_before`.
    pub fn leftmost_after<Q>(&self, query: &Q) -> Option<Handle>
    where
        Q: DerivedKey<S, H>,
    {
        let mut cur = self.root;
        let mut prefix = S::identity();
        let mut candidate = None;
        while let Some(h) = cur {
            match self.compare_at(query, h, &prefix) {
                Comparison::After | Comparison::Matching => {
                    prefix = self.advance_prefix(h, &prefix);
                    cur = self.arena.hard_get(h).right;
                }
                Comparison::Before => {
                    candidate = Some(h);
                    cur = self.arena.hard_get(h).left;
                }
            }
        }
        candidate
    }

    // ---- Insertion ----

    pub fn insert(&mut self, payload: P, head: H) -> Handle {
        let slot = self.slot_for_new_head(&head);
        self.attach_new_node(payload, head, slot)
    }

    /// Descend comparing the not-yet-placed `head` against existing nodes'
    /// heads, both evaluated at the same trial prefix at each step
    /// On `Before` go left; on `After`/`Matching` go right. Re-uses the
    /// same `K::derive` machinery as queries, rather
    /// than asking the caller for a fully formed `InsertionKey`, which would
    /// be circular for non-trivial summaries: a node's derived key depends
    /// on its tree position, which insertion is precisely what determines.
    fn slot_for_new_head(&self, head: &H) -> Slot {
        let root = match self.root {
            None => return Slot::Root,
            Some(root) => root,
        };
        let mut cur = root;
        let mut prefix = S::identity();
        loop {
            let new_key = K::derive(&prefix, head);
            let (existing_key, left, right) = {
                let node = self.arena.hard_get(cur);
                (K::derive(&prefix, &node.head), node.left, node.right)
            };
            match new_key.cmp(&existing_key) {
                Ordering::Less => match left {
                    Some(l) => cur = l,
                    None => return Slot::Child(Branch::Left, cur),
                },
                Ordering::Equal | Ordering::Greater => {
                    prefix = self.advance_prefix(cur, &prefix);
                    match right {
                        Some(r) => cur = r,
                        None => return Slot::Child(Branch::Right, cur),
                    }
                }
            }
        }
    }

    /// Inserts `payload` immediately after `after` in sequence order.
    /// `after: None` means "insert at leftmost".
    pub fn insert_after(&mut self, payload: P, head: H, after: Option<Handle>) -> Handle {
        let slot = match after {
            None => match self.leftmost {
                None => Slot::Root,
                Some(lm) => Slot::Child(Branch::Left, lm),
            },
            Some(pred) => {
                let right = self.arena.hard_get(pred).right;
                match right {
                    Some(r) => Slot::Child(Branch::Left, self.furthest_under(r, Branch::Left)),
                    None => Slot::Child(Branch::Right, pred),
                }
            }
        };
        self.attach_new_node(payload, head, slot)
    }

    /// `insert(payload, key, before: successor)`. `before: None` means
    /// "insert at rightmost", mirroring `insert_after`.
    pub fn insert_before(&mut self, payload: P, head: H, before: Option<Handle>) -> Handle {
        let slot = match before {
            None => match self.rightmost {
                None => Slot::Root,
                Some(rm) => Slot::Child(Branch::Right, rm),
            },
            Some(succ) => {
                let left = self.arena.hard_get(succ).left;
                match left {
                    Some(l) => Slot::Child(Branch::Right, self.furthest_under(l, Branch::Right)),
                    None => Slot::Child(Branch::Left, succ),
                }
            }
        };
        self.attach_new_node(payload, head, slot)
    }

    pub fn set_payload_of(&mut self, head: H, payload: P) -> Option<P> {
        let root = match self.root {
            None => {
                self.attach_new_node(payload, head, Slot::Root);
                return None;
            }
            Some(root) => root,
        };
        let mut cur = root;
        let mut prefix = S::identity();
        loop {
            let new_key = K::derive(&prefix, &head);
            let (existing_key, left, right) = {
                let node = self.arena.hard_get(cur);
                (K::derive(&prefix, &node.head), node.left, node.right)
            };
            match new_key.cmp(&existing_key) {
                Ordering::Equal => {
                    let node = self.arena.hard_get_mut(cur);
                    node.head = head;
                    let previous = mem::replace(&mut node.payload, payload);
                    self.update_summaries_at_and_above(cur);
                    return Some(previous);
                }
                Ordering::Less => match left {
                    Some(l) => cur = l,
                    None => {
                        self.attach_new_node(payload, head, Slot::Child(Branch::Left, cur));
                        return None;
                    }
                },
                Ordering::Greater => {
                    prefix = self.advance_prefix(cur, &prefix);
                    match right {
                        Some(r) => cur = r,
                        None => {
                            self.attach_new_node(payload, head, Slot::Child(Branch::Right, cur));
                            return None;
                        }
                    }
                }
            }
        }
    }

    fn attach_new_node(&mut self, payload: P, head: H, slot: Slot) -> Handle {
        let node = Node::new(head, payload);
        let handle = self.arena.add(node);
        self.len += 1;

        match slot {
            Slot::Root => {
                debug_assert!(self.root.is_none(), "Slot::Root requested on a non-empty tree");
                self.arena.hard_get_mut(handle).color = Color::Black;
                self.root = Some(handle);
                self.leftmost = Some(handle);
                self.rightmost = Some(handle);
            }
            Slot::Child(dir, parent) => {
                self.arena.hard_get_mut(handle).parent = Some(parent);
                {
                    let p = self.arena.hard_get_mut(parent);
                    debug_assert!(
                        p.child(dir).is_none(),
                        "Internal invariant failed: target slot already occupied"
                    );
                    p.set_child(dir, Some(handle));
                }
                if dir == Branch::Left && Some(parent) == self.leftmost {
                    self.leftmost = Some(handle);
                }
                if dir == Branch::Right && Some(parent) == self.rightmost {
                    self.rightmost = Some(handle);
                }
                self.update_summaries_at_and_above(handle);
                self.fixup_insert(handle);
            }
        }

        handle
    }

    /// CLRS insertion fix-up, generalized over `Branch`.
    fn fixup_insert(&mut self, mut z: Handle) {
        loop {
            let parent = match self.arena.hard_get(z).parent {
                Some(p) => p,
                None => break,
            };
            if self.arena.hard_get(parent).is_black() {
                break;
            }

            // Parent is Red, so it cannot be the root, and it must have a
            // grandparent (the root is always Black).
            let grandparent = self
                .arena
                .hard_get(parent)
                .parent
                .expect("Internal invariant failed: red node without a grandparent");
            let parent_dir = self.child_dir(grandparent, parent);
            let aunt_dir = parent_dir.opposite();
            let aunt = self.arena.hard_get(grandparent).child(aunt_dir);

            if aunt.map_or(false, |a| self.arena.hard_get(a).is_red()) {
                // Case 1: aunt is Red.
                self.arena.hard_get_mut(parent).color = Color::Black;
                self.arena.hard_get_mut(aunt.unwrap()).color = Color::Black;
                self.arena.hard_get_mut(grandparent).color = Color::Red;
                z = grandparent;
                continue;
            }

            // Aunt is Black (or absent).
            let mut z = z;
            let mut parent = parent;
            if self.child_dir(parent, z) != parent_dir {
                // Case 2: z on the opposite side of parent from grandparent.
                self.rotate(parent, parent_dir);
                z = parent;
                parent = self
                    .arena
                    .hard_get(z)
                    .parent
                    .expect("Internal invariant failed: rotation left z without a parent");
            }

            // Case 3: z on the same side as parent.
            self.arena.hard_get_mut(parent).color = Color::Black;
            self.arena.hard_get_mut(grandparent).color = Color::Red;
            self.rotate(grandparent, aunt_dir);
            break;
        }

        if let Some(root) = self.root {
            self.arena.hard_get_mut(root).color = Color::Black;
        }
    }

    // ---- Rotation ----

    /// Promotes `h`'s `opposite(dir)` child; `h` becomes that node's
    /// `dir`-child. Updates all parent links and, if `h` was root, the
    /// cached root handle. Summary update order matters: the demoted node
    /// (`h`) first, then the promoted node, since the promoted node's
    /// summary depends on `h`'s new one.
    fn rotate(&mut self, h: Handle, dir: Branch) {
        let opp = dir.opposite();
        let promoted = self
            .arena
            .hard_get(h)
            .child(opp)
            .expect("Internal invariant failed: rotation requires the opposite child to exist");
        let inner = self.arena.hard_get(promoted).child(dir);

        self.arena.hard_get_mut(h).set_child(opp, inner);
        if let Some(inner_h) = inner {
            self.arena.hard_get_mut(inner_h).parent = Some(h);
        }

        let parent = self.arena.hard_get(h).parent;
        self.arena.hard_get_mut(promoted).parent = parent;
        match parent {
            Some(p) => {
                let dir_of_h = self.child_dir(p, h);
                self.arena.hard_get_mut(p).set_child(dir_of_h, Some(promoted));
            }
            None => {
                self.root = Some(promoted);
            }
        }

        self.arena.hard_get_mut(promoted).set_child(dir, Some(h));
        self.arena.hard_get_mut(h).parent = Some(promoted);

        self.update_summary_at(h);
        self.update_summary_at(promoted);
    }

    // ---- Removal ----

    pub fn remove(&mut self, h: Handle) -> P {
        self.remove_returning_successor(h).1
    }

    pub fn remove_returning_successor(&mut self, h: Handle) -> (Option<Handle>, P) {
        let mut tracked = self.successor(h);
        let (left, right) = {
            let node = self.arena.hard_get(h);
            (node.left, node.right)
        };

        let victim = if let (Some(_), Some(r)) = (left, right) {
            // Step A: reduce to <= 1 child via successor splice.
            let s = self.furthest_under(r, Branch::Left);
            {
                let (h_node, s_node) = self.arena.get_pair_mut(h, s);
                mem::swap(&mut h_node.head, &mut s_node.head);
                mem::swap(&mut h_node.payload, &mut s_node.payload);
            }
            self.update_summaries_at_and_above(h);
            if tracked == Some(s) {
                tracked = Some(h);
            }
            s
        } else {
            h
        };

        let (removed, relocation) = self.excise(victim);
        if let Some((old, new)) = relocation {
            if tracked == Some(old) {
                tracked = Some(new);
            }
        }

        (tracked, removed.payload)
    }

    /// Step B: physically remove `v`, which has at most one child, rewiring
    /// links, extremal caches, and summaries, running the black fix-up if
    /// needed, then compacting the arena (Step D).
    fn excise(&mut self, v: Handle) -> (Node<H, S, P>, Option<(Handle, Handle)>) {
        let (left, right, v_color) = {
            let n = self.arena.hard_get(v);
            (n.left, n.right, n.color)
        };
        debug_assert!(
            left.is_none() || right.is_none(),
            "excise target must have at most one child"
        );
        let child = left.or(right);
        let mut rebalance = v_color == Color::Black;

        if let Some(c) = child {
            if v_color == Color::Black && self.arena.hard_get(c).is_red() {
                self.arena.hard_get_mut(c).color = Color::Black;
                rebalance = false;
            }
        }

        let v_parent = self.arena.hard_get(v).parent;
        let mut fixup_slot = None;

        if let Some(c) = child {
            self.arena.hard_get_mut(c).parent = v_parent;
        }
        match v_parent {
            Some(p) => {
                let dir = self.child_dir(p, v);
                self.arena.hard_get_mut(p).set_child(dir, child);
                fixup_slot = Some((dir, p));
            }
            None => {
                self.root = child;
            }
        }

        if self.leftmost == Some(v) {
            self.leftmost = match child {
                Some(c) => Some(self.furthest_under(c, Branch::Left)),
                None => v_parent,
            };
        }
        if self.rightmost == Some(v) {
            self.rightmost = match child {
                Some(c) => Some(self.furthest_under(c, Branch::Right)),
                None => v_parent,
            };
        }

        if let Some(p) = v_parent {
            self.update_summaries_at_and_above(p);
        }

        if rebalance {
            if let Some((dir, p)) = fixup_slot {
                self.fixup_remove(dir, p);
            }
        }

        let (removed, relocation) = self.arena.swap_remove(v);
        if let Some((old, new)) = relocation {
            self.relocate_handle(old, new);
        }
        self.len -= 1;

        (removed, relocation)
    }

    /// Fix every cross-reference that pointed at `old` (the handle of the
    /// node the arena just moved) to point at `new` instead.
    fn relocate_handle(&mut self, old: Handle, new: Handle) {
        let (parent, left, right) = {
            let n = self.arena.hard_get(new);
            (n.parent, n.left, n.right)
        };
        if let Some(p) = parent {
            let dir = self.child_dir(p, old);
            self.arena.hard_get_mut(p).set_child(dir, Some(new));
        }
        if let Some(l) = left {
            self.arena.hard_get_mut(l).parent = Some(new);
        }
        if let Some(r) = right {
            self.arena.hard_get_mut(r).parent = Some(new);
        }
        if self.root == Some(old) {
            self.root = Some(new);
        }
        if self.leftmost == Some(old) {
            self.leftmost = Some(new);
        }
        if self.rightmost == Some(old) {
            self.rightmost = Some(new);
        }
    }

    /// CLRS black-height fix-up, generalized over `Branch`.
    fn fixup_remove(&mut self, mut dir: Branch, mut parent: Handle) {
        loop {
            let sibling = self
                .arena
                .hard_get(parent)
                .child(dir.opposite())
                .expect("Internal invariant failed: missing sibling during black fix-up");

            if self.arena.hard_get(sibling).is_red() {
                // Case 1: sibling Red.
                self.arena.hard_get_mut(sibling).color = Color::Black;
                self.arena.hard_get_mut(parent).color = Color::Red;
                self.rotate(parent, dir);
                continue;
            }

            let close_nephew = self.arena.hard_get(sibling).child(dir);
            let far_nephew = self.arena.hard_get(sibling).child(dir.opposite());
            let far_is_red = far_nephew.map_or(false, |n| self.arena.hard_get(n).is_red());
            let close_is_red = close_nephew.map_or(false, |n| self.arena.hard_get(n).is_red());

            if far_is_red {
                // Case 4: far nephew Red.
                let parent_color = self.arena.hard_get(parent).color;
                self.arena.hard_get_mut(sibling).color = parent_color;
                self.arena.hard_get_mut(parent).color = Color::Black;
                self.arena.hard_get_mut(far_nephew.unwrap()).color = Color::Black;
                self.rotate(parent, dir);
                break;
            } else if close_is_red {
                // Case 3: close nephew Red, far nephew Black.
                let parent_color = self.arena.hard_get(parent).color;
                self.arena.hard_get_mut(close_nephew.unwrap()).color = Color::Black;
                self.arena.hard_get_mut(sibling).color = Color::Red;
                self.rotate(sibling, dir.opposite());

                let new_sibling = self
                    .arena
                    .hard_get(parent)
                    .child(dir.opposite())
                    .expect("Internal invariant failed: rotation did not produce a new sibling");
                self.arena.hard_get_mut(new_sibling).color = parent_color;
                self.arena.hard_get_mut(parent).color = Color::Black;
                if let Some(new_far) = self.arena.hard_get(new_sibling).child(dir.opposite()) {
                    self.arena.hard_get_mut(new_far).color = Color::Black;
                }
                self.rotate(parent, dir);
                break;
            } else {
                // Case 2: both nephews Black.
                self.arena.hard_get_mut(sibling).color = Color::Red;
                if self.arena.hard_get(parent).is_red() {
                    self.arena.hard_get_mut(parent).color = Color::Black;
                    break;
                }
                match self.arena.hard_get(parent).parent {
                    Some(gp) => {
                        dir = self.child_dir(gp, parent);
                        parent = gp;
                        continue;
                    }
                    None => break,
                }
            }
        }
    }

    // ---- Other mutators ----

    pub fn set_payload_at(&mut self, h: Handle, payload: P) -> P {
        mem::replace(&mut self.arena.hard_get_mut(h).payload, payload)
    }

    /// Precondition: `head`'s derived key at `h` is unchanged relative to
    /// `h`'s prefix (checked only under `debug_assertions`).
    pub fn set_head_at(&mut self, h: Handle, head: H) -> H {
        #[cfg(debug_assertions)]
        let (prefix, old_key) = {
            let prefix = self.summary_before(h);
            let old_key = K::derive(&prefix, &self.arena.hard_get(h).head);
            (prefix, old_key)
        };

        let old_head = mem::replace(&mut self.arena.hard_get_mut(h).head, head);
        self.update_summaries_at_and_above(h);

        #[cfg(debug_assertions)]
        {
            let new_key = K::derive(&prefix, &self.arena.hard_get(h).head);
            debug_assert!(
                old_key == new_key,
                "set_head_at: head change altered this node's derived key"
            );
        }

        old_head
    }

    pub fn clear(&mut self, keep_capacity: bool) {
        if keep_capacity {
            self.arena.clear();
        } else {
            self.arena = NodeArena::new();
        }
        self.root = None;
        self.leftmost = None;
        self.rightmost = None;
        self.len = 0;
    }

    // ---- Sequence generation ----

    pub fn generate(&self) -> super::iter::Cursor<'_, H, S, P, K> {
        super::iter::Cursor::new(self, self.leftmost)
    }

    pub fn generate_from(&self, h: Handle) -> super::iter::Cursor<'_, H, S, P, K> {
        super::iter::Cursor::new(self, Some(h))
    }

    // ---- Bulk operations ----

    /// Precondition: every derived key in `self` is less than every derived
    /// key in `other`. Drains `other` entirely; `other` is left empty.
    pub fn append(&mut self, other: &mut Tree<H, S, P, K>) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            mem::swap(self, other);
            return;
        }

        self.reserve_capacity(other.len());

        let mut tail = self.rightmost;
        while let Some(h) = other.leftmost {
            let (node, _) = other.excise(h);
            tail = Some(self.insert_after(node.payload, node.head, tail));
        }
    }

    /// Re-inserts every element of `other` into `self` by key, without any
    /// ordering precondition. Drains `other` entirely.
    pub fn merge(&mut self, other: &mut Tree<H, S, P, K>) {
        while let Some(h) = other.root {
            let (node, _) = other.excise(h);
            self.insert(node.payload, node.head);
        }
    }
}

impl<H, S, P, K> Default for Tree<H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<H, S, P, K> FromIterator<(H, P)> for Tree<H, S, P, K>
where
    S: Monoid + FromHead<H>,
    K: DerivedKey<S, H>,
{
    fn from_iter<I: IntoIterator<Item = (H, P)>>(iter: I) -> Self {
        let mut tree = Tree::new();
        for (head, payload) in iter {
            tree.insert(payload, head);
        }
        tree
    }
}
