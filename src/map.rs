//! `OrderedMap<K, V>`: the classic key scheme made concrete — an ordered map
//! with a `BTreeMap`-shaped API.

use crate::tree::{Cursor, Handle, Tree};

/// An ordered map backed by [`crate::Tree`] with `Head = K`, `Payload = V`,
/// and the empty summary.
pub struct OrderedMap<K: Ord + Clone, V> {
    tree: Tree<K, (), V, K>,
}

impl<K: Ord + Clone, V> OrderedMap<K, V> {
    pub fn new() -> Self {
        OrderedMap { tree: Tree::new() }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Inserts a key-value pair, returning the previous value if the key
    /// was already present.
    pub fn insert(&mut self, key: K, val: V) -> Option<V> {
        self.tree.set_payload_of(key, val)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.tree.find(key).map(|h| self.tree.payload_at(h))
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let h = self.tree.find(key)?;
        Some(self.tree.payload_at_mut(h))
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.tree.find(key).is_some()
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        let h = self.tree.find(key)?;
        Some(self.tree.remove(h))
    }

    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        let h = self.tree.leftmost()?;
        Some((self.tree.head_at(h), self.tree.payload_at(h)))
    }

    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        let h = self.tree.rightmost()?;
        Some((self.tree.head_at(h), self.tree.payload_at(h)))
    }

    pub fn clear(&mut self) {
        self.tree.clear(false);
    }

    /// Handle of an entry, for callers that need stable positional access
    /// (e.g. to call [`crate::Tree::summary_before`] on the underlying
    /// engine). Invalidated by any removal.
    pub fn handle_of(&self, key: &K) -> Option<Handle> {
        self.tree.find(key)
    }

    pub fn iter(&self) -> Cursor<'_, K, (), V, K> {
        self.tree.generate()
    }
}

impl<K: Ord + Clone, V> Default for OrderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord + Clone, V> FromIterator<(K, V)> for OrderedMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = OrderedMap::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

impl<'a, K: Ord + Clone, V> IntoIterator for &'a OrderedMap<K, V> {
    type Item = (K, &'a V);
    type IntoIter = Cursor<'a, K, (), V, K>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
