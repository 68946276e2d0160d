//! IndexSet - key membership list with O(1) insert, remove and lookup
//!
//! Keys live in a dense `Vec` for cheap iteration; a position map lets
//! `remove` swap the last key into the hole instead of scanning. Iteration
//! order is insertion order until the first removal.

use std::collections::HashMap;
use std::hash::Hash;

/// Dense set of copyable keys
#[derive(Clone, Debug)]
pub struct IndexSet<K> {
    items: Vec<K>,
    positions: HashMap<K, usize>,
}

impl<K: Copy + Eq + Hash> IndexSet<K> {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            positions: HashMap::new(),
        }
    }

    /// Insert a key. Returns `false` if it was already present.
    pub fn insert(&mut self, key: K) -> bool {
        if self.positions.contains_key(&key) {
            return false;
        }
        self.positions.insert(key, self.items.len());
        self.items.push(key);
        true
    }

    /// Remove a key. Returns `false` if it was not present.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(position) = self.positions.remove(&key) else {
            return false;
        };

        self.items.swap_remove(position);
        if let Some(moved) = self.items.get(position) {
            self.positions.insert(*moved, position);
        }
        true
    }

    pub fn contains(&self, key: K) -> bool {
        self.positions.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = K> + '_ {
        self.items.iter().copied()
    }

    pub fn as_slice(&self) -> &[K] {
        &self.items
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.positions.clear();
    }
}

impl<K: Copy + Eq + Hash> Default for IndexSet<K> {
    fn default() -> Self {
        Self::new()
    }
}
