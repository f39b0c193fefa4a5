//! Ordered container with stable positions
//!
//! Keys live in a `BTreeMap` that maps each key to a slot in a value arena.
//! A slot never moves while its entry exists, which is what lets the index
//! hold positions across unrelated inserts and removals.

use std::borrow::Borrow;
use std::collections::btree_map::{self, BTreeMap};
use std::ops::Bound;

use slab::Slab;

/// Stable locator for one entry.
///
/// Valid until the entry it points at is removed. The slot may then be
/// reused by a later insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position(usize);

/// The ordered key-value container.
#[derive(Debug)]
pub struct Store<K, V> {
    keys: BTreeMap<K, Position>,
    values: Slab<V>,
}

impl<K, V> Store<K, V> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl<K: Ord, V> Store<K, V> {
    pub fn new() -> Self {
        Self {
            keys: BTreeMap::new(),
            values: Slab::new(),
        }
    }

    /// Insert or overwrite. An overwritten entry keeps its position.
    pub fn insert(&mut self, key: K, value: V) -> Position {
        if let Some(&position) = self.keys.get(&key) {
            if let Some(slot) = self.values.get_mut(position.0) {
                *slot = value;
                return position;
            }
        }
        let position = Position(self.values.insert(value));
        self.keys.insert(key, position);
        position
    }

    /// Remove an entry. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let position = self.keys.remove(key)?;
        self.values.try_remove(position.0)
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// Direct ordered search.
    pub fn get<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (key, position) = self.keys.get_key_value(key)?;
        self.values.get(position.0).map(|value| (key, value))
    }

    /// Value at a position, if the slot is occupied.
    pub fn value(&self, position: Position) -> Option<&V> {
        self.values.get(position.0)
    }

    /// Entries strictly after `cursor` in key order.
    pub fn entries_from(&self, cursor: &Bound<K>) -> btree_map::Range<'_, K, Position> {
        self.keys.range((cursor.as_ref(), Bound::Unbounded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_overwrites_in_place() {
        let mut store = Store::new();

        let first = store.insert(7, "a");
        let second = store.insert(7, "b");

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&7), Some((&7, &"b")));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut store: Store<i32, i32> = Store::new();
        store.insert(1, 10);

        assert_eq!(store.remove(&2), None);
        assert_eq!(store.len(), 1);
        assert_eq!(store.remove(&1), Some(10));
        assert!(store.is_empty());
    }

    #[test]
    fn test_positions_survive_unrelated_changes() {
        let mut store = Store::new();
        let kept = store.insert(5, 50);
        store.insert(1, 10);
        store.insert(9, 90);
        store.remove(&1);
        store.insert(3, 30);

        assert_eq!(store.value(kept), Some(&50));
    }

    #[test]
    fn test_entries_from_cursor() {
        let mut store = Store::new();
        for key in [4, 1, 3, 2] {
            store.insert(key, key * 10);
        }

        let all: Vec<i32> = store.entries_from(&Bound::Unbounded).map(|(k, _)| *k).collect();
        assert_eq!(all, vec![1, 2, 3, 4]);

        let rest: Vec<i32> = store.entries_from(&Bound::Excluded(2)).map(|(k, _)| *k).collect();
        assert_eq!(rest, vec![3, 4]);
    }

    /// Size queries are available without an ordering on keys.
    fn size<K, V>(store: &Store<K, V>) -> (usize, bool) {
        (store.len(), store.is_empty())
    }

    #[test]
    fn test_size_queries_without_ord_bound() {
        let mut store = Store::new();
        assert_eq!(size(&store), (0, true));

        store.insert(1, "a");
        store.insert(2, "b");
        assert_eq!(size(&store), (2, false));
    }

    #[test]
    fn test_clear() {
        let mut store = Store::new();
        store.insert("x".to_string(), 1);
        store.insert("y".to_string(), 2);

        store.clear();

        assert!(store.is_empty());
        assert_eq!(store.get("x"), None);
    }
}
