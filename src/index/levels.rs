//! Two-level positional index
//!
//! - Level 1: every key of the container in order, paired with its position
//! - Level 2: every `step`-th level-1 key
//!
//! A lookup binary-searches level 2 to pick one level-1 segment of at most
//! `step` keys, then binary-searches that segment. Storage is only ever
//! cleared, never shrunk.

use std::borrow::Borrow;

use crate::map::Position;

/// Sorted level-1 and level-2 arrays.
#[derive(Debug)]
pub struct LevelIndex<K> {
    keys: Vec<K>,
    positions: Vec<Position>,
    samples: Vec<K>,
    step: usize,
}

impl<K: Ord + Clone> LevelIndex<K> {
    /// Create an empty index sampling every `step` keys.
    pub fn new(step: usize) -> Self {
        Self {
            keys: Vec::new(),
            positions: Vec::new(),
            samples: Vec::new(),
            step: step.max(1),
        }
    }

    pub fn step(&self) -> usize {
        self.step
    }

    /// Drop all entries, keeping allocated capacity.
    pub fn clear(&mut self) {
        self.keys.clear();
        self.positions.clear();
        self.samples.clear();
    }

    /// Drop level-2 samples only.
    pub fn clear_samples(&mut self) {
        self.samples.clear();
    }

    /// Append the next level-1 entry. Keys must arrive in ascending order.
    pub fn push_entry(&mut self, key: K, position: Position) {
        debug_assert!(self.keys.last().map_or(true, |last| *last < key));
        self.keys.push(key);
        self.positions.push(position);
    }

    /// Sample the level-1 key at `at` into level 2.
    ///
    /// Returns false when `at` is past the end of level 1.
    pub fn push_sample(&mut self, at: usize) -> bool {
        match self.keys.get(at) {
            Some(key) => {
                self.samples.push(key.clone());
                true
            }
            None => false,
        }
    }

    pub fn level1_len(&self) -> usize {
        self.keys.len()
    }

    pub fn level2_len(&self) -> usize {
        self.samples.len()
    }

    /// Find `key` through both levels.
    pub fn search<Q>(&self, key: &Q) -> Option<(&K, Position)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // Greatest sample <= key; keys before every sample land in segment 0.
        let above = self.samples.partition_point(|sample| sample.borrow() <= key);
        let start = above.saturating_sub(1) * self.step;
        let end = start.saturating_add(self.step).min(self.keys.len());
        let segment = self.keys.get(start..end)?;

        let found = segment
            .binary_search_by(|probe| probe.borrow().cmp(key))
            .ok()?;
        let at = start + found;
        Some((&self.keys[at], *self.positions.get(at)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::Store;
    use proptest::prelude::*;
    use std::collections::BTreeSet;
    use std::ops::Bound;

    /// Build an index over `keys` the way the background builder does.
    fn build(keys: &BTreeSet<i64>, step: usize) -> (Store<i64, i64>, LevelIndex<i64>) {
        let mut store = Store::new();
        for key in keys {
            store.insert(*key, key * 2);
        }

        let mut index = LevelIndex::new(step);
        for (key, position) in store.entries_from(&Bound::Unbounded) {
            index.push_entry(*key, *position);
        }
        let mut at = 0;
        while index.push_sample(at) {
            at += step;
        }
        (store, index)
    }

    #[test]
    fn test_empty_index_finds_nothing() {
        let index: LevelIndex<i64> = LevelIndex::new(256);
        assert_eq!(index.search(&0), None);
    }

    #[test]
    fn test_sampling_interval() {
        let keys: BTreeSet<i64> = (0..1000).collect();
        let (_, index) = build(&keys, 256);

        assert_eq!(index.level1_len(), 1000);
        // Samples at 0, 256, 512, 768
        assert_eq!(index.level2_len(), 4);
    }

    #[test]
    fn test_search_segment_boundaries() {
        let keys: BTreeSet<i64> = (0..20).map(|k| k * 10).collect();
        let (store, index) = build(&keys, 4);

        // Sampled keys, keys just past them, and the last segment
        for key in [0, 40, 50, 80, 150, 190] {
            let (found, position) = index.search(&key).unwrap();
            assert_eq!(*found, key);
            assert_eq!(store.value(position), Some(&(key * 2)));
        }
    }

    #[test]
    fn test_search_outside_range() {
        let keys: BTreeSet<i64> = (0..1000).collect();
        let (_, index) = build(&keys, 256);

        assert_eq!(index.search(&-1), None);
        assert_eq!(index.search(&1001), None);
        assert_eq!(index.search(&i64::MAX), None);
    }

    #[test]
    fn test_search_gaps() {
        let keys: BTreeSet<i64> = (0..100).map(|k| k * 3).collect();
        let (_, index) = build(&keys, 8);

        assert_eq!(index.search(&1), None);
        assert_eq!(index.search(&25), None);
        assert!(index.search(&24).is_some());
    }

    #[test]
    fn test_clear_keeps_step() {
        let keys: BTreeSet<i64> = (0..10).collect();
        let (_, mut index) = build(&keys, 3);

        index.clear();

        assert_eq!(index.level1_len(), 0);
        assert_eq!(index.level2_len(), 0);
        assert_eq!(index.step(), 3);
        assert_eq!(index.search(&5), None);
    }

    proptest! {
        #[test]
        fn test_search_agrees_with_store(
            keys in prop::collection::btree_set(-500i64..500, 0..300),
            step in 1usize..40,
            probes in prop::collection::vec(-520i64..520, 1..50),
        ) {
            let (store, index) = build(&keys, step);

            for probe in probes {
                let via_index = index
                    .search(&probe)
                    .and_then(|(key, position)| store.value(position).map(|value| (*key, *value)));
                let direct = store.get(&probe).map(|(key, value)| (*key, *value));
                prop_assert_eq!(via_index, direct);
            }
        }
    }
}
