//! Ordered map with a background-built positional index
//!
//! # API
//!
//! - `insert(key, value)` / `remove(key)` / `clear()` - mutate, mark the index stale
//! - `find(key)` - indexed lookup when ready, direct search otherwise
//! - `perform_batched(action)` - many mutations under one acquisition
//! - `is_index_ready()` / `wait_until_ready(timeout)` - index availability
//! - `disable_indexing()` - stop the indexer for good
//!
//! # Invariants
//!
//! - `find` returns the same entry on either lookup path
//! - Mutations take `&mut self`: one mutator at a time, and never while a
//!   reference returned by `find` is alive
//! - Dropping the map stops and joins the indexer before the container is freed

mod shared;
mod store;

pub(crate) use shared::Shared;
pub(crate) use store::{Position, Store};

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::coordinator::{CoordState, Coordinator, MutationScope};
use crate::index::{IndexConfig, IndexWorker, MapError, MapResult};
use crate::observability::{Event, MetricsSnapshot};

/// Ordered key-value map whose lookups speed up once a background worker
/// has indexed it.
///
/// # Example
///
/// ```ignore
/// let mut map = IndexedMap::new();
/// for i in 0..1000 {
///     map.insert(i, i + 1);
/// }
/// assert_eq!(map.find(&10), Some((&10, &11)));
/// map.wait_until_ready(Duration::from_secs(1));
/// assert_eq!(map.find(&10), Some((&10, &11)));
/// ```
pub struct IndexedMap<K, V> {
    shared: Arc<Shared<K, V>>,
    worker: Option<IndexWorker<K, V>>,
    config: IndexConfig,
}

impl<K, V> IndexedMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    /// Create an empty map with the default configuration.
    ///
    /// If the indexer thread cannot be spawned the map still works, with
    /// every lookup served by direct search.
    pub fn new() -> Self {
        let mut map = Self::unstarted(IndexConfig::default());
        if let Err(e) = map.start_worker() {
            tracing::error!(
                event = %Event::WorkerSpawnFailed,
                error = %e,
                "index worker unavailable, lookups use direct search"
            );
            map.shared.coordinator.mark_quit_done();
        }
        map
    }

    /// Create an empty map with an explicit configuration.
    pub fn with_config(config: IndexConfig) -> MapResult<Self> {
        config.validate()?;
        let mut map = Self::unstarted(config);
        map.start_worker().map_err(|source| MapError::WorkerSpawn {
            name: map.config.worker_name.clone(),
            source,
        })?;
        Ok(map)
    }

    fn unstarted(config: IndexConfig) -> Self {
        let coordinator = if config.enabled {
            Coordinator::new(config.spin_limit)
        } else {
            Coordinator::disabled(config.spin_limit)
        };
        Self {
            shared: Arc::new(Shared::new(coordinator, config.sample_step)),
            worker: None,
            config,
        }
    }

    fn start_worker(&mut self) -> std::io::Result<()> {
        if self.config.enabled {
            self.worker = Some(IndexWorker::spawn(Arc::clone(&self.shared), &self.config)?);
        }
        Ok(())
    }

    /// Insert or overwrite an entry.
    pub fn insert(&mut self, key: K, value: V) {
        let _scope = MutationScope::enter(&self.shared.coordinator);
        // SAFETY: the scope holds mutation rights; the builder is not
        // traversing the container.
        unsafe { self.shared.store_mut() }.insert(key, value);
        self.shared.metrics.increment_mutations();
    }

    /// Remove an entry, returning its value. Absent keys are a no-op.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let _scope = MutationScope::enter(&self.shared.coordinator);
        self.shared.metrics.increment_mutations();
        // SAFETY: as in `insert`.
        unsafe { self.shared.store_mut() }.remove(key)
    }

    /// Remove every entry. Index storage keeps its capacity.
    pub fn clear(&mut self) {
        let _scope = MutationScope::enter(&self.shared.coordinator);
        // SAFETY: as in `insert`.
        unsafe { self.shared.store_mut() }.clear();
        self.shared.metrics.increment_mutations();
    }

    /// Look up `key`. `None` is the "not found" answer.
    pub fn find<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        // SAFETY: the builder only reads the container, and foreground
        // writes need `&mut self`.
        let store = unsafe { self.shared.store() };

        if self.shared.coordinator.is_index_ready() {
            self.shared.metrics.increment_indexed_lookups();
            // SAFETY: Stable means the builder published the arrays and will
            // not touch them again before a mutation, which needs `&mut self`.
            let index = unsafe { self.shared.index() };
            let (key, position) = index.search(key)?;
            return store.value(position).map(|value| (key, value));
        }

        self.shared.metrics.increment_direct_lookups();
        store.get(key)
    }

    /// Run `action` under a single acquisition.
    ///
    /// Mutations inside `action` acquire re-entrantly and do not publish
    /// `Mutated` until the batch ends, so the indexer stays idle meanwhile.
    pub fn perform_batched<R, F>(&mut self, action: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let shared = Arc::clone(&self.shared);
        let _scope = MutationScope::enter(&shared.coordinator);
        action(self)
    }

    /// Stop the indexer for good; lookups use direct search afterwards.
    ///
    /// Meant for comparison measurements. Safe inside `perform_batched`.
    pub fn disable_indexing(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            tracing::info!(
                event = %Event::IndexingDisabled,
                worker = worker.name(),
                "indexing disabled"
            );
        }
    }
}

impl<K, V> IndexedMap<K, V> {
    /// Number of entries.
    pub fn len(&self) -> usize {
        // SAFETY: shared read, see `find`.
        unsafe { self.shared.store() }.len()
    }

    pub fn is_empty(&self) -> bool {
        // SAFETY: shared read, see `find`.
        unsafe { self.shared.store() }.is_empty()
    }

    /// True iff lookups currently go through the index.
    pub fn is_index_ready(&self) -> bool {
        self.shared.coordinator.is_index_ready()
    }

    /// Block until the index is ready.
    ///
    /// Returns false on timeout or when indexing is disabled.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        self.shared.coordinator.wait_until_ready(timeout)
    }

    /// Current coordination state.
    pub fn state(&self) -> CoordState {
        self.shared.coordinator.state()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.snapshot()
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }
}

impl<K, V> Default for IndexedMap<K, V>
where
    K: Ord + Clone + Send + Sync + 'static,
    V: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for IndexedMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndexedMap")
            .field("len", &self.len())
            .field("state", &self.state())
            .field("sample_step", &self.config.sample_step)
            .field("lookups", &self.metrics().lookups())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WAIT: Duration = Duration::from_secs(10);

    #[test]
    fn test_new_map_is_empty() {
        let map: IndexedMap<i32, i32> = IndexedMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.find(&0), None);
    }

    #[test]
    fn test_insert_overwrites() {
        let mut map = IndexedMap::new();
        map.insert(1, "one");
        map.insert(1, "uno");

        assert_eq!(map.len(), 1);
        assert_eq!(map.find(&1), Some((&1, &"uno")));
    }

    #[test]
    fn test_remove_and_absent_remove() {
        let mut map = IndexedMap::new();
        map.insert(1, 10);
        map.insert(2, 20);

        assert_eq!(map.remove(&3), None);
        assert_eq!(map.remove(&1), Some(10));
        assert_eq!(map.len(), 1);

        assert!(map.wait_until_ready(WAIT));
        assert_eq!(map.find(&1), None);
        assert_eq!(map.find(&2), Some((&2, &20)));
    }

    #[test]
    fn test_batch_keeps_index_stale_until_done() {
        let mut map = IndexedMap::new();

        map.perform_batched(|m| {
            for i in 0..100 {
                m.insert(i, i);
            }
            assert_eq!(m.state(), CoordState::Mutating);
            assert!(!m.is_index_ready());
        });

        assert!(map.wait_until_ready(WAIT));
        assert_eq!(map.len(), 100);
    }

    #[test]
    fn test_lookup_paths_are_counted() {
        let mut map = IndexedMap::new();
        map.perform_batched(|m| {
            m.insert(1, 1);
            assert_eq!(m.find(&1), Some((&1, &1)));
        });
        assert!(map.wait_until_ready(WAIT));
        assert_eq!(map.find(&1), Some((&1, &1)));

        let metrics = map.metrics();
        assert_eq!(metrics.direct_lookups, 1);
        assert_eq!(metrics.indexed_lookups, 1);
        assert_eq!(metrics.mutations, 1);
    }

    #[test]
    fn test_disabled_config_never_indexes() {
        let mut map = IndexedMap::with_config(IndexConfig::disabled()).unwrap();
        map.insert(5, 50);

        assert_eq!(map.state(), CoordState::QuitDone);
        assert!(!map.wait_until_ready(Duration::from_millis(10)));
        assert_eq!(map.find(&5), Some((&5, &50)));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let err = IndexedMap::<i32, i32>::with_config(IndexConfig::default().with_sample_step(0))
            .unwrap_err();
        assert_eq!(err.code(), "BKMAP_CONFIG_INVALID");
    }

    /// Size and formatting work through the unbounded impl.
    fn describe<K, V>(map: &IndexedMap<K, V>) -> (usize, bool, String) {
        (map.len(), map.is_empty(), format!("{:?}", map))
    }

    #[test]
    fn test_size_and_debug_in_generic_context() {
        let mut map = IndexedMap::new();
        map.insert(3u8, 'c');
        assert_eq!(map.find(&3), Some((&3, &'c')));

        let (len, empty, debug) = describe(&map);
        assert_eq!(len, 1);
        assert!(!empty);
        assert!(debug.contains("lookups: 1"));
    }

    #[test]
    fn test_debug_output() {
        let mut map = IndexedMap::new();
        map.insert("a".to_string(), 1);

        let debug = format!("{:?}", map);
        assert!(debug.contains("IndexedMap"));
        assert!(debug.contains("len: 1"));
    }
}
