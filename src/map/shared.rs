//! State shared between the map handle and its background builder
//!
//! The container and the index arrays sit in `UnsafeCell`s. The coordinator
//! state, not a lock, decides who may touch them:
//!
//! | data      | foreground                          | background                   |
//! |-----------|-------------------------------------|------------------------------|
//! | container | reads any time, writes while claimed | reads in `Indexing1` only    |
//! | index     | reads in `Stable` only               | writes in `Mutated`/`Indexing*` |
//!
//! Foreground writes need `&mut IndexedMap`, so no foreground read can
//! overlap them.

use std::cell::UnsafeCell;

use crate::coordinator::Coordinator;
use crate::index::LevelIndex;
use crate::observability::IndexMetrics;

use super::Store;

pub(crate) struct Shared<K, V> {
    pub(crate) coordinator: Coordinator,
    pub(crate) metrics: IndexMetrics,
    store: UnsafeCell<Store<K, V>>,
    index: UnsafeCell<LevelIndex<K>>,
}

// SAFETY: access to both cells follows the table above, enforced by the
// coordinator protocol and by `&mut self` on every foreground mutation.
unsafe impl<K: Send + Sync, V: Send + Sync> Sync for Shared<K, V> {}

impl<K: Ord + Clone, V> Shared<K, V> {
    pub(crate) fn new(coordinator: Coordinator, sample_step: usize) -> Self {
        Self {
            coordinator,
            metrics: IndexMetrics::new(),
            store: UnsafeCell::new(Store::new()),
            index: UnsafeCell::new(LevelIndex::new(sample_step)),
        }
    }
}

impl<K, V> Shared<K, V> {
    /// # Safety
    ///
    /// No `&mut Store` may be live. The background role may call this only
    /// while it owns `Indexing1`.
    pub(crate) unsafe fn store(&self) -> &Store<K, V> {
        &*self.store.get()
    }

    /// # Safety
    ///
    /// Foreground only, while holding mutation rights (or with indexing
    /// disabled), and with no outstanding shared borrow of the store.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn store_mut(&self) -> &mut Store<K, V> {
        &mut *self.store.get()
    }

    /// # Safety
    ///
    /// Foreground only, after observing `Stable`.
    pub(crate) unsafe fn index(&self) -> &LevelIndex<K> {
        &*self.index.get()
    }

    /// # Safety
    ///
    /// Background only, after observing `Mutated`, `Indexing1` or `Indexing2`.
    /// The reference must be dropped before publishing `Stable`.
    #[allow(clippy::mut_from_ref)]
    pub(crate) unsafe fn index_mut(&self) -> &mut LevelIndex<K> {
        &mut *self.index.get()
    }
}
