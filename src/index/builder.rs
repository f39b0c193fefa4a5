//! Background index builder
//!
//! A step function over the coordination state. Each call reads the state
//! once and does a bounded amount of work for it:
//!
//! - `Quit` → exit (dropping the builder publishes `QuitDone`)
//! - `MutateBegin` → forget progress, acknowledge with `Stable`
//! - `Stable` / `Mutating` → park until there is work
//! - `Mutated` → clear both levels, CAS `Mutated → Indexing1`
//! - `Indexing1` → copy up to `chunk` entries into level 1; at the end
//!   CAS `Indexing1 → Indexing2`
//! - `Indexing2` → sample up to `chunk` level-2 keys; at the end
//!   CAS `Indexing2 → Stable`
//!
//! A failed CAS means the foreground changed the state; the next step reads
//! it again.

use std::ops::Bound;
use std::sync::Arc;
use std::time::Instant;

use crate::coordinator::CoordState;
use crate::map::Shared;
use crate::observability::Event;

/// Whether the driver should keep stepping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Flow {
    Continue,
    Exit,
}

pub(crate) struct IndexBuilder<K, V> {
    shared: Arc<Shared<K, V>>,
    /// Last key copied into level 1. `None` when no build is in progress.
    cursor: Option<Bound<K>>,
    /// Next level-1 slot to sample into level 2.
    sample_at: usize,
    chunk: usize,
    started: Option<Instant>,
}

impl<K, V> IndexBuilder<K, V>
where
    K: Ord + Clone + Send + Sync,
    V: Send + Sync,
{
    pub(crate) fn new(shared: Arc<Shared<K, V>>, chunk: usize) -> Self {
        Self {
            shared,
            cursor: None,
            sample_at: 0,
            chunk: chunk.max(1),
            started: None,
        }
    }

    /// Step until asked to quit.
    pub(crate) fn run(mut self) {
        while self.step() == Flow::Continue {}
    }

    pub(crate) fn step(&mut self) -> Flow {
        match self.shared.coordinator.state() {
            CoordState::Quit | CoordState::QuitDone => return Flow::Exit,
            CoordState::MutateBegin => self.abandon(),
            CoordState::Stable | CoordState::Mutating => {
                self.shared.coordinator.wait_for_work();
            }
            CoordState::Mutated => self.begin(),
            CoordState::Indexing1 => self.index_entries(),
            CoordState::Indexing2 => self.sample_keys(),
        }
        Flow::Continue
    }

    fn abandon(&mut self) {
        if self.cursor.take().is_some() {
            self.shared.metrics.increment_builds_abandoned();
            tracing::debug!(event = %Event::BuildAbandoned, "index build abandoned for mutation");
        }
        self.started = None;
        self.shared.coordinator.acknowledge_abort();
    }

    fn begin(&mut self) {
        // SAFETY: state is Mutated, lookups do not read the arrays.
        let index = unsafe { self.shared.index_mut() };
        index.clear();

        if self
            .shared
            .coordinator
            .advance(CoordState::Mutated, CoordState::Indexing1)
        {
            self.cursor = Some(Bound::Unbounded);
            self.sample_at = 0;
            self.started = Some(Instant::now());
            self.shared.metrics.increment_builds_started();
            tracing::debug!(event = %Event::BuildBegin, "index build started");
        }
    }

    fn index_entries(&mut self) {
        // SAFETY: we own Indexing1; a mutation first waits for our abort
        // acknowledgement, so the container is not written meanwhile.
        let store = unsafe { self.shared.store() };
        let index = unsafe { self.shared.index_mut() };

        let cursor = self.cursor.get_or_insert(Bound::Unbounded);
        let mut copied = 0;
        let mut last = None;
        for (key, position) in store.entries_from(cursor).take(self.chunk) {
            index.push_entry(key.clone(), *position);
            last = Some(key);
            copied += 1;
        }
        if let Some(key) = last {
            *cursor = Bound::Excluded(key.clone());
        }
        self.shared.metrics.add_entries_indexed(copied as u64);

        if copied < self.chunk {
            index.clear_samples();
            self.sample_at = 0;
            self.shared
                .coordinator
                .advance(CoordState::Indexing1, CoordState::Indexing2);
        }
    }

    fn sample_keys(&mut self) {
        // SAFETY: we own Indexing2; lookups do not read the arrays yet.
        let index = unsafe { self.shared.index_mut() };
        let step = index.step();

        for _ in 0..self.chunk {
            if index.push_sample(self.sample_at) {
                self.sample_at += step;
                continue;
            }

            let entries = index.level1_len();
            let samples = index.level2_len();
            // The arrays belong to lookups from here on.
            if self
                .shared
                .coordinator
                .advance(CoordState::Indexing2, CoordState::Stable)
            {
                self.cursor = None;
                self.shared.metrics.increment_builds_completed();
                let elapsed_us = self
                    .started
                    .take()
                    .map_or(0, |start| start.elapsed().as_micros() as u64);
                tracing::debug!(
                    event = %Event::BuildComplete,
                    entries,
                    samples,
                    elapsed_us,
                    "index build complete"
                );
            }
            return;
        }
    }
}

impl<K, V> Drop for IndexBuilder<K, V> {
    fn drop(&mut self) {
        // Also runs when a step panics, so shutdown never waits forever.
        self.shared.coordinator.mark_quit_done();
    }
}
