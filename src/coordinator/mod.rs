//! Coordinator between the foreground mutator and the background indexer
//!
//! One atomic state decides who may touch the container and the index. No
//! mutex guards the data itself.
//!
//! # Protocol
//!
//! - Foreground claims `Mutating` before touching the container and
//!   publishes `Mutated` when done
//! - Background moves `Mutated → Indexing1 → Indexing2 → Stable`, each step
//!   by compare-and-swap, so a foreground-forced state is never overwritten
//! - A claim that finds the background mid-build requests `MutateBegin`
//!   and waits for the `Stable` acknowledgement before mutating
//!
//! # Preconditions
//!
//! There is one logical foreground role. `acquire_for_mutation` from two
//! threads at once is not supported; `IndexedMap` rules it out by taking
//! `&mut self` for every mutation.

mod scope;
mod signal;
mod state;

pub use scope::MutationScope;
pub use signal::StateSignal;
pub use state::{AtomicCoordState, CoordState};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Shared coordination state for one map instance.
#[derive(Debug)]
pub struct Coordinator {
    state: AtomicCoordState,
    signal: StateSignal,
    /// Nesting depth of foreground acquisitions. Foreground-only.
    depth: AtomicUsize,
}

impl Coordinator {
    /// Create a coordinator for a map with a live background indexer.
    pub fn new(spin_limit: u32) -> Self {
        Self::with_state(CoordState::Stable, spin_limit)
    }

    /// Create a coordinator for a map that never indexes.
    pub fn disabled(spin_limit: u32) -> Self {
        Self::with_state(CoordState::QuitDone, spin_limit)
    }

    fn with_state(state: CoordState, spin_limit: u32) -> Self {
        Self {
            state: AtomicCoordState::new(state),
            signal: StateSignal::new(spin_limit),
            depth: AtomicUsize::new(0),
        }
    }

    /// Current state.
    pub fn state(&self) -> CoordState {
        self.state.load()
    }

    /// True iff the index may be used for lookups. Never blocks.
    pub fn is_index_ready(&self) -> bool {
        self.state.load() == CoordState::Stable
    }

    /// True once indexing was stopped for good.
    pub fn is_indexing_disabled(&self) -> bool {
        self.state.load().is_stopping()
    }

    /// Current foreground nesting depth.
    pub fn depth(&self) -> usize {
        self.depth.load(Ordering::Relaxed)
    }

    /// Acquire mutation rights for the duration of the returned scope.
    pub fn scope(&self) -> MutationScope<'_> {
        MutationScope::enter(self)
    }

    /// Claim mutation rights.
    ///
    /// Nested calls only bump the depth. The outermost call forces the
    /// background role out of `Indexing1`/`Indexing2` and claims `Mutating`.
    pub fn acquire_for_mutation(&self) {
        let depth = self.depth();
        self.depth.store(depth + 1, Ordering::Relaxed);
        if depth == 0 {
            self.claim();
        }
    }

    /// Give up mutation rights.
    ///
    /// The outermost release marks the index stale (`Mutated`). A map whose
    /// indexing is disabled stays in `QuitDone`.
    pub fn release_from_mutation(&self) {
        let depth = self.depth();
        debug_assert!(depth > 0, "release without matching acquire");
        if depth == 0 {
            return;
        }
        self.depth.store(depth - 1, Ordering::Relaxed);
        if depth == 1
            && self
                .state
                .compare_exchange(CoordState::Mutating, CoordState::Mutated)
                .is_ok()
        {
            self.signal.notify();
        }
    }

    fn claim(&self) {
        let mut current = self.state.load();
        loop {
            match current {
                // Background is idle, or saw the change but has not started
                // traversing; its own Mutated -> Indexing1 CAS will fail.
                CoordState::Stable | CoordState::Mutated => {
                    match self.state.compare_exchange(current, CoordState::Mutating) {
                        Ok(_) => return,
                        Err(found) => current = found,
                    }
                }
                CoordState::Indexing1 | CoordState::Indexing2 => {
                    match self.state.compare_exchange(current, CoordState::MutateBegin) {
                        Ok(_) => {
                            self.signal.notify();
                            current = self.await_abort_ack();
                        }
                        Err(found) => current = found,
                    }
                }
                CoordState::MutateBegin => current = self.await_abort_ack(),
                CoordState::Mutating => return,
                // No background worker left to race with.
                CoordState::Quit | CoordState::QuitDone => return,
            }
        }
    }

    fn await_abort_ack(&self) -> CoordState {
        self.signal
            .wait_until(&self.state, |s| s == CoordState::Stable || s.is_stopping())
    }

    /// Block until the index is ready.
    ///
    /// Returns false on timeout or when indexing is disabled.
    pub fn wait_until_ready(&self, timeout: Duration) -> bool {
        let found = self.signal.wait_until_timeout(
            &self.state,
            |s| s == CoordState::Stable || s.is_stopping(),
            timeout,
        );
        found == Some(CoordState::Stable)
    }

    // Background side

    /// Park while there is nothing to build.
    pub(crate) fn wait_for_work(&self) -> CoordState {
        self.signal.wait_until(&self.state, |s| {
            !matches!(s, CoordState::Stable | CoordState::Mutating)
        })
    }

    /// Compare-and-swap `from → to`, waking waiters on success.
    pub(crate) fn advance(&self, from: CoordState, to: CoordState) -> bool {
        let advanced = self.state.compare_exchange(from, to).is_ok();
        if advanced {
            self.signal.notify();
        }
        advanced
    }

    /// Acknowledge an abort request.
    pub(crate) fn acknowledge_abort(&self) -> bool {
        self.advance(CoordState::MutateBegin, CoordState::Stable)
    }

    /// Publish that the background role stopped touching shared state.
    pub(crate) fn mark_quit_done(&self) {
        self.state.store(CoordState::QuitDone);
        self.signal.notify();
    }

    // Shutdown, foreground side

    /// Ask the background role to stop. Returns the state it replaced.
    ///
    /// A background role that already exited (`QuitDone`) is left alone.
    pub(crate) fn request_quit(&self) -> CoordState {
        let mut current = self.state.load();
        loop {
            if current == CoordState::QuitDone {
                return current;
            }
            match self.state.compare_exchange(current, CoordState::Quit) {
                Ok(previous) => {
                    self.signal.notify();
                    return previous;
                }
                Err(found) => current = found,
            }
        }
    }

    /// Block until the background role acknowledged the stop.
    pub(crate) fn wait_quit_done(&self) {
        self.signal
            .wait_until(&self.state, |s| s == CoordState::QuitDone);
    }
}
