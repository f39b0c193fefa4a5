//! Coordination state shared by the foreground and background roles
//!
//! The state is a single `u8` behind an atomic. Both roles advance it, the
//! background role only ever through compare-and-swap against the state it
//! last observed.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Phase of the index lifecycle.
///
/// # Ownership of transitions
///
/// - Foreground: `MutateBegin`, `Mutating`, `Mutated`, `Quit`
/// - Background: `Mutated → Indexing1`, `Indexing1 → Indexing2`,
///   `Indexing2 → Stable`, plus the acknowledgements `MutateBegin → Stable`
///   and `Quit → QuitDone`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CoordState {
    /// Index is complete (or the last build was aborted and acknowledged)
    Stable = 0,
    /// Foreground asked the background to abandon its build
    MutateBegin = 1,
    /// Foreground holds mutation rights
    Mutating = 2,
    /// Container changed, index must be rebuilt
    Mutated = 3,
    /// Level-1 array is being built
    Indexing1 = 4,
    /// Level-2 samples are being built
    Indexing2 = 5,
    /// Foreground asked the background to stop
    Quit = 6,
    /// Background has stopped touching shared state
    QuitDone = 7,
}

impl CoordState {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            CoordState::Stable => "STABLE",
            CoordState::MutateBegin => "MUTATE_BEGIN",
            CoordState::Mutating => "MUTATING",
            CoordState::Mutated => "MUTATED",
            CoordState::Indexing1 => "INDEXING_1",
            CoordState::Indexing2 => "INDEXING_2",
            CoordState::Quit => "QUIT",
            CoordState::QuitDone => "QUIT_DONE",
        }
    }

    /// True once a stop was requested or completed.
    pub fn is_stopping(&self) -> bool {
        matches!(self, CoordState::Quit | CoordState::QuitDone)
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => CoordState::Stable,
            1 => CoordState::MutateBegin,
            2 => CoordState::Mutating,
            3 => CoordState::Mutated,
            4 => CoordState::Indexing1,
            5 => CoordState::Indexing2,
            6 => CoordState::Quit,
            // Only values produced by `as u8` are ever stored.
            _ => CoordState::QuitDone,
        }
    }
}

impl fmt::Display for CoordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Atomic holder for [`CoordState`].
///
/// Loads are `Acquire`, stores `Release` and exchanges `AcqRel`, so a role
/// that observes a state also observes every write the other role made
/// before publishing it.
#[derive(Debug)]
pub struct AtomicCoordState {
    raw: AtomicU8,
}

impl AtomicCoordState {
    pub fn new(state: CoordState) -> Self {
        Self {
            raw: AtomicU8::new(state as u8),
        }
    }

    pub fn load(&self) -> CoordState {
        CoordState::from_u8(self.raw.load(Ordering::Acquire))
    }

    pub fn store(&self, state: CoordState) {
        self.raw.store(state as u8, Ordering::Release);
    }

    /// Move from `expected` to `next` only if nobody changed the state in
    /// between. On failure returns the state actually found.
    pub fn compare_exchange(
        &self,
        expected: CoordState,
        next: CoordState,
    ) -> Result<CoordState, CoordState> {
        self.raw
            .compare_exchange(
                expected as u8,
                next as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(CoordState::from_u8)
            .map_err(CoordState::from_u8)
    }
}
