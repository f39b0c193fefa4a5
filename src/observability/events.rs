//! Observable events for the indexed map
//!
//! Every log record carries one of these names in its `event` field.
//! Events are explicit and typed.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Worker lifecycle
    /// Background indexer thread started
    WorkerStart,
    /// Background indexer thread stopped
    WorkerStop,
    /// Background indexer thread could not be spawned
    WorkerSpawnFailed,
    /// Background indexer thread panicked
    WorkerPanicked,
    /// Indexing switched off for good
    IndexingDisabled,

    // Index builds
    /// A rebuild started from the first entry
    BuildBegin,
    /// A rebuild published a stable index
    BuildComplete,
    /// A rebuild was abandoned for a mutation
    BuildAbandoned,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::WorkerStart => "INDEX_WORKER_START",
            Event::WorkerStop => "INDEX_WORKER_STOP",
            Event::WorkerSpawnFailed => "INDEX_WORKER_SPAWN_FAILED",
            Event::WorkerPanicked => "INDEX_WORKER_PANICKED",
            Event::IndexingDisabled => "INDEXING_DISABLED",
            Event::BuildBegin => "INDEX_BUILD_BEGIN",
            Event::BuildComplete => "INDEX_BUILD_COMPLETE",
            Event::BuildAbandoned => "INDEX_BUILD_ABANDONED",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
