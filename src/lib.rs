//! bkmap - an ordered map indexed in the background
//!
//! Mutations go straight to an ordered container. After each mutation burst
//! a background worker rebuilds a two-level positional index, and lookups use
//! it whenever it is known to be current. The index is derived state: turning
//! it off changes speed, never results.
//!
//! - [`coordinator`]: lock-free handshake between the mutating thread and the indexer
//! - [`index`]: index layout, builder, worker, configuration and errors
//! - [`map`]: the public [`IndexedMap`]
//! - [`observability`]: events and counters

pub mod coordinator;
pub mod index;
pub mod map;
pub mod observability;

pub use coordinator::CoordState;
pub use index::{IndexConfig, MapError, MapResult};
pub use map::IndexedMap;
pub use observability::MetricsSnapshot;
