//! Observability for the indexed map
//!
//! - Structured logs through `tracing`, one typed [`Event`] per record
//! - Counters in [`IndexMetrics`]
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. Hot paths (insert, find) only bump relaxed counters, never log
//! 3. Build lifecycle logs at DEBUG, worker lifecycle at INFO, failures at ERROR

mod events;
mod metrics;

pub use events::Event;
pub use metrics::{IndexMetrics, MetricsSnapshot};
