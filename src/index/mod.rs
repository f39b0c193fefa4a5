//! Background positional index
//!
//! The index is derived state: a sorted snapshot of the container rebuilt
//! from scratch after every mutation burst, on a background worker.
//!
//! # Design Principles
//!
//! - Correctness-neutral: a lookup through the index returns exactly what a
//!   direct container search returns
//! - Trusted only in `Stable`; every other state falls back to the container
//! - No incremental maintenance: any mutation abandons the current build
//!
//! # Layout
//!
//! - Level 1: `(key, position)` per entry
//! - Level 2: every `sample_step`-th level-1 key

mod builder;
mod config;
mod errors;
mod levels;
mod worker;

pub use config::{IndexConfig, DEFAULT_SAMPLE_STEP};
pub use errors::{MapError, MapResult};
pub(crate) use levels::LevelIndex;
pub(crate) use worker::IndexWorker;
