//! Scoped mutation rights
//!
//! - Acquires on creation
//! - Releases on drop, including early return and unwinding

use super::Coordinator;

/// Holds mutation rights on a [`Coordinator`] for its lifetime.
///
/// # Usage
///
/// ```ignore
/// let _scope = MutationScope::enter(&coordinator);
/// // ... mutate the container ...
/// // dropping the scope marks the index stale
/// ```
///
/// Scopes nest: only the outermost one claims and releases.
#[must_use = "mutation rights are released as soon as the scope is dropped"]
pub struct MutationScope<'a> {
    coordinator: &'a Coordinator,
}

impl<'a> MutationScope<'a> {
    /// Acquire mutation rights, forcing the background role out of any
    /// in-progress build.
    pub fn enter(coordinator: &'a Coordinator) -> Self {
        coordinator.acquire_for_mutation();
        Self { coordinator }
    }
}

impl Drop for MutationScope<'_> {
    fn drop(&mut self) {
        self.coordinator.release_from_mutation();
    }
}
