//! Hybrid spin-then-park wait on the coordination state
//!
//! Waiters spin briefly (state changes are usually quick hand-offs), then
//! park on a condition variable. Every state change calls [`StateSignal::notify`].

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::state::{AtomicCoordState, CoordState};

/// Wakeup channel paired with an [`AtomicCoordState`].
#[derive(Debug)]
pub struct StateSignal {
    mutex: Mutex<()>,
    condvar: Condvar,
    spin_limit: u32,
}

impl StateSignal {
    pub fn new(spin_limit: u32) -> Self {
        Self {
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
            spin_limit,
        }
    }

    /// Wake every parked waiter.
    ///
    /// Callers change the state first. Taking the mutex here orders the
    /// wakeup after any waiter that checked the old state under the lock.
    pub fn notify(&self) {
        drop(self.mutex.lock());
        self.condvar.notify_all();
    }

    /// Block until `ready` accepts the current state and return that state.
    pub fn wait_until<F>(&self, state: &AtomicCoordState, ready: F) -> CoordState
    where
        F: Fn(CoordState) -> bool,
    {
        if let Some(found) = self.spin(state, &ready) {
            return found;
        }

        let mut guard = self.mutex.lock();
        loop {
            let current = state.load();
            if ready(current) {
                return current;
            }
            self.condvar.wait(&mut guard);
        }
    }

    /// Like [`Self::wait_until`] but gives up after `timeout`.
    ///
    /// Returns `None` on timeout.
    pub fn wait_until_timeout<F>(
        &self,
        state: &AtomicCoordState,
        ready: F,
        timeout: Duration,
    ) -> Option<CoordState>
    where
        F: Fn(CoordState) -> bool,
    {
        if let Some(found) = self.spin(state, &ready) {
            return Some(found);
        }

        let deadline = Instant::now() + timeout;
        let mut guard = self.mutex.lock();
        loop {
            let current = state.load();
            if ready(current) {
                return Some(current);
            }
            if self.condvar.wait_until(&mut guard, deadline).timed_out() {
                let current = state.load();
                return ready(current).then_some(current);
            }
        }
    }

    fn spin<F>(&self, state: &AtomicCoordState, ready: &F) -> Option<CoordState>
    where
        F: Fn(CoordState) -> bool,
    {
        for attempt in 0..self.spin_limit {
            let current = state.load();
            if ready(current) {
                return Some(current);
            }
            if attempt < self.spin_limit / 2 {
                std::hint::spin_loop();
            } else {
                std::thread::yield_now();
            }
        }
        None
    }
}
