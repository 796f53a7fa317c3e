//! Release gate for the rename barrier
//!
//! Workers check in under the gate's lock and then wait for the owner to
//! open it. Opening is sticky: a worker that arrives after `release()` sees
//! the flag and passes straight through instead of parking forever. Releasing
//! again is harmless.

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

pub struct ReleaseGate {
    released: Mutex<bool>,
    opened: Condvar,
}

impl ReleaseGate {
    pub fn new() -> Self {
        Self {
            released: Mutex::new(false),
            opened: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.released.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `check_in` under the gate lock, then block until released.
    ///
    /// `check_in` runs before the release flag is examined, so the owner can
    /// count arrivals without racing the release.
    pub fn check_in_and_wait(&self, check_in: impl FnOnce()) {
        let mut released = self.lock();
        check_in();
        while !*released {
            released = self
                .opened
                .wait(released)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Open the gate and wake every waiter.
    pub fn release(&self) {
        *self.lock() = true;
        self.opened.notify_all();
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        *self.lock()
    }
}

impl Default for ReleaseGate {
    fn default() -> Self {
        Self::new()
    }
}
