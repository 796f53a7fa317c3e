//! Condvar-based parking for platforms without futex
//!
//! Same epoch protocol as the futex version, with the epoch kept under the
//! condvar's mutex.

use super::{ParkToken, WorkerParking};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

pub struct CondvarParking {
    epoch: Mutex<u32>,
    condvar: Condvar,
    parked: AtomicUsize,
}

impl CondvarParking {
    pub fn new() -> Self {
        Self {
            epoch: Mutex::new(0),
            condvar: Condvar::new(),
            parked: AtomicUsize::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, u32> {
        self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for CondvarParking {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerParking for CondvarParking {
    fn prepare_park(&self) -> ParkToken {
        ParkToken(*self.lock())
    }

    fn park(&self, token: ParkToken, timeout: Duration) -> bool {
        let guard = self.lock();
        if *guard != token.0 {
            return true;
        }

        self.parked.fetch_add(1, Ordering::SeqCst);
        let (guard, _) = self
            .condvar
            .wait_timeout_while(guard, timeout, |epoch| *epoch == token.0)
            .unwrap_or_else(PoisonError::into_inner);
        self.parked.fetch_sub(1, Ordering::SeqCst);

        *guard != token.0
    }

    fn wake_one(&self) {
        {
            let mut epoch = self.lock();
            *epoch = epoch.wrapping_add(1);
        }
        self.condvar.notify_one();
    }

    fn wake_all(&self) {
        {
            let mut epoch = self.lock();
            *epoch = epoch.wrapping_add(1);
        }
        self.condvar.notify_all();
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
