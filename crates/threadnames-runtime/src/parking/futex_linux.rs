//! Linux futex-based parking
//!
//! The futex word is a wake epoch. `prepare_park` reads it; `park` sleeps in
//! `FUTEX_WAIT` only while the word still equals the token, so the kernel
//! does the "did anything happen since I looked" check atomically. Wakers
//! bump the epoch before `FUTEX_WAKE`.
//!
//! `parked` lets wakers skip the syscall when nobody sleeps. Both sides use
//! SeqCst: a parker increments `parked` then reads the epoch, a waker bumps
//! the epoch then reads `parked`, so at least one of them sees the other.

use super::{ParkToken, WorkerParking};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

pub struct FutexParking {
    epoch: AtomicU32,
    parked: AtomicUsize,
}

impl FutexParking {
    pub fn new() -> Self {
        Self {
            epoch: AtomicU32::new(0),
            parked: AtomicUsize::new(0),
        }
    }

    fn futex_wake(&self, count: i32) {
        // Safety: the futex word lives as long as `self`
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAKE | libc::FUTEX_PRIVATE_FLAG,
                count,
                std::ptr::null::<libc::timespec>(),
                std::ptr::null::<u32>(),
                0u32,
            );
        }
    }

    fn bump_and_wake(&self, count: i32) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if self.parked.load(Ordering::SeqCst) != 0 {
            self.futex_wake(count);
        }
    }
}

impl Default for FutexParking {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkerParking for FutexParking {
    fn prepare_park(&self) -> ParkToken {
        ParkToken(self.epoch.load(Ordering::SeqCst))
    }

    fn park(&self, token: ParkToken, timeout: Duration) -> bool {
        self.parked.fetch_add(1, Ordering::SeqCst);

        if self.epoch.load(Ordering::SeqCst) != token.0 {
            self.parked.fetch_sub(1, Ordering::SeqCst);
            return true;
        }

        let ts = libc::timespec {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_nsec: timeout.subsec_nanos() as libc::c_long,
        };

        // Safety: futex word and timespec outlive the call.
        // Sleeps only if the word still equals `token.0`.
        unsafe {
            libc::syscall(
                libc::SYS_futex,
                self.epoch.as_ptr(),
                libc::FUTEX_WAIT | libc::FUTEX_PRIVATE_FLAG,
                token.0,
                &ts as *const libc::timespec,
                std::ptr::null::<u32>(),
                0u32,
            );
        }

        self.parked.fetch_sub(1, Ordering::SeqCst);

        // ETIMEDOUT, EINTR and EAGAIN all funnel here; the epoch is the truth
        self.epoch.load(Ordering::SeqCst) != token.0
    }

    fn wake_one(&self) {
        self.bump_and_wake(1);
    }

    fn wake_all(&self) {
        self.bump_and_wake(i32::MAX);
    }

    fn parked_count(&self) -> usize {
        self.parked.load(Ordering::Relaxed)
    }
}
