//! Idle-worker parking
//!
//! Pool workers park here when the job queue is empty. The primitive is an
//! event count: a worker takes a [`ParkToken`] *before* its last look at the
//! queue, then parks with that token. Any wake issued after the token was
//! taken makes `park` return immediately, so a job pushed between "queue
//! empty" and "park" is never slept through.
//!
//! ```ignore
//! let token = parking.prepare_park();
//! if queue.is_empty() {
//!     parking.park(token, park_timeout);
//! }
//! ```

use std::time::Duration;

/// Snapshot of the wake epoch taken by [`WorkerParking::prepare_park`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkToken(pub(crate) u32);

/// Platform-specific parking for idle pool workers
pub trait WorkerParking: Send + Sync {
    /// Take a token to park with later
    fn prepare_park(&self) -> ParkToken;

    /// Park until a wake newer than `token` or until `timeout` elapses.
    ///
    /// Returns `true` if a wake was observed. Callers re-check the queue
    /// either way.
    fn park(&self, token: ParkToken, timeout: Duration) -> bool;

    /// Wake at least one parked worker (a job was queued)
    fn wake_one(&self);

    /// Wake every parked worker (resize, stop)
    fn wake_all(&self);

    /// Number of parked workers (hint, may be stale)
    fn parked_count(&self) -> usize;
}

cfg_if::cfg_if! {
    if #[cfg(any(target_os = "linux", target_os = "android"))] {
        mod futex_linux;
        pub use futex_linux::FutexParking as PlatformParking;
    } else {
        mod fallback;
        pub use fallback::CondvarParking as PlatformParking;
    }
}

/// Create a new platform-appropriate parking instance
pub fn new_parking() -> Box<dyn WorkerParking> {
    Box::new(PlatformParking::new())
}
