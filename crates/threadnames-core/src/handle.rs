//! Completion handles for jobs submitted to a worker pool
//!
//! A submitted job is paired with a [`Completer`] (held by whoever runs the
//! job) and a [`JobHandle`] (returned to the submitter). The handle resolves
//! exactly once:
//!
//! - `Completed` when the job returned normally
//! - `Panicked` when the job unwound
//! - `Abandoned` when the completer was dropped without running the job,
//!   e.g. the job was evicted from the queue or the pool was stopped
//!
//! Waiters block on a mutex/condvar pair; resolution wakes all of them.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// How a job ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job ran and returned
    Completed,
    /// The job ran and panicked
    Panicked,
    /// The job was dropped without running
    Abandoned,
}

/// Result of a bounded wait on a [`JobHandle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitStatus {
    Resolved,
    TimedOut,
}

struct Slot {
    outcome: Mutex<Option<JobOutcome>>,
    resolved: Condvar,
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, Option<JobOutcome>> {
        self.outcome.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Create a connected completer/handle pair for one job.
pub fn job_handle() -> (Completer, JobHandle) {
    let slot = Arc::new(Slot {
        outcome: Mutex::new(None),
        resolved: Condvar::new(),
    });
    (
        Completer { slot: Some(Arc::clone(&slot)) },
        JobHandle { slot },
    )
}

/// Producer half: resolves the paired handle.
///
/// Dropping an unresolved completer resolves the handle as
/// [`JobOutcome::Abandoned`].
pub struct Completer {
    slot: Option<Arc<Slot>>,
}

impl Completer {
    /// Resolve the handle with `outcome`.
    pub fn complete(mut self, outcome: JobOutcome) {
        self.resolve(outcome);
    }

    fn resolve(&mut self, outcome: JobOutcome) {
        if let Some(slot) = self.slot.take() {
            let mut guard = slot.lock();
            if guard.is_none() {
                *guard = Some(outcome);
            }
            drop(guard);
            slot.resolved.notify_all();
        }
    }
}

impl Drop for Completer {
    fn drop(&mut self) {
        self.resolve(JobOutcome::Abandoned);
    }
}

/// Consumer half: observe or wait for the job's outcome.
#[derive(Clone)]
pub struct JobHandle {
    slot: Arc<Slot>,
}

impl JobHandle {
    /// A handle that is already resolved as `Abandoned`.
    pub fn abandoned() -> Self {
        let (completer, handle) = job_handle();
        drop(completer);
        handle
    }

    /// Whether the job has resolved (in any way)
    #[inline]
    pub fn is_resolved(&self) -> bool {
        self.slot.lock().is_some()
    }

    /// The outcome, if resolved
    #[inline]
    pub fn outcome(&self) -> Option<JobOutcome> {
        *self.slot.lock()
    }

    /// Whether the job was dropped without running
    #[inline]
    pub fn is_abandoned(&self) -> bool {
        self.outcome() == Some(JobOutcome::Abandoned)
    }

    /// Wait up to `timeout` for the job to resolve.
    pub fn wait_for(&self, timeout: Duration) -> WaitStatus {
        let deadline = Instant::now() + timeout;
        let mut guard = self.slot.lock();
        while guard.is_none() {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return WaitStatus::TimedOut;
            }
            guard = self
                .slot
                .resolved
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        WaitStatus::Resolved
    }

    /// Block until the job resolves.
    pub fn wait(&self) -> JobOutcome {
        let mut guard = self.slot.lock();
        loop {
            if let Some(outcome) = *guard {
                return outcome;
            }
            guard = self
                .slot
                .resolved
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("outcome", &self.outcome())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_complete_resolves() {
        let (completer, handle) = job_handle();
        assert!(!handle.is_resolved());
        completer.complete(JobOutcome::Completed);
        assert!(handle.is_resolved());
        assert_eq!(handle.outcome(), Some(JobOutcome::Completed));
        assert_eq!(handle.wait_for(Duration::ZERO), WaitStatus::Resolved);
    }

    #[test]
    fn test_drop_abandons() {
        let (completer, handle) = job_handle();
        drop(completer);
        assert!(handle.is_abandoned());
        assert_eq!(handle.wait(), JobOutcome::Abandoned);
        assert!(JobHandle::abandoned().is_abandoned());
    }

    #[test]
    fn test_wait_for_times_out() {
        let (_completer, handle) = job_handle();
        let start = Instant::now();
        assert_eq!(handle.wait_for(Duration::from_millis(30)), WaitStatus::TimedOut);
        assert!(start.elapsed() >= Duration::from_millis(25));
        assert!(!handle.is_resolved());
    }

    #[test]
    fn test_wait_wakes_on_other_thread() {
        let (completer, handle) = job_handle();
        let waiter = {
            let handle = handle.clone();
            thread::spawn(move || handle.wait_for(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(20));
        completer.complete(JobOutcome::Panicked);
        assert_eq!(waiter.join().unwrap(), WaitStatus::Resolved);
        assert_eq!(handle.outcome(), Some(JobOutcome::Panicked));
    }
}
