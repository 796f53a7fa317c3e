//! Pool rename barrier
//!
//! Names every worker of a live pool `"{prefix}-{i}"`. A thread can only
//! rename itself, so the barrier submits one job per worker; each job renames
//! the thread it lands on, checks in, and then holds that worker at a shared
//! gate so the next rename job has to land on a different worker. Once all
//! workers have checked in the gate opens and the pool goes back to work.
//!
//! ```text
//!  caller                         worker k (any order)
//!  ──────                         ────────────────────
//!  N = pool.size()
//!  submit job 0..N ─────────────▶ rename_current_thread("{prefix}-{i}")
//!                                 lock gate, counter += 1
//!  poll (sleep, check) ◀───────── wait on gate
//!  gate.release() ──────────────▶ return to the pool's job loop
//!  reap handles (bounded)
//! ```
//!
//! Polling ends on the first of:
//! 1. every job that can still run has checked in (`AllConfirmed`); jobs
//!    dropped by the pool (evicted, stopped) no longer count
//! 2. check-ins reached the pool's *current* size (`PoolSizeReached`), the
//!    escape valve for a pool that shrank after submission
//! 3. `poll_deadline` passed (`DeadlineExpired`), for workers busy forever
//!
//! None of these fail the call. After release, the remaining handles get one
//! shared `reap_timeout`; whatever is still unresolved is logged as a
//! straggler and the gate is released again for good measure.

use crate::config::RenameConfig;
use crate::gate::ReleaseGate;
use crate::identity::rename_current_thread;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use threadnames_core::constants::NAME_SEPARATOR;
use threadnames_core::handle::{JobHandle, JobOutcome, WaitStatus};
use threadnames_core::traits::{Job, WorkerPool};
use threadnames_core::{kdebug, ktrace, kwarn};

/// Why the polling phase ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollExit {
    /// Every rename job that could still run checked in
    AllConfirmed,
    /// Check-ins reached the pool's current size
    PoolSizeReached,
    /// The poll deadline passed first
    DeadlineExpired,
}

/// Outcome of one `rename_pool` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameReport {
    pub prefix: String,
    /// Rename jobs submitted (the pool size at the start)
    pub submitted: usize,
    /// Workers that had checked in when polling ended
    pub confirmed: usize,
    /// Jobs the pool dropped without running
    pub evicted: usize,
    /// Indices whose jobs were still unresolved when reaping gave up
    pub stragglers: Vec<usize>,
    pub exit: PollExit,
    pub elapsed: Duration,
}

impl RenameReport {
    /// Every submitted job ran and checked in before release
    pub fn is_complete(&self) -> bool {
        self.exit == PollExit::AllConfirmed
            && self.evicted == 0
            && self.stragglers.is_empty()
            && self.confirmed == self.submitted
    }
}

/// Protocol phases, in order. None is ever skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Submitting,
    Polling,
    Releasing,
    Reaping,
    Done,
}

struct RenameRequest {
    prefix: String,
    requested_at: Instant,
}

impl RenameRequest {
    fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_owned(),
            requested_at: Instant::now(),
        }
    }

    fn worker_name(&self, index: usize) -> String {
        format!("{}{}{}", self.prefix, NAME_SEPARATOR, index)
    }

    fn enter(&self, phase: Phase) {
        ktrace!("rename_pool '{}': {:?}", self.prefix, phase);
    }
}

struct PerWorkerTask {
    index: usize,
    handle: JobHandle,
}

impl PerWorkerTask {
    /// Resolved without ever reaching the gate
    fn is_lost(&self) -> bool {
        matches!(
            self.handle.outcome(),
            Some(JobOutcome::Abandoned) | Some(JobOutcome::Panicked)
        )
    }
}

/// Check-ins for one request. Only ever incremented, once per job.
struct CompletionCounter(AtomicUsize);

impl CompletionCounter {
    fn new() -> Self {
        Self(AtomicUsize::new(0))
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }
}

/// Renames every worker of a pool; see the module docs for the protocol.
#[derive(Debug, Clone)]
pub struct RenameBarrier {
    config: RenameConfig,
}

impl Default for RenameBarrier {
    /// Environment timings, or library defaults if those fail validation.
    fn default() -> Self {
        Self::new(checked(RenameConfig::from_env()))
    }
}

fn checked(config: RenameConfig) -> RenameConfig {
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            kwarn!("rename_pool: ignoring TN_RENAME_* settings ({}), using defaults", e);
            RenameConfig::new()
        }
    }
}

impl RenameBarrier {
    pub fn new(config: RenameConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RenameConfig {
        &self.config
    }

    /// Name every current worker of `pool` `"{prefix}-{i}"`.
    ///
    /// Blocks until the protocol completes or is abandoned. Never fails;
    /// anomalies are logged and described in the returned report.
    pub fn rename_pool<P>(&self, pool: &P, prefix: &str) -> RenameReport
    where
        P: WorkerPool + ?Sized,
    {
        let request = RenameRequest::new(prefix);
        let counter = Arc::new(CompletionCounter::new());
        let gate = Arc::new(ReleaseGate::new());

        request.enter(Phase::Submitting);
        let n = pool.size();
        let tasks: Vec<PerWorkerTask> = (0..n)
            .map(|index| {
                let job = rename_job(request.worker_name(index), &counter, &gate);
                PerWorkerTask {
                    index,
                    handle: pool.submit(job),
                }
            })
            .collect();

        request.enter(Phase::Polling);
        let (exit, confirmed) = self.poll(pool, &request, &tasks, &counter);

        request.enter(Phase::Releasing);
        gate.release();

        request.enter(Phase::Reaping);
        let stragglers = self.reap(&request, &tasks, &gate);

        let report = RenameReport {
            submitted: tasks.len(),
            confirmed,
            evicted: tasks.iter().filter(|t| t.handle.is_abandoned()).count(),
            stragglers,
            exit,
            elapsed: request.requested_at.elapsed(),
            prefix: request.prefix.clone(),
        };
        request.enter(Phase::Done);

        kdebug!(
            "rename_pool '{}': {}/{} confirmed ({:?}), {} evicted, {} stragglers in {:?}",
            report.prefix,
            report.confirmed,
            report.submitted,
            report.exit,
            report.evicted,
            report.stragglers.len(),
            report.elapsed
        );
        report
    }

    fn poll<P>(
        &self,
        pool: &P,
        request: &RenameRequest,
        tasks: &[PerWorkerTask],
        counter: &CompletionCounter,
    ) -> (PollExit, usize)
    where
        P: WorkerPool + ?Sized,
    {
        let submitted = tasks.len();
        loop {
            // Give workers time to reach the gate before looking
            if submitted > 0 {
                thread::sleep(self.config.poll_interval);
            }

            let confirmed = counter.get();
            let lost = tasks.iter().filter(|t| t.is_lost()).count();

            if confirmed >= submitted - lost {
                return (PollExit::AllConfirmed, confirmed);
            }
            if confirmed >= pool.size() {
                return (PollExit::PoolSizeReached, confirmed);
            }
            if request.requested_at.elapsed() >= self.config.poll_deadline {
                kwarn!(
                    "rename_pool: '{}' gave up polling after {:?} ({}/{} confirmed)",
                    request.prefix,
                    self.config.poll_deadline,
                    confirmed,
                    submitted
                );
                return (PollExit::DeadlineExpired, confirmed);
            }
        }
    }

    /// Wait for released jobs to return, bounded by one shared deadline.
    fn reap(&self, request: &RenameRequest, tasks: &[PerWorkerTask], gate: &ReleaseGate) -> Vec<usize> {
        let deadline = Instant::now() + self.config.reap_timeout;
        let mut stragglers = Vec::new();

        for task in tasks {
            if task.handle.is_resolved() {
                continue;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if task.handle.wait_for(remaining) == WaitStatus::TimedOut {
                kwarn!("rename_pool: {} timed out", request.worker_name(task.index));
                gate.release();
                stragglers.push(task.index);
            }
        }
        stragglers
    }
}

/// The job each worker runs: rename, check in, hold at the gate.
fn rename_job(name: String, counter: &Arc<CompletionCounter>, gate: &Arc<ReleaseGate>) -> Job {
    let counter = Arc::clone(counter);
    let gate = Arc::clone(gate);
    Box::new(move |_worker_id| {
        rename_current_thread(&name);
        gate.check_in_and_wait(|| counter.increment());
    })
}

/// Rename every worker of `pool` with [`RenameConfig::from_env`] timings.
pub fn rename_pool<P>(pool: &P, prefix: &str) -> RenameReport
where
    P: WorkerPool + ?Sized,
{
    RenameBarrier::default().rename_pool(pool, prefix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PoolConfig;
    use crate::identity::get_internal_name;
    use crate::pool::ThreadPool;
    use std::sync::mpsc;
    use std::sync::{Barrier, Mutex};
    use threadnames_core::handle::{job_handle, Completer};

    fn barrier() -> RenameBarrier {
        RenameBarrier::new(
            RenameConfig::new()
                .poll_interval(Duration::from_millis(5))
                .reap_timeout(Duration::from_millis(500))
                .poll_deadline(Duration::from_secs(5)),
        )
    }

    fn pool(n: usize) -> Arc<ThreadPool> {
        Arc::new(
            ThreadPool::with_config(
                PoolConfig::new()
                    .num_workers(n)
                    .park_timeout(Duration::from_millis(10)),
            )
            .unwrap(),
        )
    }

    /// Internal names of all `n` workers, sorted. The probes only finish
    /// together, so each lands on a different worker.
    fn probe_names(pool: &ThreadPool, n: usize) -> Vec<String> {
        let together = Arc::new(Barrier::new(n));
        let (tx, rx) = mpsc::channel();
        for _ in 0..n {
            let together = Arc::clone(&together);
            let tx = tx.clone();
            pool.push(move |_| {
                together.wait();
                tx.send(get_internal_name()).unwrap();
            });
        }
        let mut names: Vec<String> = (0..n)
            .map(|_| rx.recv_timeout(Duration::from_secs(5)).unwrap())
            .collect();
        names.sort();
        names
    }

    /// Occupy every worker until the returned sender is dropped.
    fn block_all(pool: &ThreadPool, n: usize) -> mpsc::Sender<()> {
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Arc::new(Mutex::new(rx));
        let started = Arc::new(Barrier::new(n + 1));
        for _ in 0..n {
            let rx = Arc::clone(&rx);
            let started = Arc::clone(&started);
            pool.push(move |_| {
                started.wait();
                let _ = rx.lock().unwrap().recv();
            });
        }
        started.wait();
        tx
    }

    fn wait_until(what: impl Fn() -> bool) {
        let start = Instant::now();
        while !what() {
            assert!(start.elapsed() < Duration::from_secs(5), "condition never held");
            thread::sleep(Duration::from_millis(2));
        }
    }

    /// A pool that accepts jobs but never runs them.
    struct StarvedPool {
        size: AtomicUsize,
        lose_workers_on_submit: bool,
        held: Mutex<Vec<(Job, Completer)>>,
    }

    impl StarvedPool {
        fn new(size: usize, lose_workers_on_submit: bool) -> Self {
            Self {
                size: AtomicUsize::new(size),
                lose_workers_on_submit,
                held: Mutex::new(Vec::new()),
            }
        }
    }

    impl WorkerPool for StarvedPool {
        fn size(&self) -> usize {
            self.size.load(Ordering::SeqCst)
        }

        fn submit(&self, job: Job) -> JobHandle {
            if self.lose_workers_on_submit {
                self.size.store(0, Ordering::SeqCst);
            }
            let (completer, handle) = job_handle();
            self.held.lock().unwrap().push((job, completer));
            handle
        }
    }

    #[test]
    fn test_four_idle_workers_get_distinct_names() {
        let pool = pool(4);
        let report = barrier().rename_pool(&*pool, "pool");

        assert!(report.is_complete(), "{report:?}");
        assert_eq!(report.submitted, 4);
        assert_eq!(report.confirmed, 4);
        assert_eq!(probe_names(&pool, 4), ["pool-0", "pool-1", "pool-2", "pool-3"]);
    }

    #[cfg(any(target_os = "linux", target_os = "android"))]
    #[test]
    fn test_os_names_follow_rename() {
        let pool = pool(3);
        barrier().rename_pool(&*pool, "osname");

        let together = Arc::new(Barrier::new(3));
        let (tx, rx) = mpsc::channel();
        for _ in 0..3 {
            let together = Arc::clone(&together);
            let tx = tx.clone();
            pool.push(move |_| {
                together.wait();
                tx.send((get_internal_name(), crate::identity::get_os_name())).unwrap();
            });
        }
        for _ in 0..3 {
            let (internal, os) = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(os.as_deref(), Some(internal.as_str()));
        }
    }

    #[test]
    fn test_empty_pool_returns_without_submitting() {
        let starved = StarvedPool::new(0, false);
        let report = barrier().rename_pool(&starved, "none");
        assert_eq!(report.submitted, 0);
        assert_eq!(report.exit, PollExit::AllConfirmed);
        assert!(report.elapsed < Duration::from_millis(100));
        assert!(starved.held.lock().unwrap().is_empty());

        let pool = pool(0);
        assert!(barrier().rename_pool(&*pool, "none").is_complete());
    }

    #[test]
    fn test_second_rename_wins() {
        let pool = pool(3);
        let b = barrier();
        assert!(b.rename_pool(&*pool, "first").is_complete());
        assert!(b.rename_pool(&*pool, "second").is_complete());
        assert_eq!(probe_names(&pool, 3), ["second-0", "second-1", "second-2"]);
    }

    #[test]
    fn test_renames_while_pool_has_other_work() {
        let pool = pool(4);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..64 {
            let done = Arc::clone(&done);
            pool.push(move |_| {
                thread::sleep(Duration::from_micros(200));
                done.fetch_add(1, Ordering::SeqCst);
            });
        }

        let report = barrier().rename_pool(&*pool, "busy");
        assert!(report.is_complete(), "{report:?}");
        wait_until(|| done.load(Ordering::SeqCst) == 64);
        assert_eq!(probe_names(&pool, 4), ["busy-0", "busy-1", "busy-2", "busy-3"]);
    }

    #[test]
    fn test_shrink_after_submission_terminates() {
        let pool = pool(4);
        let release = block_all(&pool, 4);

        let renamer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || barrier().rename_pool(&*pool, "shrunk"))
        };
        wait_until(|| pool.queued_count() == 4);

        pool.resize(2).unwrap();
        drop(release);

        let report = renamer.join().unwrap();
        assert_eq!(report.submitted, 4);
        assert_eq!(report.exit, PollExit::PoolSizeReached);
        assert_eq!(report.confirmed, 2);
        assert!(report.stragglers.is_empty(), "{report:?}");
    }

    #[test]
    fn test_evicted_jobs_do_not_block() {
        let pool = pool(2);
        let release = block_all(&pool, 2);

        let renamer = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || barrier().rename_pool(&*pool, "evicted"))
        };
        wait_until(|| pool.queued_count() == 2);
        assert_eq!(pool.clear_queue(), 2);

        let report = renamer.join().unwrap();
        assert_eq!(report.exit, PollExit::AllConfirmed);
        assert_eq!(report.evicted, 2);
        assert_eq!(report.confirmed, 0);
        assert!(report.stragglers.is_empty());
        assert!(!report.is_complete());

        drop(release);
    }

    #[test]
    fn test_workers_lost_after_submit_hit_escape_valve() {
        let starved = StarvedPool::new(3, true);
        let report = barrier().rename_pool(&starved, "lost");
        assert_eq!(report.submitted, 3);
        assert_eq!(report.exit, PollExit::PoolSizeReached);
        assert_eq!(report.stragglers, [0, 1, 2]);
    }

    #[test]
    fn test_never_scheduled_jobs_hit_deadline() {
        let starved = StarvedPool::new(3, false);
        let b = RenameBarrier::new(
            RenameConfig::new()
                .poll_interval(Duration::from_millis(5))
                .poll_deadline(Duration::from_millis(60))
                .reap_timeout(Duration::from_millis(60)),
        );

        let start = Instant::now();
        let report = b.rename_pool(&starved, "stuck");
        let elapsed = start.elapsed();

        assert_eq!(report.exit, PollExit::DeadlineExpired);
        assert_eq!(report.confirmed, 0);
        assert_eq!(report.stragglers, [0, 1, 2]);
        // One shared reap deadline, not one per straggler
        assert!(elapsed < Duration::from_millis(60 + 60 + 150), "{elapsed:?}");
    }

    #[test]
    fn test_invalid_env_timings_fall_back_to_defaults() {
        let zero_interval = RenameConfig::from_lookup(|key| {
            (key == "TN_RENAME_POLL_INTERVAL_MS").then(|| "0".to_string())
        });
        assert!(zero_interval.validate().is_err());
        assert_eq!(checked(zero_interval), RenameConfig::new());

        let custom = RenameConfig::new().reap_timeout(Duration::from_millis(300));
        assert_eq!(checked(custom.clone()), custom);
    }

    #[test]
    fn test_held_job_passes_gate_after_release() {
        let starved = StarvedPool::new(1, false);
        let b = RenameBarrier::new(
            RenameConfig::new()
                .poll_interval(Duration::from_millis(5))
                .poll_deadline(Duration::from_millis(20))
                .reap_timeout(Duration::from_millis(20)),
        );
        let report = b.rename_pool(&starved, "late");
        assert_eq!(report.stragglers, [0]);

        // Running the straggler now must not park forever on the open gate
        let (job, completer) = starved.held.lock().unwrap().pop().unwrap();
        let name = thread::spawn(move || {
            job(0);
            completer.complete(JobOutcome::Completed);
            get_internal_name()
        })
        .join()
        .unwrap();
        assert_eq!(name, "late-0");
    }
}
