//! `ThreadPool`: resizable FIFO worker pool
//!
//! Workers pop jobs from a lock-free MPMC queue and park on the platform
//! parking primitive when it is empty. Every job is paired with a
//! [`JobHandle`] that resolves whether the job ran, panicked or was dropped.
//!
//! The pool can change size while jobs are queued or running:
//! - growing spawns workers `old..n`
//! - shrinking flags workers `n..old` to leave; a flagged worker finishes
//!   the job it is running and exits before taking another
//!
//! `clear_queue` and `stop(false)` drop queued jobs, which resolves their
//! handles as `Abandoned`.

use crate::config::PoolConfig;
use crate::identity::set_internal_name;
use crate::parking::{new_parking, WorkerParking};
use crate::tls;

use crossbeam_queue::SegQueue;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use threadnames_core::constants::{MAX_WORKERS, NAME_SEPARATOR};
use threadnames_core::error::{PoolError, PoolResult, WorkerSpawnError};
use threadnames_core::handle::{job_handle, Completer, JobHandle, JobOutcome};
use threadnames_core::traits::{Job, WorkerPool};
use threadnames_core::{kdebug, kerror, ktrace};

/// A job waiting in the queue together with its completion half.
struct QueuedJob {
    job: Job,
    completer: Completer,
}

/// State shared between the pool handle and its workers.
struct PoolShared {
    /// Pending jobs, FIFO
    queue: SegQueue<QueuedJob>,
    /// Idle workers sleep here
    parking: Box<dyn WorkerParking>,
    /// Current worker count as seen by `size()`
    size: AtomicUsize,
    /// Workers currently parked or about to park
    idle: AtomicUsize,
    /// `stop(true)`: workers exit once the queue is empty
    draining: AtomicBool,
    /// No further submissions accepted
    stopped: AtomicBool,
    park_timeout: Duration,
    name_prefix: String,
}

impl PoolShared {
    fn clear_queue(&self) -> usize {
        let mut dropped = 0;
        while let Some(queued) = self.queue.pop() {
            drop(queued);
            dropped += 1;
        }
        dropped
    }
}

/// A running worker: its private exit flag and join handle.
struct WorkerSlot {
    exit: Arc<AtomicBool>,
    handle: JoinHandle<()>,
}

pub struct ThreadPool {
    shared: Arc<PoolShared>,
    /// Active workers, index == worker ID
    workers: Mutex<Vec<WorkerSlot>>,
    /// Workers removed by a shrink, joined on stop
    retired: Mutex<Vec<JoinHandle<()>>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ThreadPool {
    /// Create a pool with `n` workers and defaults for everything else.
    pub fn new(n: usize) -> PoolResult<Self> {
        Self::with_config(PoolConfig::from_env().num_workers(n))
    }

    /// Create a pool from a full configuration.
    pub fn with_config(config: PoolConfig) -> PoolResult<Self> {
        config.validate()?;
        let pool = ThreadPool {
            shared: Arc::new(PoolShared {
                queue: SegQueue::new(),
                parking: new_parking(),
                size: AtomicUsize::new(0),
                idle: AtomicUsize::new(0),
                draining: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                park_timeout: config.park_timeout,
                name_prefix: config.name_prefix,
            }),
            workers: Mutex::new(Vec::with_capacity(config.num_workers)),
            retired: Mutex::new(Vec::new()),
        };
        pool.resize(config.num_workers)?;
        kdebug!("pool '{}' started with {} workers", pool.shared.name_prefix, config.num_workers);
        Ok(pool)
    }

    /// Current number of workers
    #[inline]
    pub fn size(&self) -> usize {
        self.shared.size.load(Ordering::Acquire)
    }

    /// Workers with nothing to do (hint)
    #[inline]
    pub fn idle_count(&self) -> usize {
        self.shared.idle.load(Ordering::Relaxed)
    }

    /// Jobs queued but not yet picked up
    #[inline]
    pub fn queued_count(&self) -> usize {
        self.shared.queue.len()
    }

    /// Whether `stop` has been called
    #[inline]
    pub fn is_stopped(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Queue a closure; it receives the ID of the worker running it.
    pub fn push<F>(&self, f: F) -> JobHandle
    where
        F: FnOnce(usize) + Send + 'static,
    {
        self.submit_job(Box::new(f))
    }

    fn submit_job(&self, job: Job) -> JobHandle {
        if self.is_stopped() {
            return JobHandle::abandoned();
        }
        let (completer, handle) = job_handle();
        self.shared.queue.push(QueuedJob { job, completer });
        self.shared.parking.wake_one();
        handle
    }

    /// Change the number of workers.
    ///
    /// Shrinking never interrupts a running job; the removed workers exit
    /// when it returns.
    pub fn resize(&self, n: usize) -> PoolResult<()> {
        if n > MAX_WORKERS {
            return Err(PoolError::TooManyWorkers(n));
        }
        if self.is_stopped() {
            return Err(PoolError::Stopped);
        }

        let mut workers = lock(&self.workers);
        let old = workers.len();

        if n >= old {
            for id in old..n {
                let slot = self.spawn_worker(id)?;
                workers.push(slot);
                self.shared.size.store(workers.len(), Ordering::Release);
            }
        } else {
            let mut retired = lock(&self.retired);
            for slot in workers.drain(n..) {
                slot.exit.store(true, Ordering::Release);
                retired.push(slot.handle);
            }
            self.shared.size.store(n, Ordering::Release);
            self.shared.parking.wake_all();
        }

        if n != old {
            kdebug!("pool '{}' resized {} -> {}", self.shared.name_prefix, old, n);
        }
        Ok(())
    }

    fn spawn_worker(&self, id: usize) -> PoolResult<WorkerSlot> {
        let shared = Arc::clone(&self.shared);
        let exit = Arc::new(AtomicBool::new(false));
        let worker_exit = Arc::clone(&exit);
        let name = format!("{}{}{}", self.shared.name_prefix, NAME_SEPARATOR, id);

        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                set_internal_name(&name);
                worker_loop(&shared, id, &worker_exit);
            })
            .map_err(|e| WorkerSpawnError {
                worker_id: id,
                reason: e.to_string(),
            })?;

        Ok(WorkerSlot { exit, handle })
    }

    /// Drop every queued job. Their handles resolve as `Abandoned`.
    ///
    /// Returns the number of jobs dropped.
    pub fn clear_queue(&self) -> usize {
        let dropped = self.shared.clear_queue();
        if dropped > 0 {
            kdebug!("pool '{}' cleared {} queued jobs", self.shared.name_prefix, dropped);
        }
        dropped
    }

    /// Stop the pool and join every worker.
    ///
    /// - `wait = true`: run everything already queued, then exit
    /// - `wait = false`: drop queued jobs, exit after current jobs return
    ///
    /// Later calls are no-ops. Called from one of this pool's own workers
    /// (e.g. the last `Arc<ThreadPool>` dropped inside a job), that worker
    /// is not joined; it exits on its own once the job returns.
    pub fn stop(&self, wait: bool) {
        if self.shared.stopped.swap(true, Ordering::AcqRel) {
            return;
        }

        let workers: Vec<WorkerSlot> = lock(&self.workers).drain(..).collect();
        if wait {
            self.shared.draining.store(true, Ordering::Release);
        } else {
            for slot in &workers {
                slot.exit.store(true, Ordering::Release);
            }
            self.shared.clear_queue();
        }
        self.shared.parking.wake_all();

        let retired: Vec<JoinHandle<()>> = lock(&self.retired).drain(..).collect();
        let me = thread::current().id();
        for handle in workers.into_iter().map(|slot| slot.handle).chain(retired) {
            if handle.thread().id() == me {
                continue;
            }
            if handle.join().is_err() {
                kerror!("pool '{}' worker exited abnormally", self.shared.name_prefix);
            }
        }
        self.shared.size.store(0, Ordering::Release);

        // Anything that raced past the stopped flag
        self.shared.clear_queue();
        kdebug!("pool '{}' stopped", self.shared.name_prefix);
    }
}

impl WorkerPool for ThreadPool {
    fn size(&self) -> usize {
        ThreadPool::size(self)
    }

    fn submit(&self, job: Job) -> JobHandle {
        self.submit_job(job)
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.stop(true);
    }
}

/// Worker thread main loop.
fn worker_loop(shared: &PoolShared, id: usize, exit: &AtomicBool) {
    tls::set_worker_id(id);
    ktrace!("worker {} up", id);

    loop {
        if exit.load(Ordering::Acquire) {
            break;
        }

        let token = shared.parking.prepare_park();
        if let Some(queued) = shared.queue.pop() {
            run_job(queued, id);
            continue;
        }
        if shared.draining.load(Ordering::Acquire) {
            break;
        }

        shared.idle.fetch_add(1, Ordering::Relaxed);
        shared.parking.park(token, shared.park_timeout);
        shared.idle.fetch_sub(1, Ordering::Relaxed);
    }

    ktrace!("worker {} down", id);
    tls::clear_worker_id();
}

fn run_job(queued: QueuedJob, id: usize) {
    let QueuedJob { job, completer } = queued;
    let outcome = match panic::catch_unwind(AssertUnwindSafe(|| job(id))) {
        Ok(()) => JobOutcome::Completed,
        Err(_) => {
            kerror!("job panicked on worker {}", id);
            JobOutcome::Panicked
        }
    };
    completer.complete(outcome);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::get_internal_name;
    use std::sync::mpsc;
    use std::sync::Barrier;
    use std::time::Instant;

    fn pool(n: usize, prefix: &str) -> ThreadPool {
        ThreadPool::with_config(
            PoolConfig::new()
                .num_workers(n)
                .name_prefix(prefix)
                .park_timeout(Duration::from_millis(10)),
        )
        .unwrap()
    }

    /// Occupy every worker until the returned sender is dropped.
    fn block_all(pool: &ThreadPool, n: usize) -> (mpsc::Sender<()>, Vec<JobHandle>) {
        let (tx, rx) = mpsc::channel::<()>();
        let rx = Arc::new(Mutex::new(rx));
        let started = Arc::new(Barrier::new(n + 1));
        let handles = (0..n)
            .map(|_| {
                let rx = Arc::clone(&rx);
                let started = Arc::clone(&started);
                pool.push(move |_| {
                    started.wait();
                    let _ = lock(&rx).recv();
                })
            })
            .collect();
        started.wait();
        (tx, handles)
    }

    #[test]
    fn test_job_runs_on_named_worker() {
        let pool = pool(2, "unit");
        let (tx, rx) = mpsc::channel();
        let handle = pool.push(move |id| {
            tx.send((id, tls::current_worker_id(), get_internal_name())).unwrap();
        });
        assert_eq!(handle.wait(), JobOutcome::Completed);

        let (id, tls_id, name) = rx.recv().unwrap();
        assert!(id < 2);
        assert_eq!(tls_id, Some(id));
        assert_eq!(name, format!("unit-{}", id));
    }

    #[test]
    fn test_panicking_job_keeps_worker() {
        let pool = pool(1, "panic");
        let bad = pool.push(|_| panic!("boom"));
        assert_eq!(bad.wait(), JobOutcome::Panicked);

        let good = pool.push(|_| {});
        assert_eq!(good.wait(), JobOutcome::Completed);
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn test_clear_queue_abandons_pending_jobs() {
        let pool = pool(1, "clear");
        let (release, _) = block_all(&pool, 1);

        let pending: Vec<_> = (0..3).map(|_| pool.push(|_| {})).collect();
        assert_eq!(pool.queued_count(), 3);
        assert_eq!(pool.clear_queue(), 3);
        assert!(pending.iter().all(JobHandle::is_abandoned));

        drop(release);
    }

    #[test]
    fn test_resize_grow_and_shrink() {
        let pool = pool(1, "rs");
        pool.resize(4).unwrap();
        assert_eq!(pool.size(), 4);

        // Four jobs that only finish together need four distinct workers
        let together = Arc::new(Barrier::new(4));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let together = Arc::clone(&together);
                pool.push(move |_| {
                    together.wait();
                })
            })
            .collect();
        for h in &handles {
            assert_eq!(h.wait_for(Duration::from_secs(5)), threadnames_core::WaitStatus::Resolved);
        }

        pool.resize(2).unwrap();
        assert_eq!(pool.size(), 2);
        assert_eq!(pool.push(|_| {}).wait(), JobOutcome::Completed);

        assert_eq!(pool.resize(MAX_WORKERS + 1), Err(PoolError::TooManyWorkers(MAX_WORKERS + 1)));
    }

    #[test]
    fn test_shrunk_worker_finishes_current_job() {
        let pool = pool(2, "shrink");
        let (release, blockers) = block_all(&pool, 2);

        pool.resize(1).unwrap();
        assert_eq!(pool.size(), 1);
        drop(release);

        for b in &blockers {
            assert_eq!(b.wait(), JobOutcome::Completed);
        }
        assert_eq!(pool.push(|id| assert_eq!(id, 0)).wait(), JobOutcome::Completed);
    }

    #[test]
    fn test_zero_worker_pool_queues_until_grown() {
        let pool = pool(0, "empty");
        assert_eq!(pool.size(), 0);
        let handle = pool.push(|_| {});
        assert_eq!(handle.wait_for(Duration::from_millis(30)), threadnames_core::WaitStatus::TimedOut);

        pool.resize(1).unwrap();
        assert_eq!(handle.wait(), JobOutcome::Completed);
    }

    #[test]
    fn test_stop_wait_drains_queue() {
        let pool = pool(2, "drain");
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let done = Arc::clone(&done);
            pool.push(move |_| {
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        pool.stop(true);
        assert_eq!(done.load(Ordering::SeqCst), 20);
        assert_eq!(pool.size(), 0);
        assert!(pool.push(|_| {}).is_abandoned());
        assert_eq!(pool.resize(1), Err(PoolError::Stopped));
    }

    #[test]
    fn test_nul_in_prefix_is_rejected() {
        let result = ThreadPool::with_config(PoolConfig::new().num_workers(1).name_prefix("a\0b"));
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_last_owner_dropped_inside_job() {
        let pool = Arc::new(pool(2, "self"));
        let (go, wait_go) = mpsc::channel::<()>();
        let owner = Arc::clone(&pool);
        let handle = pool.push(move |_| {
            let _ = wait_go.recv();
            drop(owner);
        });
        drop(pool);
        go.send(()).unwrap();

        assert_eq!(handle.wait_for(Duration::from_secs(5)), threadnames_core::WaitStatus::Resolved);
        assert_eq!(handle.outcome(), Some(JobOutcome::Completed));
    }

    #[test]
    fn test_stop_nowait_abandons_queue() {
        let pool = Arc::new(pool(1, "abort"));
        let (release, _) = block_all(&pool, 1);
        let pending = pool.push(|_| {});

        let stopper = {
            let pool = Arc::clone(&pool);
            thread::spawn(move || pool.stop(false))
        };
        let start = Instant::now();
        while !pending.is_resolved() && start.elapsed() < Duration::from_secs(5) {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(pending.is_abandoned());

        drop(release);
        stopper.join().unwrap();
        assert!(pool.is_stopped());
    }
}
