//! # threadnames - name the workers of a live thread pool
//!
//! Gives every worker thread of a pool a human-readable name that shows up
//! in `top -H`, `ps -L`, debuggers and this crate's own log lines, without
//! stopping the pool.
//!
//! ## Quick Start
//!
//! ```ignore
//! use threadnames::{NamedPool, PoolConfig};
//!
//! fn main() {
//!     let pool = NamedPool::new(PoolConfig::from_env().num_workers(4), "db").unwrap();
//!
//!     pool.push(|worker| {
//!         // "db-0" .. "db-3", in some order
//!         println!("worker {} is {}", worker, threadnames::get_internal_name());
//!     });
//!
//!     // Grow the pool; everyone gets a fresh name
//!     let report = pool.resize_and_rename(8, "db").unwrap();
//!     assert!(report.is_complete());
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      User Code                              │
//! │          NamedPool, rename_pool(), rename_current_thread()  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RenameBarrier                            │
//! │     submit N rename jobs, poll check-ins, release, reap     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!          ┌───────────────────┼───────────────────┐
//!          ▼                   ▼                   ▼
//!    ┌───────────┐      ┌───────────┐      ┌───────────┐
//!    │  Worker   │      │  Worker   │      │  Release  │
//!    │  rename   │      │  rename   │      │   Gate    │
//!    └───────────┘      └───────────┘      └───────────┘
//!          │                   │
//!          ▼                   ▼
//!    ┌─────────────────────────────────────────────────────────┐
//!    │        OS name (prctl / pthread)  +  internal name TLS   │
//!    └─────────────────────────────────────────────────────────┘
//! ```

// Re-export core types
pub use threadnames_core::{
    Job,
    JobHandle,
    JobOutcome,
    WaitStatus,
    WorkerPool,
    PoolError,
    PoolResult,
};

// Re-export kprint macros for logging
pub use threadnames_core::{kprint, kprintln, kerror, kwarn, kinfo, kdebug, ktrace};
pub use threadnames_core::kprint::{
    LogLevel, init as init_logging, set_flush_enabled, set_log_level, set_thread_names_enabled,
};

// Re-export env utilities
pub use threadnames_core::{
    env_get, env_get_bool, env_get_duration_ms, env_get_opt, env_get_str, env_is_set,
};

// Re-export runtime types
pub use threadnames_runtime::{
    PoolConfig,
    RenameConfig,
    ThreadPool,
    RenameBarrier,
    RenameReport,
    PollExit,
    rename_pool,
    rename_current_thread,
    set_os_name,
    get_os_name,
    os_name_max_len,
    set_internal_name,
    get_internal_name,
};
pub use threadnames_core::with_internal_name;
pub use threadnames_runtime::tls::current_worker_id;

use std::ops::Deref;

/// A [`ThreadPool`] that knows how to rename its own workers.
///
/// Dereferences to the underlying pool for `push`, `clear_queue`, `stop`
/// and friends.
pub struct NamedPool {
    pool: ThreadPool,
    barrier: RenameBarrier,
}

impl NamedPool {
    /// Build a pool and name its workers `"{prefix}-{i}"`.
    ///
    /// Rename timings come from [`RenameConfig::from_env`].
    pub fn new(config: PoolConfig, prefix: &str) -> PoolResult<Self> {
        Self::with_rename_config(config, RenameConfig::from_env(), prefix)
    }

    pub fn with_rename_config(
        config: PoolConfig,
        rename: RenameConfig,
        prefix: &str,
    ) -> PoolResult<Self> {
        rename.validate()?;
        let named = NamedPool {
            pool: ThreadPool::with_config(config)?,
            barrier: RenameBarrier::new(rename),
        };
        named.rename(prefix);
        Ok(named)
    }

    /// Rename every current worker `"{prefix}-{i}"`.
    pub fn rename(&self, prefix: &str) -> RenameReport {
        let report = self.barrier.rename_pool(&self.pool, prefix);
        if !report.stragglers.is_empty() {
            kwarn!(
                "pool '{}': {} of {} workers missed the rename",
                prefix,
                report.stragglers.len(),
                report.submitted
            );
        }
        report
    }

    /// Resize, then rename so new workers get names in the same scheme.
    pub fn resize_and_rename(&self, n: usize, prefix: &str) -> PoolResult<RenameReport> {
        self.pool.resize(n)?;
        Ok(self.rename(prefix))
    }

    pub fn pool(&self) -> &ThreadPool {
        &self.pool
    }

    pub fn into_inner(self) -> ThreadPool {
        self.pool
    }
}

impl Deref for NamedPool {
    type Target = ThreadPool;

    fn deref(&self) -> &ThreadPool {
        &self.pool
    }
}
