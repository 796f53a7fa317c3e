//! # threadnames-core
//!
//! Core types and traits for naming the worker threads of a pool.
//!
//! This crate is platform-agnostic and contains no OS-specific code.
//! OS thread naming, the concrete pool and the rename barrier live in
//! `threadnames-runtime`.
//!
//! ## Modules
//!
//! - `thread_name` - Per-thread internal (in-process) name
//! - `handle` - Completion handles for submitted jobs
//! - `traits` - The `WorkerPool` seam the rename barrier drives
//! - `error` - Error types
//! - `kprint` - Kernel-style debug printing macros
//! - `env` - Environment variable utilities

pub mod thread_name;
pub mod handle;
pub mod traits;
pub mod error;
pub mod kprint;
pub mod env;

// Re-exports for convenience
pub use thread_name::{get_internal_name, set_internal_name, with_internal_name};
pub use handle::{job_handle, Completer, JobHandle, JobOutcome, WaitStatus};
pub use traits::{Job, WorkerPool};
pub use error::{PoolError, PoolResult};
pub use env::{
    env_get, env_get_bool, env_get_duration_ms, env_get_opt, env_get_str, env_is_set, parse_or,
};

/// Constants shared by core and runtime
pub mod constants {
    /// Maximum workers a single pool may run
    pub const MAX_WORKERS: usize = 256;

    /// Separator between a rename prefix and the worker index
    pub const NAME_SEPARATOR: char = '-';

    /// Worker ID of a thread that does not belong to any pool
    pub const WORKER_NONE: usize = usize::MAX;
}
