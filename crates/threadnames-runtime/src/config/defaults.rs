//! Library defaults, overridable through `TN_*` environment variables.

use threadnames_core::constants::MAX_WORKERS;

/// Sleep between completion checks while the rename barrier polls
pub const RENAME_POLL_INTERVAL_MS: u64 = 10;

/// Shared bound for reaping rename jobs after the gate is released
pub const RENAME_REAP_TIMEOUT_MS: u64 = 2000;

/// Upper bound on the polling phase of one rename
pub const RENAME_POLL_DEADLINE_MS: u64 = 10_000;

/// OS/internal name prefix given to freshly spawned pool workers
pub const WORKER_NAME_PREFIX: &str = "tn-worker";

/// How long an idle worker parks before re-checking the queue
pub const PARK_TIMEOUT_MS: u64 = 50;

/// Workers when `TN_NUM_WORKERS` is unset: one per CPU, capped
pub fn num_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_WORKERS)
}
