//! Runtime configuration
//!
//! Compile-time defaults (see [`defaults`]) with runtime environment
//! overrides. Environment wins over defaults; builder calls win over both.
//!
//! # Example
//!
//! ```rust,ignore
//! use threadnames_runtime::config::{PoolConfig, RenameConfig};
//!
//! let pool = PoolConfig::from_env().num_workers(8).name_prefix("db");
//! let rename = RenameConfig::from_env().reap_timeout(Duration::from_millis(500));
//! ```

pub mod defaults;

use std::time::Duration;
use threadnames_core::constants::MAX_WORKERS;
use threadnames_core::env::parse_or;
use threadnames_core::error::{PoolError, PoolResult};

fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn lookup_ms(lookup: &impl Fn(&str) -> Option<String>, key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(parse_or(lookup(key).as_deref(), default_ms))
}

/// Timing knobs of the rename barrier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenameConfig {
    /// Sleep between completion checks
    pub poll_interval: Duration,
    /// Total time granted to rename jobs after the gate opens
    pub reap_timeout: Duration,
    /// Give up polling after this long, even if workers never reported
    pub poll_deadline: Duration,
}

impl Default for RenameConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl RenameConfig {
    /// Library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `TN_RENAME_POLL_INTERVAL_MS`
    /// - `TN_RENAME_REAP_TIMEOUT_MS`
    /// - `TN_RENAME_POLL_DEADLINE_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            poll_interval: lookup_ms(
                &lookup,
                "TN_RENAME_POLL_INTERVAL_MS",
                defaults::RENAME_POLL_INTERVAL_MS,
            ),
            reap_timeout: lookup_ms(
                &lookup,
                "TN_RENAME_REAP_TIMEOUT_MS",
                defaults::RENAME_REAP_TIMEOUT_MS,
            ),
            poll_deadline: lookup_ms(
                &lookup,
                "TN_RENAME_POLL_DEADLINE_MS",
                defaults::RENAME_POLL_DEADLINE_MS,
            ),
        }
    }

    /// Library defaults only (no env override).
    pub fn new() -> Self {
        Self {
            poll_interval: Duration::from_millis(defaults::RENAME_POLL_INTERVAL_MS),
            reap_timeout: Duration::from_millis(defaults::RENAME_REAP_TIMEOUT_MS),
            poll_deadline: Duration::from_millis(defaults::RENAME_POLL_DEADLINE_MS),
        }
    }

    pub fn poll_interval(mut self, d: Duration) -> Self {
        self.poll_interval = d;
        self
    }

    pub fn reap_timeout(mut self, d: Duration) -> Self {
        self.reap_timeout = d;
        self
    }

    pub fn poll_deadline(mut self, d: Duration) -> Self {
        self.poll_deadline = d;
        self
    }

    pub fn validate(&self) -> PoolResult<()> {
        if self.poll_interval.is_zero() {
            return Err(PoolError::InvalidConfig("poll_interval must be > 0"));
        }
        if self.poll_deadline < self.poll_interval {
            return Err(PoolError::InvalidConfig("poll_deadline must be >= poll_interval"));
        }
        Ok(())
    }
}

/// Settings for [`ThreadPool`](crate::pool::ThreadPool).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads
    pub num_workers: usize,
    /// Workers start life named `"{name_prefix}-{id}"`
    pub name_prefix: String,
    /// Idle park timeout before re-checking the queue
    pub park_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

impl PoolConfig {
    /// Library defaults with environment overrides.
    ///
    /// Environment variables (all optional):
    /// - `TN_NUM_WORKERS`
    /// - `TN_WORKER_NAME_PREFIX`
    /// - `TN_PARK_TIMEOUT_MS`
    pub fn from_env() -> Self {
        Self::from_lookup(env_var)
    }

    /// Like [`from_env`](Self::from_env), reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            num_workers: parse_or(
                lookup("TN_NUM_WORKERS").as_deref(),
                defaults::num_workers(),
            ),
            name_prefix: lookup("TN_WORKER_NAME_PREFIX")
                .unwrap_or_else(|| defaults::WORKER_NAME_PREFIX.to_string()),
            park_timeout: lookup_ms(&lookup, "TN_PARK_TIMEOUT_MS", defaults::PARK_TIMEOUT_MS),
        }
    }

    /// Library defaults only (no env override).
    pub fn new() -> Self {
        Self {
            num_workers: defaults::num_workers(),
            name_prefix: defaults::WORKER_NAME_PREFIX.to_string(),
            park_timeout: Duration::from_millis(defaults::PARK_TIMEOUT_MS),
        }
    }

    pub fn num_workers(mut self, n: usize) -> Self {
        self.num_workers = n;
        self
    }

    pub fn name_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.name_prefix = prefix.into();
        self
    }

    pub fn park_timeout(mut self, d: Duration) -> Self {
        self.park_timeout = d;
        self
    }

    /// Zero workers is valid: such a pool queues jobs until it is resized.
    pub fn validate(&self) -> PoolResult<()> {
        if self.num_workers > MAX_WORKERS {
            return Err(PoolError::TooManyWorkers(self.num_workers));
        }
        if self.park_timeout.is_zero() {
            return Err(PoolError::InvalidConfig("park_timeout must be > 0"));
        }
        // Becomes part of every worker's thread name
        if self.name_prefix.contains('\0') {
            return Err(PoolError::InvalidConfig("name_prefix must not contain NUL"));
        }
        Ok(())
    }
}
