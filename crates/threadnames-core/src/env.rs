//! Environment variable utilities
//!
//! Every runtime knob has a compile-time default that an environment variable
//! can override. These helpers never fail: an unset or unparsable variable
//! falls back to the default.
//!
//! # Usage
//!
//! ```ignore
//! use threadnames_core::env::{env_get, env_get_bool, env_get_duration_ms};
//!
//! let workers: usize = env_get("TN_NUM_WORKERS", 4);
//! let reap = env_get_duration_ms("TN_RENAME_REAP_TIMEOUT_MS", 2000);
//! let names = env_get_bool("TN_LOG_THREAD_NAMES", false);
//! ```

use std::str::FromStr;
use std::time::Duration;

/// Interpret a flag value: "1", "true", "yes", "on" (any case) are true.
pub fn parse_bool(val: &str) -> bool {
    matches!(val.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// Parse an optional raw value as `T`, or return `default`
#[inline]
pub fn parse_or<T>(val: Option<&str>, default: T) -> T
where
    T: FromStr,
{
    val.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Get environment variable parsed as `T`, or return `default`
#[inline]
pub fn env_get<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    parse_or(std::env::var(key).ok().as_deref(), default)
}

/// Get environment variable as `Some(T)` if set and parsable
#[inline]
pub fn env_get_opt<T>(key: &str) -> Option<T>
where
    T: FromStr,
{
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Get environment variable as a flag (see [`parse_bool`])
///
/// A set variable that is not a true-ish value reads as `false`; only an
/// unset variable yields `default`.
#[inline]
pub fn env_get_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(val) => parse_bool(&val),
        Err(_) => default,
    }
}

/// Get environment variable holding milliseconds as a `Duration`
#[inline]
pub fn env_get_duration_ms(key: &str, default_ms: u64) -> Duration {
    Duration::from_millis(env_get(key, default_ms))
}

/// Get environment variable as string, or return `default`
#[inline]
pub fn env_get_str(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Check if environment variable is set (regardless of value)
#[inline]
pub fn env_is_set(key: &str) -> bool {
    std::env::var_os(key).is_some()
}
