//! Kernel-style print macros
//!
//! Leveled, line-atomic output to stderr. This is also the diagnostics sink
//! of the rename barrier: straggler timeouts are reported here as `[WARN]`
//! lines.
//!
//! # Environment Variables
//!
//! - `TN_LOG_LEVEL=<level>` - off|error|warn|info|debug|trace or 0..5 (default: info)
//! - `TN_FLUSH_EPRINT=1` - Flush stderr after each line
//! - `TN_LOG_THREAD_NAMES=1` - Prefix leveled lines with the calling thread's
//!   internal name, e.g. `[INFO]  [db-2] compaction done`
//!
//! # Usage
//!
//! ```ignore
//! use threadnames_core::{kinfo, kwarn, kdebug};
//!
//! kinfo!("pool started with {} workers", n);
//! kwarn!("rename_pool: {}-{} timed out", prefix, index);
//! kdebug!("worker {} parked", id);
//! ```

use crate::env::{env_get_opt, env_get_str, parse_bool};
use crate::thread_name::with_internal_name;
use std::io::Write;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Once;

/// Log levels
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => LogLevel::Off,
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    /// Parse a level name or digit; `None` if unrecognized
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Off => "",
            LogLevel::Error => "[ERROR]",
            LogLevel::Warn => "[WARN] ",
            LogLevel::Info => "[INFO] ",
            LogLevel::Debug => "[DEBUG]",
            LogLevel::Trace => "[TRACE]",
        }
    }
}

static FLUSH_ENABLED: AtomicBool = AtomicBool::new(false);
static THREAD_NAMES_ENABLED: AtomicBool = AtomicBool::new(false);
static LOG_LEVEL: AtomicU8 = AtomicU8::new(LogLevel::Info as u8);
static INIT: Once = Once::new();

/// Initialize logging from environment variables.
///
/// Runs at most once; called lazily by the first log line. Programmatic
/// setters called afterwards win over the environment.
pub fn init() {
    INIT.call_once(|| {
        if let Some(flush) = env_get_opt::<String>("TN_FLUSH_EPRINT") {
            FLUSH_ENABLED.store(parse_bool(&flush), Ordering::Relaxed);
        }
        if let Some(names) = env_get_opt::<String>("TN_LOG_THREAD_NAMES") {
            THREAD_NAMES_ENABLED.store(parse_bool(&names), Ordering::Relaxed);
        }
        let level = LogLevel::parse(&env_get_str("TN_LOG_LEVEL", "info")).unwrap_or(LogLevel::Info);
        LOG_LEVEL.store(level as u8, Ordering::Relaxed);
    });
}

/// Check if flush is enabled
#[inline]
pub fn flush_enabled() -> bool {
    init();
    FLUSH_ENABLED.load(Ordering::Relaxed)
}

/// Check if leveled lines carry the thread's internal name
#[inline]
pub fn thread_names_enabled() -> bool {
    init();
    THREAD_NAMES_ENABLED.load(Ordering::Relaxed)
}

/// Get current log level
#[inline]
pub fn log_level() -> LogLevel {
    init();
    LogLevel::from_u8(LOG_LEVEL.load(Ordering::Relaxed))
}

/// Set log level programmatically
pub fn set_log_level(level: LogLevel) {
    init();
    LOG_LEVEL.store(level as u8, Ordering::Relaxed);
}

/// Set flush mode programmatically
pub fn set_flush_enabled(enabled: bool) {
    init();
    FLUSH_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Enable or disable the internal-name prefix programmatically
pub fn set_thread_names_enabled(enabled: bool) {
    init();
    THREAD_NAMES_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Check if a log level is enabled
#[inline]
pub fn level_enabled(level: LogLevel) -> bool {
    level != LogLevel::Off && level <= log_level()
}

/// Format one leveled line (without trailing newline) into `out`.
fn format_line(
    out: &mut impl Write,
    level: LogLevel,
    with_name: bool,
    args: std::fmt::Arguments<'_>,
) -> std::io::Result<()> {
    write!(out, "{} ", level.prefix())?;
    if with_name {
        with_internal_name(|name| {
            if name.is_empty() {
                Ok(())
            } else {
                write!(out, "[{}] ", name)
            }
        })?;
    }
    out.write_fmt(args)
}

fn finish(handle: &mut impl Write) {
    if flush_enabled() {
        let _ = handle.flush();
    }
}

/// Internal: Write and optionally flush
#[doc(hidden)]
pub fn _kprint_impl(args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = handle.write_fmt(args);
    finish(&mut handle);
}

/// Internal: Write with newline and optionally flush
#[doc(hidden)]
pub fn _kprintln_impl(args: std::fmt::Arguments<'_>) {
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = handle.write_fmt(args);
    let _ = handle.write_all(b"\n");
    finish(&mut handle);
}

/// Internal: Leveled print
#[doc(hidden)]
pub fn _klog_impl(level: LogLevel, args: std::fmt::Arguments<'_>) {
    if !level_enabled(level) {
        return;
    }
    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    let _ = format_line(&mut handle, level, thread_names_enabled(), args);
    let _ = handle.write_all(b"\n");
    finish(&mut handle);
}

// ============================================================================
// Public Macros
// ============================================================================

/// Print to stderr (no newline)
#[macro_export]
macro_rules! kprint {
    ($($arg:tt)*) => {{
        $crate::kprint::_kprint_impl(format_args!($($arg)*));
    }};
}

/// Print to stderr with newline
#[macro_export]
macro_rules! kprintln {
    () => {{
        $crate::kprint::_kprintln_impl(format_args!(""));
    }};
    ($($arg:tt)*) => {{
        $crate::kprint::_kprintln_impl(format_args!($($arg)*));
    }};
}

/// Error level log
#[macro_export]
macro_rules! kerror {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Error, format_args!($($arg)*));
    }};
}

/// Warning level log
#[macro_export]
macro_rules! kwarn {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Warn, format_args!($($arg)*));
    }};
}

/// Info level log
#[macro_export]
macro_rules! kinfo {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Info, format_args!($($arg)*));
    }};
}

/// Debug level log
#[macro_export]
macro_rules! kdebug {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Debug, format_args!($($arg)*));
    }};
}

/// Trace level log
#[macro_export]
macro_rules! ktrace {
    ($($arg:tt)*) => {{
        $crate::kprint::_klog_impl($crate::kprint::LogLevel::Trace, format_args!($($arg)*));
    }};
}
