//! Rename demo
//!
//! Starts a pool, keeps it busy with background jobs, renames it twice (once
//! after growing it) and prints the name every worker reports.
//!
//! Usage: `rename-demo [WORKERS] [PREFIX]`
//!
//! # Environment Variables
//!
//! - `TN_LOG_LEVEL=debug` - Show pool and barrier progress
//! - `TN_LOG_THREAD_NAMES=1` - Prefix log lines with the worker's name
//! - `TN_RENAME_REAP_TIMEOUT_MS=500` - Shorter straggler timeout
//! - `TN_DEMO_LINGER_MS=30000` - Sleep before exit so `ps -L -o tid,comm -p <pid>`
//!   can show the OS names

use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::time::Duration;
use threadnames::{
    env_get_duration_ms, get_internal_name, get_os_name, kdebug, kinfo, JobOutcome, NamedPool,
    PoolConfig, ThreadPool,
};

// TN_LOG_LEVEL=debug TN_LOG_THREAD_NAMES=1 cargo run -p threadnames-rename-demo -- 4 demo
fn main() {
    let args: Vec<String> = std::env::args().collect();
    let workers: usize = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4).max(1);
    let prefix = args.get(2).cloned().unwrap_or_else(|| "demo".to_string());

    println!("=== threadnames rename demo ===\n");

    let config = PoolConfig::from_env().num_workers(workers);
    let pool = match NamedPool::new(config, &prefix) {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("failed to start pool: {}", e);
            std::process::exit(1);
        }
    };
    kinfo!("pool '{}' started with {} workers", prefix, pool.size());
    print_names(&pool, "after start");

    // Background load: renaming must not disturb it
    let mut background = Vec::new();
    for i in 0..workers * 8 {
        background.push(pool.push(move |_| {
            std::thread::sleep(Duration::from_millis(2));
            kdebug!("background job {} done", i);
        }));
    }

    let grown = workers * 2;
    match pool.resize_and_rename(grown, &format!("{}x", prefix)) {
        Ok(report) => {
            println!(
                "renamed {} workers: {}/{} confirmed, exit {:?}, {} stragglers, {:?}",
                grown,
                report.confirmed,
                report.submitted,
                report.exit,
                report.stragglers.len(),
                report.elapsed
            );
        }
        Err(e) => eprintln!("resize failed: {}", e),
    }

    let completed = background
        .iter()
        .filter(|h| h.wait() == JobOutcome::Completed)
        .count();
    println!("{} background jobs completed\n", completed);

    print_names(&pool, "after grow");

    let linger = env_get_duration_ms("TN_DEMO_LINGER_MS", 0);
    if !linger.is_zero() {
        println!("sleeping {:?} (pid {})", linger, std::process::id());
        std::thread::sleep(linger);
    }

    pool.stop(true);
    println!("\n=== Demo Complete ===");
}

/// Ask every worker for its names; the probes only finish together, so each
/// one runs on a different worker.
fn print_names(pool: &ThreadPool, when: &str) {
    let n = pool.size();
    let together = Arc::new(Barrier::new(n));
    let (tx, rx) = mpsc::channel();
    for _ in 0..n {
        let together = Arc::clone(&together);
        let tx = tx.clone();
        pool.push(move |worker| {
            together.wait();
            let _ = tx.send((worker, get_internal_name(), get_os_name()));
        });
    }
    drop(tx);

    let mut rows: Vec<_> = rx.iter().collect();
    rows.sort();
    println!("{} ({} workers):", when, n);
    for (worker, internal, os) in rows {
        println!(
            "  worker {:>3}  internal={:<16} os={}",
            worker,
            internal,
            os.as_deref().unwrap_or("<unavailable>")
        );
    }
    println!();
}
