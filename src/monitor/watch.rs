//! Repeating poll cycles with graceful shutdown.

use super::Monitor;
use crate::alerts::AlertSink;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

/// Sleep granularity while waiting for the next cycle.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

/// Options for [`run_watch_loop`].
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Time between the start of consecutive cycles
    pub interval: Duration,
    /// Stop after this many cycles (run forever when `None`)
    pub max_cycles: Option<u64>,
    /// Exit after the first cycle that detects a change
    pub exit_on_change: bool,
}

impl WatchOptions {
    #[must_use]
    pub const fn new(interval: Duration) -> Self {
        Self {
            interval,
            max_cycles: None,
            exit_on_change: false,
        }
    }
}

/// Run poll cycles until Ctrl-C, `max_cycles` or a change with
/// `exit_on_change`. Returns the number of completed cycles.
pub fn run_watch_loop(
    monitor: &Monitor,
    sinks: &mut [Box<dyn AlertSink>],
    options: &WatchOptions,
) -> anyhow::Result<u64> {
    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop_flag = Arc::clone(&stop);
        if let Err(e) = ctrlc::set_handler(move || stop_flag.store(true, Ordering::Relaxed)) {
            tracing::warn!("Could not install Ctrl-C handler: {e}");
        }
    }
    run_until(monitor, sinks, options, &stop)
}

/// Loop body, driven by an externally owned stop flag.
pub(crate) fn run_until(
    monitor: &Monitor,
    sinks: &mut [Box<dyn AlertSink>],
    options: &WatchOptions,
    stop: &AtomicBool,
) -> anyhow::Result<u64> {
    tracing::info!(
        "Watching {} target(s) every {:?}",
        monitor.store().targets()?.len(),
        options.interval
    );

    let mut cycles = 0u64;
    loop {
        if stop.load(Ordering::Relaxed) {
            tracing::info!("Shutting down after {cycles} cycle(s)");
            return Ok(cycles);
        }

        let started = Instant::now();
        let report = monitor.run_cycle(sinks)?;
        cycles += 1;

        let summary = report.summary();
        tracing::debug!(
            "Cycle {cycles}: {} changed, {} failed in {}ms",
            summary.changes,
            summary.failures,
            summary.elapsed_ms
        );

        if options.exit_on_change && summary.changes > 0 {
            tracing::info!("Change detected, exiting");
            return Ok(cycles);
        }
        if options.max_cycles.is_some_and(|max| cycles >= max) {
            return Ok(cycles);
        }

        let deadline = started + options.interval;
        while !stop.load(Ordering::Relaxed) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(STOP_CHECK_INTERVAL));
        }
    }
}
