//! `watch`: poll on an interval until interrupted.

use super::{Runtime, exit_codes, open_runtime};
use crate::alerts::build_alert_sinks;
use crate::config::{AppConfig, parse_duration};
use crate::monitor::{WatchOptions, run_watch_loop};
use anyhow::{Context, Result};

#[derive(Debug, Clone, Default)]
pub struct WatchArgs {
    /// Overrides `watch.interval`
    pub interval: Option<String>,
    pub max_cycles: Option<u64>,
    pub exit_on_change: bool,
    pub quiet: bool,
}

/// Run the watch loop, returning the exit code.
pub fn run_watch(config: &AppConfig, args: &WatchArgs) -> Result<i32> {
    let interval_str = args.interval.as_deref().unwrap_or(&config.watch.interval);
    let interval = parse_duration(interval_str).context("invalid watch interval")?;
    if interval.is_zero() {
        anyhow::bail!("watch interval must be greater than zero");
    }

    let runtime: Runtime = open_runtime(config)?;
    let monitor = runtime.monitor(config)?;
    if runtime.store.targets()?.is_empty() {
        anyhow::bail!("No targets configured. Add URLs under `targets:` or pass --url.");
    }

    let mut sinks = build_alert_sinks(&config.alerts, args.quiet)?;
    let options = WatchOptions {
        interval,
        max_cycles: args.max_cycles,
        exit_on_change: args.exit_on_change,
    };
    let cycles = run_watch_loop(&monitor, &mut sinks, &options)?;
    tracing::info!("Completed {cycles} poll cycle(s)");

    Ok(exit_codes::SUCCESS)
}
