//! Poll orchestration.
//!
//! A [`Monitor`] runs one poll cycle over every registered target: fetch,
//! hash, store the raw payload, classify, and for changed content localize
//! the change and deliver an alert. [`run_watch_loop`] repeats cycles on an
//! interval until interrupted.

mod cycle;
mod poller;
mod watch;

pub use cycle::{CycleReport, CycleSummary, TargetResult, TargetStatus};
pub use poller::{Monitor, PendingAlert, PollResult};
pub use watch::{WatchOptions, run_watch_loop};
