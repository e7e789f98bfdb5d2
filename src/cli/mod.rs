//! CLI command handlers.
//!
//! Each handler implements the logic of one subcommand and is invoked by
//! `main.rs`. Handlers return an exit code instead of exiting so they stay
//! testable.

mod context;
mod diff;
mod history;
mod poll;
mod targets;
mod watch;

pub use context::{Runtime, open_runtime};
pub use diff::{DiffSource, run_diff};
pub use history::run_history;
pub use poll::{PollOptions, run_poll};
pub use targets::run_targets;
pub use watch::{WatchArgs, run_watch};

/// Process exit codes.
pub mod exit_codes {
    /// Nothing changed
    pub const SUCCESS: i32 = 0;
    /// At least one target changed (with `--fail-on-change`)
    pub const CHANGES: i32 = 1;
    /// At least one target could not be polled, or a recorded change
    /// could not be turned into an alert
    pub const TARGET_FAILURES: i32 = 2;
    /// The command itself failed
    pub const ERROR: i32 = 3;
}
