//! Value types shared by the store, diff engine and reporters.
//!
//! Records are passed by value between components; nothing here owns
//! storage or performs I/O.

mod span;
mod target;
mod version;

pub use span::{ChangeSpan, Snippet};
pub use target::{Target, TargetId};
pub use version::{Classification, PollOutcome, VersionRecord};
