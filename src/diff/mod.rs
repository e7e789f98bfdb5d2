//! Text diff engine for fetched package content.
//!
//! Content is treated as opaque text: no JavaScript parsing happens here.
//! The engine reports [`ChangeSpan`](crate::model::ChangeSpan)s in char
//! offsets, each side relative to its own text.
//!
//! # Example
//!
//! ```
//! use jsmon::diff::TextDiffEngine;
//!
//! let spans = TextDiffEngine::new().diff("var x=1;", "var x=2;");
//! assert_eq!(spans.len(), 1);
//! assert_eq!(spans[0].old, 6..7);
//! ```

mod engine;

pub use engine::{DEFAULT_DIFF_TIMEOUT, DEFAULT_MERGE_GAP, TextDiffEngine};
