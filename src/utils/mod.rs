//! Shared utilities.

mod hash;

pub use hash::{ContentDigest, content_digest, target_id};
