//! Content and identity hashing.
//!
//! Content is decoded as UTF-8 (lossy) before hashing so that the digest and
//! the character count describe the same text the diff engine later sees.
//! Sizes are counted in Unicode scalar values, the unit used for every offset
//! in this crate.

use crate::model::TargetId;
use sha2::{Digest, Sha256};
use xxhash_rust::xxh3::xxh3_128;

/// Identity digest and size of one fetched payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentDigest {
    /// Lowercase hex SHA-256 of the decoded text
    pub digest: String,
    /// Length of the decoded text in chars
    pub size: usize,
}

/// Compute the content digest and char size of a payload. Never fails.
#[must_use]
pub fn content_digest(content: &[u8]) -> ContentDigest {
    let text = String::from_utf8_lossy(content);
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    ContentDigest {
        digest: format!("{:x}", hasher.finalize()),
        size: text.chars().count(),
    }
}

/// Derive the stable target id for a URL.
#[must_use]
pub fn target_id(url: &str) -> TargetId {
    TargetId::from_hex(format!("{:032x}", xxh3_128(url.as_bytes())))
}
