//! Default values shared by the configuration types.

use std::path::PathBuf;

pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_RETRIES: u8 = 3;
pub const DEFAULT_CONTEXT_MARGIN: usize = crate::snippet::DEFAULT_CONTEXT_MARGIN;
pub const DEFAULT_MERGE_GAP: usize = crate::diff::DEFAULT_MERGE_GAP;
pub const DEFAULT_DIFF_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_SMTP_PORT: u16 = 25;
pub const DEFAULT_WATCH_INTERVAL: &str = "1h";
pub const DEFAULT_WORKERS: usize = 4;

/// Per-user data directory for jsmon, falling back to the working directory.
#[must_use]
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jsmon")
}

#[must_use]
pub fn default_database_path() -> PathBuf {
    data_dir().join("jsmon.sqlite3")
}

#[must_use]
pub fn default_blob_dir() -> PathBuf {
    data_dir().join("raw")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_paths_share_data_dir() {
        let db = default_database_path();
        let blobs = default_blob_dir();
        assert_eq!(db.parent(), blobs.parent());
        assert!(db.ends_with("jsmon/jsmon.sqlite3"));
        assert!(blobs.ends_with("jsmon/raw"));
    }

    #[test]
    fn test_diff_timeout_matches_engine() {
        assert_eq!(
            std::time::Duration::from_millis(DEFAULT_DIFF_TIMEOUT_MS),
            crate::diff::DEFAULT_DIFF_TIMEOUT
        );
    }
}
