//! Raw content storage keyed by content digest.

use crate::error::{MonitorError, Result, StoreErrorKind};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Storage for raw fetched payloads.
///
/// `put` is idempotent: storing the same digest twice leaves the first copy
/// in place.
pub trait BlobStore: Send + Sync {
    /// Persist `bytes` under `digest`.
    fn put(&self, digest: &str, bytes: &[u8]) -> Result<()>;

    /// Retrieve the bytes stored under `digest`, if any.
    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>>;

    /// Retrieve and decode stored content as text.
    fn get_text(&self, digest: &str) -> Result<Option<String>> {
        Ok(self
            .get(digest)?
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
    }
}

/// One file per digest in a flat directory.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Create a blob store rooted at `dir`, creating the directory if needed.
    pub fn new(dir: PathBuf) -> Result<Self> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| MonitorError::io(&dir, e))?;
        }
        Ok(Self { dir })
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, digest: &str) -> Result<PathBuf> {
        // Digests are lowercase hex; anything else could escape the directory.
        if digest.is_empty() || !digest.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(MonitorError::store(
                "blob path",
                StoreErrorKind::Blob(format!("invalid digest '{digest}'")),
            ));
        }
        Ok(self.dir.join(digest))
    }
}

impl BlobStore for FileBlobStore {
    fn put(&self, digest: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path_for(digest)?;
        if path.is_file() {
            return Ok(());
        }

        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{digest}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|e| MonitorError::io(&self.dir, e))?;
        tmp.write_all(bytes)
            .map_err(|e| MonitorError::io(tmp.path(), e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| MonitorError::io(tmp.path(), e))?;

        // Equal digests mean equal bytes, so losing a race to another writer is fine.
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                tracing::debug!("Stored {} bytes at {}", bytes.len(), path.display());
                Ok(())
            }
            Err(err) if err.error.kind() == std::io::ErrorKind::AlreadyExists || path.is_file() => {
                tracing::trace!("{} was stored concurrently", path.display());
                Ok(())
            }
            Err(err) => Err(MonitorError::io(&path, err.error)),
        }
    }

    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path_for(digest)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(MonitorError::io(&path, e)),
        }
    }
}

/// Blob store held in memory.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.blobs.read().map(|b| b.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobStore for MemoryBlobStore {
    fn put(&self, digest: &str, bytes: &[u8]) -> Result<()> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| MonitorError::store("memory blobs", StoreErrorKind::Poisoned))?;
        blobs
            .entry(digest.to_string())
            .or_insert_with(|| bytes.to_vec());
        Ok(())
    }

    fn get(&self, digest: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| MonitorError::store("memory blobs", StoreErrorKind::Poisoned))?;
        Ok(blobs.get(digest).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIGEST: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_file_blob_roundtrip() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileBlobStore::new(dir.path().join("raw")).unwrap();
        store.put(DIGEST, b"var x=1;").unwrap();
        assert_eq!(store.get(DIGEST).unwrap().as_deref(), Some(&b"var x=1;"[..]));
        assert_eq!(store.get_text(DIGEST).unwrap().as_deref(), Some("var x=1;"));
    }

    #[test]
    fn test_file_blob_put_is_idempotent() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();
        store.put(DIGEST, b"first").unwrap();
        store.put(DIGEST, b"second").unwrap();
        assert_eq!(store.get(DIGEST).unwrap().as_deref(), Some(&b"first"[..]));
        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
        assert_eq!(files.len(), 1, "temp files should not be left behind");
    }

    #[test]
    fn test_file_blob_missing_is_none() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.get("abc123").unwrap().is_none());
    }

    #[test]
    fn test_file_blob_rejects_path_like_digest() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.put("../escape", b"x").is_err());
        assert!(store.get("").is_err());
    }

    #[test]
    fn test_file_blob_concurrent_identical_puts() {
        use std::sync::{Arc, Barrier};

        let dir = tempfile::tempdir().expect("create temp dir");
        let store = FileBlobStore::new(dir.path().to_path_buf()).unwrap();
        let mut digests = Vec::new();

        for round in 0..25 {
            let body = format!("var shared = {round};");
            let digest = crate::content_digest(body.as_bytes()).digest;
            let barrier = Arc::new(Barrier::new(4));
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..4)
                    .map(|_| {
                        let barrier = Arc::clone(&barrier);
                        let (store, digest, body) = (&store, digest.as_str(), body.as_bytes());
                        scope.spawn(move || {
                            barrier.wait();
                            store.put(digest, body)
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap().unwrap();
                }
            });
            assert_eq!(store.get_text(&digest).unwrap().as_deref(), Some(body.as_str()));
            digests.push(digest);
        }

        let mut names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        digests.sort();
        assert_eq!(names, digests, "only finished blobs should remain");
    }

    #[test]
    fn test_memory_blob_put_is_idempotent() {
        let store = MemoryBlobStore::new();
        store.put("aa", b"one").unwrap();
        store.put("aa", b"two").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("aa").unwrap().as_deref(), Some(&b"one"[..]));
    }
}
