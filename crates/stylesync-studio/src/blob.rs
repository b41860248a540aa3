//! Content-addressed image blob storage

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use stylesync_core::{ContentHash, Result, StyleSyncError};

/// Content-addressed image storage
///
/// Stores images at `.stylesync/blobs/<first-2-hex>/<full-hash>.<ext>`
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    /// Create a new blob store at the given root directory
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Store image bytes and return their content hash
    pub fn store(&self, bytes: &[u8], ext: &str) -> Result<ContentHash> {
        let hash = ContentHash::from_bytes(bytes);

        let dest = self.path_for(&hash, ext);
        if dest.exists() {
            return Ok(hash); // Already stored (dedup)
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(&dest, bytes)?;
        Ok(hash)
    }

    /// Read a stored blob back, checking its hash
    pub fn load(&self, hash: &ContentHash, ext: &str) -> Result<Vec<u8>> {
        let path = self.path_for(hash, ext);
        let bytes = fs::read(&path).map_err(|e| {
            StyleSyncError::LibraryError(format!("Missing blob {}: {}", path.display(), e))
        })?;
        if ContentHash::from_bytes(&bytes) != *hash {
            return Err(StyleSyncError::LibraryError(format!(
                "Blob {} is corrupt",
                path.display()
            )));
        }
        Ok(bytes)
    }

    /// Check if a blob exists in the store
    pub fn contains(&self, hash: &ContentHash, ext: &str) -> bool {
        self.path_for(hash, ext).exists()
    }

    /// List all stored blobs with their paths
    pub fn list(&self) -> Result<Vec<(ContentHash, PathBuf)>> {
        let mut blobs = Vec::new();

        if !self.root.exists() {
            return Ok(blobs);
        }

        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                for file_entry in fs::read_dir(entry.path())? {
                    let path = file_entry?.path();
                    let hash = path
                        .file_stem()
                        .and_then(|s| s.to_str())
                        .and_then(ContentHash::from_hex);
                    if let Some(hash) = hash {
                        blobs.push((hash, path));
                    }
                }
            }
        }

        Ok(blobs)
    }

    /// Delete every blob not in `keep`. Returns how many were removed.
    pub fn retain(&self, keep: &HashSet<ContentHash>) -> Result<usize> {
        let mut removed = 0;
        for (hash, path) in self.list()? {
            if !keep.contains(&hash) {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Remove a stored blob
    pub fn remove(&self, hash: &ContentHash, ext: &str) -> Result<bool> {
        let path = self.path_for(hash, ext);
        if path.exists() {
            fs::remove_file(path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Build the storage path for a hash
    pub fn path_for(&self, hash: &ContentHash, ext: &str) -> PathBuf {
        let hex = hash.to_hex();
        let prefix = &hex[..2];
        self.root.join(prefix).join(format!("{}.{}", hex, ext))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("stylesync_blob_test_{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_store_and_load() {
        let dir = temp_dir();
        let store = BlobStore::new(&dir);

        let hash = store.store(b"fake png", "png").unwrap();
        assert!(store.contains(&hash, "png"));
        assert_eq!(store.load(&hash, "png").unwrap(), b"fake png");

        let path = store.path_for(&hash, "png");
        assert!(path.starts_with(dir.join(&hash.to_hex()[..2])));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_store_dedup_and_list() {
        let dir = temp_dir();
        let store = BlobStore::new(&dir);

        let a = store.store(b"same content", "jpg").unwrap();
        let b = store.store(b"same content", "jpg").unwrap();
        assert_eq!(a, b);
        let other = store.store(b"other", "png").unwrap();
        assert_eq!(store.list().unwrap().len(), 2);

        let keep: HashSet<ContentHash> = [other].into_iter().collect();
        assert_eq!(store.retain(&keep).unwrap(), 1);
        assert!(!store.contains(&a, "jpg"));
        assert!(store.contains(&other, "png"));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_corrupt_blob_detected() {
        let dir = temp_dir();
        let store = BlobStore::new(&dir);

        let hash = store.store(b"original", "png").unwrap();
        fs::write(store.path_for(&hash, "png"), b"tampered").unwrap();
        assert!(matches!(
            store.load(&hash, "png"),
            Err(StyleSyncError::LibraryError(_))
        ));

        assert!(store.remove(&hash, "png").unwrap());
        assert!(!store.remove(&hash, "png").unwrap());

        fs::remove_dir_all(&dir).ok();
    }
}
