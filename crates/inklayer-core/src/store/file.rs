//! File-based snapshot store.

use super::{SnapshotStore, StorageError, StorageResult};
use std::fs;
use std::path::PathBuf;

/// Snapshot store writing one file per document id under a base directory.
pub struct FileSnapshotStore {
    base_path: PathBuf,
}

impl FileSnapshotStore {
    /// Create a store at the given base directory, creating it if needed.
    pub fn new(base_path: PathBuf) -> StorageResult<Self> {
        if !base_path.exists() {
            fs::create_dir_all(&base_path).map_err(|e| {
                StorageError::Io(format!("failed to create snapshot directory: {e}"))
            })?;
        }
        Ok(Self { base_path })
    }

    /// Create a store in the platform's data directory.
    pub fn default_location() -> StorageResult<Self> {
        let base = dirs::data_local_dir()
            .or_else(dirs::home_dir)
            .ok_or_else(|| StorageError::Io("could not determine home directory".to_string()))?;
        Self::new(base.join("inklayer").join("snapshots"))
    }

    /// File path for a document id, sanitized for the filesystem.
    fn snapshot_path(&self, doc_id: &str) -> PathBuf {
        let safe_id: String = doc_id
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{safe_id}.json"))
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }
}

impl SnapshotStore for FileSnapshotStore {
    fn save(&self, doc_id: &str, bytes: &[u8]) -> StorageResult<()> {
        let path = self.snapshot_path(doc_id);
        fs::write(&path, bytes)
            .map_err(|e| StorageError::Io(format!("failed to write {}: {e}", path.display())))
    }

    fn load(&self, doc_id: &str) -> StorageResult<Option<Vec<u8>>> {
        let path = self.snapshot_path(doc_id);
        if !path.exists() {
            return Ok(None);
        }
        fs::read(&path)
            .map(Some)
            .map_err(|e| StorageError::Io(format!("failed to read {}: {e}", path.display())))
    }

    fn delete(&self, doc_id: &str) -> StorageResult<()> {
        let path = self.snapshot_path(doc_id);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| {
                StorageError::Io(format!("failed to delete {}: {e}", path.display()))
            })?;
        }
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        if !self.base_path.exists() {
            return Ok(vec![]);
        }
        let entries = fs::read_dir(&self.base_path)
            .map_err(|e| StorageError::Io(format!("failed to read directory: {e}")))?;

        let mut ids = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        Ok(ids)
    }

    fn exists(&self, doc_id: &str) -> StorageResult<bool> {
        Ok(self.snapshot_path(doc_id).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.save("my-doc", b"snapshot bytes").unwrap();
        assert_eq!(
            store.load("my-doc").unwrap(),
            Some(b"snapshot bytes".to_vec())
        );
    }

    #[test]
    fn test_missing_snapshot_is_none() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();
        assert_eq!(store.load("nonexistent").unwrap(), None);
    }

    #[test]
    fn test_list() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.save("doc1", b"a").unwrap();
        store.save("doc2", b"b").unwrap();

        let mut ids = store.list().unwrap();
        ids.sort();
        assert_eq!(ids, vec!["doc1".to_string(), "doc2".to_string()]);
    }

    #[test]
    fn test_delete() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.save("doc", b"a").unwrap();
        assert!(store.exists("doc").unwrap());
        store.delete("doc").unwrap();
        assert!(!store.exists("doc").unwrap());
    }

    #[test]
    fn test_sanitizes_id() {
        let dir = tempdir().unwrap();
        let store = FileSnapshotStore::new(dir.path().to_path_buf()).unwrap();

        store.save("notes/march:draft", b"a").unwrap();
        assert_eq!(store.load("notes/march:draft").unwrap(), Some(b"a".to_vec()));
    }
}
