//! In-memory snapshot store for tests and embedding.

use super::{SnapshotStore, StorageError, StorageResult};
use std::collections::HashMap;
use std::sync::Mutex;

/// Snapshot store backed by a HashMap. Nothing persists past the process.
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>> {
        self.entries
            .lock()
            .map_err(|_| StorageError::Other("store mutex poisoned".to_string()))
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, doc_id: &str, bytes: &[u8]) -> StorageResult<()> {
        self.lock()?.insert(doc_id.to_string(), bytes.to_vec());
        Ok(())
    }

    fn load(&self, doc_id: &str) -> StorageResult<Option<Vec<u8>>> {
        Ok(self.lock()?.get(doc_id).cloned())
    }

    fn delete(&self, doc_id: &str) -> StorageResult<()> {
        self.lock()?.remove(doc_id);
        Ok(())
    }

    fn list(&self) -> StorageResult<Vec<String>> {
        Ok(self.lock()?.keys().cloned().collect())
    }

    fn exists(&self, doc_id: &str) -> StorageResult<bool> {
        Ok(self.lock()?.contains_key(doc_id))
    }
}
