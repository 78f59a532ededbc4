//! Storage abstraction for snapshot persistence.

mod autosave;
mod file;
mod memory;

pub use autosave::{AutoSave, DEFAULT_AUTOSAVE_INTERVAL_SECS};
pub use file::FileSnapshotStore;
pub use memory::MemorySnapshotStore;

use thiserror::Error;

/// Storage errors.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("storage error: {0}")]
    Other(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence collaborator holding encoded snapshots keyed by document id.
///
/// A missing snapshot is not an error: `load` returns `None` and the caller
/// starts from empty strokes.
pub trait SnapshotStore: Send + Sync {
    /// Save a snapshot.
    fn save(&self, doc_id: &str, bytes: &[u8]) -> StorageResult<()>;

    /// Load a snapshot, or `None` when the document has none.
    fn load(&self, doc_id: &str) -> StorageResult<Option<Vec<u8>>>;

    /// Delete a snapshot. Deleting a missing snapshot is a no-op.
    fn delete(&self, doc_id: &str) -> StorageResult<()>;

    /// List all document ids with snapshots.
    fn list(&self) -> StorageResult<Vec<String>>;

    /// Check if a snapshot exists.
    fn exists(&self, doc_id: &str) -> StorageResult<bool>;
}
