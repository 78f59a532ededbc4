//! Periodic snapshot saving to prevent data loss.

use super::{SnapshotStore, StorageError, StorageResult};
use crate::document::InkDocument;
use crate::snapshot;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Default auto-save interval in seconds.
pub const DEFAULT_AUTOSAVE_INTERVAL_SECS: u64 = 30;

/// Tracks dirtiness and saves the open document on an interval.
pub struct AutoSave<S: SnapshotStore> {
    storage: Arc<S>,
    interval: Duration,
    last_save: Option<Instant>,
    dirty: bool,
}

impl<S: SnapshotStore> AutoSave<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self {
            storage,
            interval: Duration::from_secs(DEFAULT_AUTOSAVE_INTERVAL_SECS),
            last_save: None,
            dirty: false,
        }
    }

    pub fn set_interval(&mut self, interval: Duration) {
        self.interval = interval;
    }

    /// Mark the document as having unsaved changes.
    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Check if the document is dirty and the interval has elapsed.
    pub fn should_save(&self) -> bool {
        if !self.dirty {
            return false;
        }
        match self.last_save {
            Some(last) => last.elapsed() >= self.interval,
            None => true,
        }
    }

    /// Save the document if needed. Returns true if a save was performed.
    pub fn maybe_save(&mut self, doc: &InkDocument) -> StorageResult<bool> {
        if !self.should_save() {
            return Ok(false);
        }
        self.save(doc)?;
        Ok(true)
    }

    /// Save the document immediately.
    pub fn save(&mut self, doc: &InkDocument) -> StorageResult<()> {
        let bytes = snapshot::encode(doc)
            .map_err(|e| StorageError::Other(format!("snapshot encoding failed: {e}")))?;
        self.storage.save(doc.doc_id(), &bytes)?;
        self.last_save = Some(Instant::now());
        self.dirty = false;
        Ok(())
    }

    /// Load and apply a document's snapshot if one exists.
    ///
    /// Returns true when a snapshot was found and applied. An unreadable
    /// snapshot counts as absent: the document keeps empty strokes.
    pub fn restore(&mut self, doc: &mut InkDocument) -> StorageResult<bool> {
        let Some(bytes) = self.storage.load(doc.doc_id())? else {
            return Ok(false);
        };
        match snapshot::apply(doc, &bytes) {
            Ok(()) => {
                self.dirty = false;
                Ok(true)
            }
            Err(err) => {
                log::warn!("snapshot restore failed for {}: {err}", doc.doc_id());
                Ok(false)
            }
        }
    }
}
