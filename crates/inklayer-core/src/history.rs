//! Undo/redo over stroke add/remove/move operations.

use crate::stroke::Stroke;

/// Maximum number of undo batches to keep.
const MAX_HISTORY: usize = 50;

/// One recorded stroke operation, carrying everything needed to apply it
/// forwards (redo) or backwards (undo). A moved stroke holds both
/// geometries; nothing points back into the live document.
#[derive(Debug, Clone)]
pub enum HistoryEntry {
    StrokeAdded {
        page: usize,
        index: usize,
        stroke: Stroke,
    },
    StrokeRemoved {
        page: usize,
        index: usize,
        stroke: Stroke,
    },
    StrokeMoved {
        page: usize,
        original: Stroke,
        moved: Stroke,
    },
}

/// Undo/redo stacks of operation batches.
///
/// A batch is one user-visible action: a single committed stroke, or the
/// full set of removals and re-insertions produced by one erase gesture.
/// Undoing a batch restores the document state from before that action.
#[derive(Debug, Default)]
pub struct History {
    undo: Vec<Vec<HistoryEntry>>,
    redo: Vec<Vec<HistoryEntry>>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a new batch. Clears the redo stack.
    pub fn record(&mut self, batch: Vec<HistoryEntry>) {
        if batch.is_empty() {
            return;
        }
        self.undo.push(batch);
        self.redo.clear();
        if self.undo.len() > MAX_HISTORY {
            self.undo.remove(0);
        }
    }

    /// Move the most recent batch onto the redo stack and return it.
    /// The caller applies the entries in reverse, inverted.
    pub fn undo(&mut self) -> Option<&[HistoryEntry]> {
        let batch = self.undo.pop()?;
        self.redo.push(batch);
        self.redo.last().map(Vec::as_slice)
    }

    /// Move the most recently undone batch back and return it.
    /// The caller re-applies the entries in order.
    pub fn redo(&mut self) -> Option<&[HistoryEntry]> {
        let batch = self.redo.pop()?;
        self.undo.push(batch);
        self.undo.last().map(Vec::as_slice)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::StrokePaint;
    use kurbo::Point;

    fn entry() -> HistoryEntry {
        HistoryEntry::StrokeAdded {
            page: 0,
            index: 0,
            stroke: Stroke::freehand(
                vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)],
                StrokePaint::default(),
            ),
        }
    }

    #[test]
    fn test_record_enables_undo() {
        let mut history = History::new();
        assert!(!history.can_undo());
        history.record(vec![entry()]);
        assert!(history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_undo_moves_to_redo() {
        let mut history = History::new();
        history.record(vec![entry()]);
        assert!(history.undo().is_some());
        assert!(!history.can_undo());
        assert!(history.can_redo());
        assert!(history.redo().is_some());
        assert!(history.can_undo());
    }

    #[test]
    fn test_new_record_clears_redo() {
        let mut history = History::new();
        history.record(vec![entry()]);
        history.undo();
        assert!(history.can_redo());
        history.record(vec![entry()]);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_empty_batch_ignored() {
        let mut history = History::new();
        history.record(Vec::new());
        assert!(!history.can_undo());
    }

    #[test]
    fn test_history_depth_bounded() {
        let mut history = History::new();
        for _ in 0..(MAX_HISTORY + 10) {
            history.record(vec![entry()]);
        }
        let mut undone = 0;
        while history.undo().is_some() {
            undone += 1;
        }
        assert_eq!(undone, MAX_HISTORY);
    }
}
