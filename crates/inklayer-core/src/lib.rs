//! inklayer Core Library
//!
//! Ink-annotation engine over multi-page raster documents: freehand drawing
//! with heuristic shape correction, partial erasing that splits strokes,
//! undo/redo, and the viewport/coordinate model shared with the page cache.

pub mod classify;
pub mod document;
pub mod eraser;
pub mod geometry;
pub mod history;
pub mod input;
pub mod snapshot;
pub mod store;
pub mod stroke;
pub mod tools;
pub mod viewport;

pub use document::{CLASSIFY_PAUSE, GesturePreview, InkDocument};
pub use eraser::EraserMode;
pub use history::{History, HistoryEntry};
pub use input::{Modifiers, MouseButton, PointerEvent};
pub use snapshot::SnapshotError;
pub use store::{AutoSave, FileSnapshotStore, MemorySnapshotStore, SnapshotStore};
pub use stroke::{
    BlendMode, PaintStyle, SerializableColor, ShapeKind, Stroke, StrokeGeometry, StrokeId,
    StrokePaint,
};
pub use tools::{ToolKind, ToolSettings};
pub use viewport::{MAX_SCALE, MIN_SCALE, PageLayout, Viewport};
