//! Document source seam: where pre-rendered page bitmaps come from.
//!
//! The engine never parses document bytes itself; the host supplies an
//! opener that turns them into a page renderer.

use crate::bitmap::{Dpi, PageBitmap};
use kurbo::Size;
use std::sync::Arc;
use thiserror::Error;

/// Failure to open a document. Fatal to that document only; no partial
/// state is installed.
#[derive(Debug, Error)]
pub enum DocumentLoadError {
    #[error("unsupported document format")]
    Unsupported,
    #[error("corrupt document: {0}")]
    Corrupt(String),
    #[error("IO error: {0}")]
    Io(String),
}

/// Failure to rasterize one page at one resolution.
#[derive(Debug, Error)]
#[error("failed to render page {page} at {dpi} dpi: {reason}")]
pub struct PageRenderError {
    pub page: usize,
    pub dpi: Dpi,
    pub reason: String,
}

/// Opens raw document bytes into a page renderer.
pub trait DocumentSource {
    fn open(&self, bytes: &[u8]) -> Result<Arc<dyn PageRenderer>, DocumentLoadError>;
}

/// Rasterizes pages of one open document. Shared with render workers.
pub trait PageRenderer: Send + Sync {
    fn page_count(&self) -> usize;

    /// Page dimensions in points.
    fn page_size(&self, page: usize) -> Size;

    fn render_page(&self, page: usize, dpi: Dpi) -> Result<PageBitmap, PageRenderError>;
}
