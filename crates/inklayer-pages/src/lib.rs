//! inklayer Page Cache
//!
//! Bounded-memory multi-resolution bitmap cache over a multi-page raster
//! document. The cache manager reacts to viewport scroll/zoom, promotes
//! pages near the visible one to high resolution on background workers, and
//! persists rendered bitmaps to disk so reopening a document is cheap.

pub mod bitmap;
pub mod cache;
pub mod disk;
pub mod executor;
pub mod source;

pub use bitmap::{Dpi, PageBitmap};
pub use cache::{
    HIGH_BUFFER, HIGH_DPI, LOW_DPI, MAX_HIGH_PAGES, PageCacheManager, PageTier,
};
pub use disk::{CacheError, DiskBitmapCache};
pub use executor::{InlineExecutor, RenderExecutor, ThreadExecutor};
pub use source::{DocumentLoadError, DocumentSource, PageRenderError, PageRenderer};
