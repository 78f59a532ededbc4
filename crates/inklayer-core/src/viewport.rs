//! Viewport state and device ↔ page-local coordinate transforms.
//!
//! Pages stack vertically, centered horizontally, with a fixed gap between
//! them. Page-local coordinates are scale-independent: a stroke keeps its
//! coordinates whatever the zoom level at authoring time.

use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};

/// Minimum allowed zoom scale.
pub const MIN_SCALE: f64 = 0.5;
/// Maximum allowed zoom scale.
pub const MAX_SCALE: f64 = 2.0;
/// Vertical gap between pages, in page units.
pub const PAGE_GAP: f64 = 12.0;

/// Vertical arrangement of a document's pages, in page units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageLayout {
    sizes: Vec<Size>,
    /// Cumulative top offsets, one per page.
    offsets: Vec<f64>,
    total_height: f64,
    max_width: f64,
}

impl PageLayout {
    pub fn new(sizes: Vec<Size>) -> Self {
        let mut offsets = Vec::with_capacity(sizes.len());
        let mut y = 0.0;
        let mut max_width = 0.0_f64;
        for size in &sizes {
            offsets.push(y);
            y += size.height + PAGE_GAP;
            max_width = max_width.max(size.width);
        }
        let total_height = (y - PAGE_GAP).max(0.0);
        Self {
            sizes,
            offsets,
            total_height,
            max_width,
        }
    }

    pub fn page_count(&self) -> usize {
        self.sizes.len()
    }

    pub fn page_size(&self, index: usize) -> Size {
        self.sizes[index]
    }

    /// Top offset of a page, in page units.
    pub fn offset(&self, index: usize) -> f64 {
        self.offsets[index]
    }

    /// Total document height, in page units.
    pub fn total_height(&self) -> f64 {
        self.total_height
    }

    pub fn max_width(&self) -> f64 {
        self.max_width
    }

    /// The page whose vertical span contains `y`; points in the gap below a
    /// page belong to that page's span.
    pub fn page_at(&self, y: f64) -> Option<usize> {
        if self.sizes.is_empty() || y < 0.0 || y > self.total_height {
            return None;
        }
        let index = match self
            .offsets
            .binary_search_by(|offset| offset.total_cmp(&y))
        {
            Ok(i) => i,
            Err(0) => 0,
            Err(i) => i - 1,
        };
        Some(index)
    }
}

/// Pan/zoom state for one open document.
///
/// `scroll_y` is in device (scaled) units: the distance from the document
/// top to the viewport top at the current scale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Viewport {
    pub scale: f64,
    pub scroll_y: f64,
    pub view_size: Size,
}

impl Viewport {
    pub fn new(view_size: Size) -> Self {
        Self {
            scale: 1.0,
            scroll_y: 0.0,
            view_size,
        }
    }

    /// Horizontal offset that centers pages in the view, in device units.
    pub fn centering_offset(&self, layout: &PageLayout) -> f64 {
        ((self.view_size.width - layout.max_width() * self.scale) / 2.0).max(0.0)
    }

    /// Map a device point to its owning page and page-local coordinates.
    ///
    /// Returns None when the point falls outside every page span (above the
    /// document or past its end).
    pub fn device_to_page(
        &self,
        layout: &PageLayout,
        device: Point,
    ) -> Option<(usize, Point)> {
        let x = (device.x - self.centering_offset(layout)) / self.scale;
        let doc_y = (device.y + self.scroll_y) / self.scale;
        let page = layout.page_at(doc_y)?;
        Some((page, Point::new(x, doc_y - layout.offset(page))))
    }

    /// Map a page-local point back to device coordinates.
    pub fn page_to_device(&self, layout: &PageLayout, page: usize, local: Point) -> Point {
        Point::new(
            local.x * self.scale + self.centering_offset(layout),
            (local.y + layout.offset(page)) * self.scale - self.scroll_y,
        )
    }

    /// Zoom to `new_scale`, keeping the document point under `anchor`
    /// visually fixed. The scale clamps to [`MIN_SCALE`, `MAX_SCALE`].
    pub fn zoom_at(&mut self, layout: &PageLayout, anchor: Point, new_scale: f64) {
        let new_scale = new_scale.clamp(MIN_SCALE, MAX_SCALE);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        // Document-space y under the pointer before the zoom.
        let anchor_doc_y = (self.scroll_y + anchor.y) / self.scale;
        self.scale = new_scale;
        self.scroll_y = anchor_doc_y * new_scale - anchor.y;
        self.clamp_scroll(layout);
    }

    /// Scroll vertically by a device-unit delta.
    pub fn scroll_by(&mut self, layout: &PageLayout, delta_y: f64) {
        self.scroll_y += delta_y;
        self.clamp_scroll(layout);
    }

    fn clamp_scroll(&mut self, layout: &PageLayout) {
        let max_scroll =
            (layout.total_height() * self.scale - self.view_size.height).max(0.0);
        self.scroll_y = self.scroll_y.clamp(0.0, max_scroll);
    }

    /// The page whose span contains the viewport top.
    pub fn visible_page(&self, layout: &PageLayout) -> usize {
        if layout.page_count() == 0 {
            return 0;
        }
        let top = (self.scroll_y / self.scale).min(layout.total_height());
        layout
            .page_at(top)
            .unwrap_or(layout.page_count() - 1)
    }

    /// Indices of all pages whose span overlaps the visible area.
    pub fn visible_range(&self, layout: &PageLayout) -> std::ops::RangeInclusive<usize> {
        if layout.page_count() == 0 {
            return 0..=0;
        }
        let first = self.visible_page(layout);
        let bottom = ((self.scroll_y + self.view_size.height) / self.scale)
            .min(layout.total_height());
        let last = layout.page_at(bottom).unwrap_or(layout.page_count() - 1);
        first..=last
    }
}
