//! Viewport-driven page bitmap cache.
//!
//! Each page moves through a tier state machine: Unloaded → Low → High,
//! and High → Low on eviction; never back to Unloaded while the document
//! is open. The manager reacts to viewport changes by promoting pages near
//! the visible one to high resolution and downgrading the rest, keeping the
//! set of High pages a contiguous range bounded by a hard ceiling.
//!
//! All cache state is mutated on the coordination context only. Render jobs
//! run on an executor and report back over a channel drained by [`pump`];
//! a page awaiting promotion keeps displaying its previous bitmap until the
//! replacement is ready.
//!
//! [`pump`]: PageCacheManager::pump

use crate::bitmap::{Dpi, PageBitmap};
use crate::disk::DiskBitmapCache;
use crate::executor::RenderExecutor;
use crate::source::{DocumentLoadError, DocumentSource, PageRenderError, PageRenderer};
use inklayer_core::{PageLayout, Viewport};
use kurbo::Size;
use std::sync::Arc;
use std::sync::mpsc::{Receiver, Sender, channel};

/// Resolution pages are rendered at for the low tier.
pub const LOW_DPI: Dpi = Dpi(72);
/// Resolution pages are rendered at for the high tier.
pub const HIGH_DPI: Dpi = Dpi(216);
/// Pages on either side of the visible page kept at high resolution.
pub const HIGH_BUFFER: usize = 1;
/// Hard ceiling on simultaneous high-tier pages.
pub const MAX_HIGH_PAGES: usize = 5;

/// Resolution level at which a page's bitmap is currently cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageTier {
    Unloaded,
    Low,
    High,
}

/// Per-page cache state. The low bitmap is retained through promotion so a
/// downgrade can swap it back in without rendering.
#[derive(Default)]
struct PageSlot {
    low: Option<PageBitmap>,
    high: Option<PageBitmap>,
    /// Resolution of the render currently in flight for this page, if any.
    in_flight: Option<Dpi>,
    /// A failed high render pins the page to the low tier until an explicit
    /// invalidation.
    failed: bool,
}

impl PageSlot {
    fn tier(&self) -> PageTier {
        if self.high.is_some() {
            PageTier::High
        } else if self.low.is_some() {
            PageTier::Low
        } else {
            PageTier::Unloaded
        }
    }

    fn bitmap(&self) -> Option<&PageBitmap> {
        self.high.as_ref().or(self.low.as_ref())
    }
}

/// Completion message a render job sends back to the coordination context.
struct RenderComplete {
    generation: u64,
    page: usize,
    dpi: Dpi,
    result: Result<PageBitmap, PageRenderError>,
}

/// Bounded multi-resolution bitmap cache over one open document's pages.
pub struct PageCacheManager {
    renderer: Option<Arc<dyn PageRenderer>>,
    executor: Box<dyn RenderExecutor>,
    disk: Option<Arc<DiskBitmapCache>>,
    slots: Vec<PageSlot>,
    visible: usize,
    /// Bumped on every document open; completions carrying an older
    /// generation are discarded on arrival.
    generation: u64,
    tx: Sender<RenderComplete>,
    rx: Receiver<RenderComplete>,
}

impl PageCacheManager {
    pub fn new(executor: Box<dyn RenderExecutor>) -> Self {
        let (tx, rx) = channel();
        Self {
            renderer: None,
            executor,
            disk: None,
            slots: Vec::new(),
            visible: 0,
            generation: 0,
            tx,
            rx,
        }
    }

    /// Persist rendered bitmaps to a disk cache so reopening a document
    /// skips re-rendering.
    pub fn with_disk_cache(mut self, cache: Arc<DiskBitmapCache>) -> Self {
        self.disk = Some(cache);
        self
    }

    /// Open a document, replacing any previously open one.
    ///
    /// Returns the page count. On failure no state is installed and any
    /// previously open document stays usable. In-flight renders for the
    /// prior document are discarded when their completions arrive.
    pub fn open_document(
        &mut self,
        source: &dyn DocumentSource,
        bytes: &[u8],
    ) -> Result<usize, DocumentLoadError> {
        let renderer = source.open(bytes)?;
        let count = renderer.page_count();
        self.generation += 1;
        self.renderer = Some(renderer);
        self.slots = (0..count).map(|_| PageSlot::default()).collect();
        self.visible = 0;
        self.apply_target();
        Ok(count)
    }

    pub fn page_count(&self) -> usize {
        self.slots.len()
    }

    /// Page sizes in points, for building a [`PageLayout`].
    pub fn page_sizes(&self) -> Vec<Size> {
        let Some(renderer) = &self.renderer else {
            return Vec::new();
        };
        (0..renderer.page_count())
            .map(|i| renderer.page_size(i))
            .collect()
    }

    pub fn tier(&self, page: usize) -> PageTier {
        self.slots[page].tier()
    }

    /// The bitmap to display for a page: the high-resolution one when
    /// present, otherwise the retained low-resolution one.
    pub fn bitmap(&self, page: usize) -> Option<&PageBitmap> {
        self.slots[page].bitmap()
    }

    pub fn visible_page(&self) -> usize {
        self.visible
    }

    /// React to a scroll or zoom change.
    pub fn update_viewport(&mut self, viewport: &Viewport, layout: &PageLayout) {
        self.set_visible_page(viewport.visible_page(layout));
    }

    /// Retarget the high-resolution range around a new visible page.
    pub fn set_visible_page(&mut self, page: usize) {
        if self.slots.is_empty() {
            return;
        }
        self.visible = page.min(self.slots.len() - 1);
        self.apply_target();
    }

    /// Drop a page's cached bitmaps and re-render it from source. Clears
    /// the pin left by a failed render.
    pub fn invalidate(&mut self, page: usize) {
        if let Some(disk) = &self.disk {
            disk.remove(page);
        }
        let slot = &mut self.slots[page];
        slot.failed = false;
        slot.high = None;
        // The stale low bitmap keeps displaying while the re-render runs.
        self.queue_render(page, LOW_DPI);
        self.apply_target();
    }

    /// Drain completed renders into the cache. Call from the coordination
    /// context; returns the pages whose bitmap changed.
    pub fn pump(&mut self) -> Vec<usize> {
        let mut changed = Vec::new();
        loop {
            let mut progressed = false;
            while let Ok(msg) = self.rx.try_recv() {
                progressed = true;
                if msg.generation != self.generation {
                    log::debug!(
                        "discarding render for page {} of a closed document",
                        msg.page
                    );
                    continue;
                }
                let slot = &mut self.slots[msg.page];
                if slot.in_flight == Some(msg.dpi) {
                    slot.in_flight = None;
                }
                match msg.result {
                    Ok(bitmap) => {
                        if msg.dpi == HIGH_DPI {
                            slot.high = Some(bitmap);
                        } else {
                            slot.low = Some(bitmap);
                        }
                        changed.push(msg.page);
                    }
                    Err(err) => {
                        log::warn!("{err}; page pinned to low tier");
                        slot.failed = true;
                    }
                }
            }
            if !progressed {
                break;
            }
            // Completions unlock follow-up work: a fresh low bitmap lets its
            // page promote, an installed high may now be out of range.
            self.apply_target();
        }
        changed.sort_unstable();
        changed.dedup();
        changed
    }

    /// Enforce the tier invariants around the current visible page.
    fn apply_target(&mut self) {
        let count = self.slots.len();
        if count == 0 {
            return;
        }
        let visible = self.visible.min(count - 1);
        let lo = visible.saturating_sub(HIGH_BUFFER);
        let hi = (visible + HIGH_BUFFER).min(count - 1);

        // Downgrade high pages outside the target range. The retained low
        // bitmap swaps back in, so the page never goes bitmap-less.
        for (page, slot) in self.slots.iter_mut().enumerate() {
            if (page < lo || page > hi) && slot.high.is_some() {
                slot.high = None;
                log::debug!("page {page} downgraded to low tier");
            }
        }

        // Every page gets at least a low bitmap while the document is open.
        for page in 0..count {
            if self.slots[page].tier() == PageTier::Unloaded {
                self.queue_render(page, LOW_DPI);
            }
        }

        // Promote in-range pages, nearest to the visible page first.
        let mut wanted: Vec<usize> = (lo..=hi).collect();
        wanted.sort_by_key(|&p| p.abs_diff(visible));
        for page in wanted {
            let slot = &self.slots[page];
            if slot.high.is_some() || slot.failed || slot.in_flight.is_some() {
                continue;
            }
            // The ceiling counts in-flight promotions too; evict the
            // farthest high page when a nearer candidate needs the slot.
            while self.high_load() >= MAX_HIGH_PAGES {
                let Some(victim) = self.farthest_high(visible) else {
                    break;
                };
                if victim.abs_diff(visible) <= page.abs_diff(visible) {
                    break;
                }
                log::debug!("evicting page {victim} for page {page}");
                self.slots[victim].high = None;
            }
            if self.high_load() >= MAX_HIGH_PAGES {
                continue;
            }
            self.queue_render(page, HIGH_DPI);
        }
    }

    /// High pages held plus high renders in flight.
    fn high_load(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.high.is_some() || s.in_flight == Some(HIGH_DPI))
            .count()
    }

    fn farthest_high(&self, visible: usize) -> Option<usize> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.high.is_some())
            .max_by_key(|(page, _)| page.abs_diff(visible))
            .map(|(page, _)| page)
    }

    /// Hand a render job to the executor. Idempotent: a page with a render
    /// already in flight is not re-queued.
    fn queue_render(&mut self, page: usize, dpi: Dpi) {
        let Some(renderer) = self.renderer.clone() else {
            return;
        };
        let slot = &mut self.slots[page];
        if slot.in_flight.is_some() || (dpi == HIGH_DPI && slot.failed) {
            return;
        }
        slot.in_flight = Some(dpi);

        let disk = self.disk.clone();
        let tx = self.tx.clone();
        let generation = self.generation;
        self.executor.spawn(Box::new(move || {
            if let Some(cache) = &disk {
                if let Some(bitmap) = cache.load(page, dpi) {
                    let _ = tx.send(RenderComplete {
                        generation,
                        page,
                        dpi,
                        result: Ok(bitmap),
                    });
                    return;
                }
            }
            let result = renderer.render_page(page, dpi);
            if let (Some(cache), Ok(bitmap)) = (&disk, &result) {
                if let Err(err) = cache.store(page, dpi, bitmap) {
                    log::warn!("failed to cache page {page} at {dpi} dpi: {err}");
                }
            }
            let _ = tx.send(RenderComplete {
                generation,
                page,
                dpi,
                result,
            });
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::InlineExecutor;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct FakeRenderer {
        sizes: Vec<Size>,
        renders: Mutex<Vec<(usize, Dpi)>>,
        fail_high: Mutex<HashSet<usize>>,
    }

    impl FakeRenderer {
        fn new(pages: usize) -> Arc<Self> {
            Arc::new(Self {
                sizes: vec![Size::new(612.0, 792.0); pages],
                renders: Mutex::new(Vec::new()),
                fail_high: Mutex::new(HashSet::new()),
            })
        }

        fn render_count(&self) -> usize {
            self.renders.lock().unwrap().len()
        }
    }

    impl PageRenderer for FakeRenderer {
        fn page_count(&self) -> usize {
            self.sizes.len()
        }

        fn page_size(&self, page: usize) -> Size {
            self.sizes[page]
        }

        fn render_page(&self, page: usize, dpi: Dpi) -> Result<PageBitmap, PageRenderError> {
            self.renders.lock().unwrap().push((page, dpi));
            if dpi == HIGH_DPI && self.fail_high.lock().unwrap().contains(&page) {
                return Err(PageRenderError {
                    page,
                    dpi,
                    reason: "simulated failure".to_string(),
                });
            }
            Ok(PageBitmap::solid(2, 2, [page as u8, dpi.0 as u8, 0, 255]))
        }
    }

    struct FakeSource {
        renderer: Option<Arc<FakeRenderer>>,
    }

    impl FakeSource {
        fn with_pages(pages: usize) -> (Self, Arc<FakeRenderer>) {
            let renderer = FakeRenderer::new(pages);
            (
                Self {
                    renderer: Some(renderer.clone()),
                },
                renderer,
            )
        }

        fn failing() -> Self {
            Self { renderer: None }
        }
    }

    impl DocumentSource for FakeSource {
        fn open(&self, _bytes: &[u8]) -> Result<Arc<dyn PageRenderer>, DocumentLoadError> {
            match &self.renderer {
                Some(renderer) => Ok(renderer.clone()),
                None => Err(DocumentLoadError::Corrupt("simulated".to_string())),
            }
        }
    }

    type JobQueue = Arc<Mutex<Vec<Box<dyn FnOnce() + Send + 'static>>>>;

    /// Executor that parks jobs until the test runs them, modelling renders
    /// still in flight.
    struct ManualExecutor(JobQueue);

    impl ManualExecutor {
        fn new() -> (Self, JobQueue) {
            let queue: JobQueue = Arc::new(Mutex::new(Vec::new()));
            (Self(queue.clone()), queue)
        }
    }

    impl RenderExecutor for ManualExecutor {
        fn spawn(&self, job: Box<dyn FnOnce() + Send + 'static>) {
            self.0.lock().unwrap().push(job);
        }
    }

    fn run_queued(queue: &JobQueue) {
        let jobs: Vec<_> = std::mem::take(&mut *queue.lock().unwrap());
        for job in jobs {
            job();
        }
    }

    fn high_pages(manager: &PageCacheManager) -> Vec<usize> {
        (0..manager.page_count())
            .filter(|&p| manager.tier(p) == PageTier::High)
            .collect()
    }

    #[test]
    fn test_failed_open_installs_nothing() {
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        assert!(manager
            .open_document(&FakeSource::failing(), b"bytes")
            .is_err());
        assert_eq!(manager.page_count(), 0);
    }

    #[test]
    fn test_initial_load_promotes_visible_range() {
        let (source, _) = FakeSource::with_pages(6);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        assert_eq!(manager.open_document(&source, b"doc").unwrap(), 6);
        manager.pump();

        assert_eq!(high_pages(&manager), vec![0, 1]);
        // Every other page still has a low bitmap; none are unloaded.
        for page in 0..6 {
            assert!(manager.bitmap(page).is_some(), "page {page} has no bitmap");
            assert_ne!(manager.tier(page), PageTier::Unloaded);
        }
    }

    #[test]
    fn test_scroll_sequence_keeps_invariants() {
        let (source, _) = FakeSource::with_pages(12);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        manager.open_document(&source, b"doc").unwrap();
        manager.pump();

        for visible in [0usize, 3, 7, 11, 5, 0] {
            manager.set_visible_page(visible);
            manager.pump();

            let highs = high_pages(&manager);
            assert!(highs.len() <= MAX_HIGH_PAGES);
            assert!(highs.contains(&visible), "visible {visible} not high");
            // Contiguous range within visible ± buffer.
            for &page in &highs {
                assert!(page.abs_diff(visible) <= HIGH_BUFFER);
            }
        }
    }

    #[test]
    fn test_viewport_drives_visible_page() {
        let (source, _) = FakeSource::with_pages(5);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        manager.open_document(&source, b"doc").unwrap();

        let layout = PageLayout::new(manager.page_sizes());
        let mut viewport = Viewport::new(Size::new(612.0, 800.0));
        viewport.scroll_by(&layout, 2.5 * 792.0);
        manager.update_viewport(&viewport, &layout);
        manager.pump();

        assert_eq!(manager.visible_page(), 2);
        assert_eq!(manager.tier(2), PageTier::High);
    }

    #[test]
    fn test_downgrade_swaps_in_retained_low() {
        let (source, _) = FakeSource::with_pages(8);
        let (executor, queue) = ManualExecutor::new();
        let mut manager = PageCacheManager::new(Box::new(executor));
        manager.open_document(&source, b"doc").unwrap();
        run_queued(&queue);
        manager.pump();
        run_queued(&queue);
        manager.pump();
        assert_eq!(manager.tier(0), PageTier::High);

        manager.set_visible_page(5);
        // Page 0 downgrades immediately; its low bitmap keeps displaying.
        assert_eq!(manager.tier(0), PageTier::Low);
        assert!(manager.bitmap(0).is_some());
        // Page 5 awaits promotion and keeps its previous tier meanwhile.
        assert_eq!(manager.tier(5), PageTier::Low);
        assert!(manager.bitmap(5).is_some());

        run_queued(&queue);
        manager.pump();
        assert_eq!(manager.tier(5), PageTier::High);
    }

    #[test]
    fn test_page_mid_render_not_requeued() {
        let (source, _) = FakeSource::with_pages(4);
        let (executor, queue) = ManualExecutor::new();
        let mut manager = PageCacheManager::new(Box::new(executor));
        manager.open_document(&source, b"doc").unwrap();

        let queued = queue.lock().unwrap().len();
        manager.set_visible_page(0);
        manager.set_visible_page(0);
        assert_eq!(queue.lock().unwrap().len(), queued);
    }

    #[test]
    fn test_high_load_respects_ceiling() {
        let (source, _) = FakeSource::with_pages(20);
        let (executor, queue) = ManualExecutor::new();
        let mut manager = PageCacheManager::new(Box::new(executor));
        manager.open_document(&source, b"doc").unwrap();
        run_queued(&queue);
        manager.pump();

        // Retarget repeatedly without letting any render finish; in-flight
        // promotions must never exceed the ceiling.
        for visible in [0usize, 4, 9, 14, 19] {
            manager.set_visible_page(visible);
            assert!(manager.high_load() <= MAX_HIGH_PAGES);
        }

        run_queued(&queue);
        manager.pump();
        run_queued(&queue);
        manager.pump();
        // Once everything settles only the final target range stays high.
        assert_eq!(high_pages(&manager), vec![18, 19]);
    }

    #[test]
    fn test_render_failure_pins_page_low() {
        let (source, renderer) = FakeSource::with_pages(4);
        renderer.fail_high.lock().unwrap().insert(1);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        manager.open_document(&source, b"doc").unwrap();
        manager.pump();

        assert_eq!(manager.tier(0), PageTier::High);
        assert_eq!(manager.tier(1), PageTier::Low);

        // Further retargets do not retry the failed page.
        let renders_before = renderer.render_count();
        manager.set_visible_page(1);
        manager.pump();
        assert_eq!(manager.tier(1), PageTier::Low);
        let retried = renderer
            .renders
            .lock()
            .unwrap()
            .iter()
            .skip(renders_before)
            .any(|&(page, dpi)| page == 1 && dpi == HIGH_DPI);
        assert!(!retried);
    }

    #[test]
    fn test_invalidate_unpins_and_rerenders() {
        let (source, renderer) = FakeSource::with_pages(4);
        renderer.fail_high.lock().unwrap().insert(1);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));
        manager.open_document(&source, b"doc").unwrap();
        manager.pump();
        assert_eq!(manager.tier(1), PageTier::Low);

        renderer.fail_high.lock().unwrap().clear();
        manager.invalidate(1);
        manager.pump();
        assert_eq!(manager.tier(1), PageTier::High);
    }

    #[test]
    fn test_new_document_discards_stale_renders() {
        let (source_a, _) = FakeSource::with_pages(8);
        let (source_b, renderer_b) = FakeSource::with_pages(2);
        let mut manager = PageCacheManager::new(Box::new(InlineExecutor));

        // Document A's completions sit undrained in the channel when B opens.
        manager.open_document(&source_a, b"a").unwrap();
        manager.open_document(&source_b, b"b").unwrap();
        manager.pump();

        assert_eq!(manager.page_count(), 2);
        for page in 0..2 {
            assert!(manager.bitmap(page).is_some());
        }
        assert!(renderer_b.render_count() > 0);
    }

    #[test]
    fn test_disk_cache_skips_rerender_on_reopen() {
        let dir = tempdir().unwrap();
        let cache = Arc::new(DiskBitmapCache::new(dir.path().to_path_buf()).unwrap());

        let (source, first) = FakeSource::with_pages(3);
        let mut manager =
            PageCacheManager::new(Box::new(InlineExecutor)).with_disk_cache(cache.clone());
        manager.open_document(&source, b"doc").unwrap();
        manager.pump();
        assert!(first.render_count() > 0);

        // A fresh manager over the same cache directory recalls every bitmap.
        let (source, second) = FakeSource::with_pages(3);
        let mut reopened = PageCacheManager::new(Box::new(InlineExecutor)).with_disk_cache(cache);
        reopened.open_document(&source, b"doc").unwrap();
        reopened.pump();

        assert_eq!(second.render_count(), 0);
        assert_eq!(high_pages(&reopened), vec![0, 1]);
    }
}
