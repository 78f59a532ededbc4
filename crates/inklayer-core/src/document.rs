//! Per-document annotation state and gesture orchestration.
//!
//! All stroke mutation and history bookkeeping happens here, on the host's
//! single coordination context. Drawing appends points synchronously; shape
//! classification is deferred behind a pause window re-armed by every new
//! point, so an active gesture never classifies prematurely.

use crate::classify;
use crate::eraser;
use crate::history::{History, HistoryEntry};
use crate::input::{MouseButton, PointerEvent};
use crate::stroke::{Stroke, StrokeGeometry, StrokeId};
use crate::tools::{ToolKind, ToolSettings};
use crate::viewport::{PageLayout, Viewport};
use kurbo::{Point, Size, Vec2};
use std::time::{Duration, Instant};

/// Gesture pause after which a point run is classified.
pub const CLASSIFY_PAUSE: Duration = Duration::from_millis(300);
/// Zoom multiplier per wheel notch.
const ZOOM_WHEEL_FACTOR: f64 = 1.1;
/// Pointer movement below this distance does not extend a gesture.
const MIN_POINT_SPACING: f64 = 0.5;

/// An in-progress pointer gesture, pinned to the page it started on.
#[derive(Debug)]
enum Gesture {
    Draw {
        page: usize,
        points: Vec<Point>,
        /// Idealized geometry produced by a mid-gesture pause, if any.
        corrected: Option<StrokeGeometry>,
        /// Whether the current pause window already ran the classifier.
        classified: bool,
        last_point_at: Instant,
    },
    Erase {
        page: usize,
        points: Vec<Point>,
    },
}

/// Read-only view of the active gesture, for preview rendering.
#[derive(Debug)]
pub struct GesturePreview<'a> {
    pub page: usize,
    pub points: &'a [Point],
    pub corrected: Option<&'a StrokeGeometry>,
}

/// Annotation state for one open document.
pub struct InkDocument {
    doc_id: String,
    layout: PageLayout,
    /// Ordered strokes per page; insertion order is z-order.
    pages: Vec<Vec<Stroke>>,
    pub viewport: Viewport,
    pub tools: ToolSettings,
    history: History,
    gesture: Option<Gesture>,
}

impl InkDocument {
    /// Create annotation state for a document with the given page sizes.
    pub fn new(doc_id: impl Into<String>, page_sizes: Vec<Size>, view_size: Size) -> Self {
        let page_count = page_sizes.len();
        Self {
            doc_id: doc_id.into(),
            layout: PageLayout::new(page_sizes),
            pages: vec![Vec::new(); page_count],
            viewport: Viewport::new(view_size),
            tools: ToolSettings::new(),
            history: History::new(),
            gesture: None,
        }
    }

    pub fn doc_id(&self) -> &str {
        &self.doc_id
    }

    pub fn layout(&self) -> &PageLayout {
        &self.layout
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn strokes(&self, page: usize) -> &[Stroke] {
        &self.pages[page]
    }

    pub(crate) fn pages(&self) -> &[Vec<Stroke>] {
        &self.pages
    }

    pub(crate) fn replace_pages(&mut self, pages: Vec<Vec<Stroke>>) {
        debug_assert_eq!(pages.len(), self.pages.len());
        self.pages = pages;
        self.history.clear();
        self.gesture = None;
    }

    /// The active gesture, for preview rendering.
    pub fn gesture_preview(&self) -> Option<GesturePreview<'_>> {
        match &self.gesture {
            Some(Gesture::Draw {
                page,
                points,
                corrected,
                ..
            }) => Some(GesturePreview {
                page: *page,
                points,
                corrected: corrected.as_ref(),
            }),
            Some(Gesture::Erase { page, points }) => Some(GesturePreview {
                page: *page,
                points,
                corrected: None,
            }),
            None => None,
        }
    }

    /// Feed one pointer event. Returns true when visible state changed.
    pub fn handle_pointer(&mut self, event: &PointerEvent, now: Instant) -> bool {
        match event {
            PointerEvent::Pressed {
                position,
                button: MouseButton::Left,
                ..
            } => self.begin_gesture(*position, now),
            PointerEvent::Pressed { .. } => false,
            PointerEvent::Moved { position } => self.extend_gesture(*position, now),
            PointerEvent::Released {
                position,
                button: MouseButton::Left,
            } => self.finish_gesture(*position, now),
            PointerEvent::Released { .. } => false,
            PointerEvent::WheelChanged {
                position,
                delta,
                modifiers,
            } => {
                if modifiers.ctrl {
                    let factor = if delta.y > 0.0 {
                        ZOOM_WHEEL_FACTOR
                    } else {
                        1.0 / ZOOM_WHEEL_FACTOR
                    };
                    let new_scale = self.viewport.scale * factor;
                    self.viewport.zoom_at(&self.layout, *position, new_scale);
                } else {
                    self.viewport.scroll_by(&self.layout, -delta.y);
                }
                true
            }
        }
    }

    /// Drive the deferred classifier. Call periodically while a drawing
    /// gesture is active; returns true when a correction appeared.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(Gesture::Draw {
            points,
            corrected,
            classified,
            last_point_at,
            ..
        }) = &mut self.gesture
        else {
            return false;
        };
        if *classified
            || points.len() < 2
            || now.duration_since(*last_point_at) < CLASSIFY_PAUSE
        {
            return false;
        }
        *classified = true;
        let geometry = classify::correct(points, self.viewport.scale);
        if geometry.kind() == crate::stroke::ShapeKind::Freehand {
            return false;
        }
        *corrected = Some(geometry);
        true
    }

    fn begin_gesture(&mut self, position: Point, now: Instant) -> bool {
        let Some((page, local)) = self.viewport.device_to_page(&self.layout, position)
        else {
            return false;
        };
        self.gesture = Some(match self.tools.active {
            ToolKind::Eraser => Gesture::Erase {
                page,
                points: vec![local],
            },
            ToolKind::Pen | ToolKind::Marker => Gesture::Draw {
                page,
                points: vec![local],
                corrected: None,
                classified: false,
                last_point_at: now,
            },
        });
        true
    }

    fn extend_gesture(&mut self, position: Point, now: Instant) -> bool {
        let Some(page) = (match &self.gesture {
            Some(Gesture::Draw { page, .. } | Gesture::Erase { page, .. }) => Some(*page),
            None => None,
        }) else {
            return false;
        };
        let local = self.page_local(page, position);
        let Some(gesture) = &mut self.gesture else {
            return false;
        };
        match gesture {
            Gesture::Draw {
                points,
                corrected,
                classified,
                last_point_at,
                ..
            } => {
                let far_enough = points
                    .last()
                    .is_none_or(|&p| crate::geometry::distance(p, local) > MIN_POINT_SPACING);
                if !far_enough {
                    return false;
                }
                points.push(local);
                // Every new point re-arms the pause window and discards any
                // correction from a previous pause.
                *corrected = None;
                *classified = false;
                *last_point_at = now;
                true
            }
            Gesture::Erase { points, .. } => {
                points.push(local);
                true
            }
        }
    }

    fn finish_gesture(&mut self, position: Point, now: Instant) -> bool {
        self.extend_gesture(position, now);
        let Some(gesture) = self.gesture.take() else {
            return false;
        };
        match gesture {
            Gesture::Draw {
                page,
                points,
                corrected,
                ..
            } => {
                if points.is_empty() {
                    return false;
                }
                let Some(paint) = self.tools.active_paint().cloned() else {
                    return false;
                };
                let stroke = match corrected {
                    Some(geometry) => Stroke::shape(points, geometry, paint),
                    None => Stroke::freehand(points, paint),
                };
                self.commit_stroke(page, stroke);
                true
            }
            Gesture::Erase { page, points } => {
                let batch = eraser::erase(
                    &mut self.pages[page],
                    page,
                    &points,
                    self.tools.eraser_width,
                    self.tools.eraser_mode,
                );
                let changed = !batch.is_empty();
                self.history.record(batch);
                changed
            }
        }
    }

    /// Page-local coordinates of a device point, relative to a fixed page.
    /// Unlike [`Viewport::device_to_page`] this never re-targets another
    /// page, so a gesture stays pinned to the page it started on.
    fn page_local(&self, page: usize, device: Point) -> Point {
        let x = (device.x - self.viewport.centering_offset(&self.layout))
            / self.viewport.scale;
        let doc_y = (device.y + self.viewport.scroll_y) / self.viewport.scale;
        Point::new(x, doc_y - self.layout.offset(page))
    }

    /// Add a committed stroke to a page, recording history.
    pub fn commit_stroke(&mut self, page: usize, stroke: Stroke) {
        let index = self.pages[page].len();
        self.history.record(vec![HistoryEntry::StrokeAdded {
            page,
            index,
            stroke: stroke.clone(),
        }]);
        self.pages[page].push(stroke);
    }

    /// Translate a committed stroke, recording both geometries in history.
    pub fn move_stroke(&mut self, page: usize, id: StrokeId, delta: Vec2) -> bool {
        let Some(stroke) = self.pages[page].iter_mut().find(|s| s.id() == id) else {
            return false;
        };
        let original = stroke.clone();
        stroke.translate(delta);
        let moved = stroke.clone();
        self.history.record(vec![HistoryEntry::StrokeMoved {
            page,
            original,
            moved,
        }]);
        true
    }

    /// Topmost stroke under a page-local point, if any.
    pub fn stroke_at(&self, page: usize, local: Point, tolerance: f64) -> Option<StrokeId> {
        self.pages[page]
            .iter()
            .rev()
            .find(|s| s.hit_test(local, tolerance))
            .map(|s| s.id())
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Undo the most recent batch. Returns false when there is none.
    pub fn undo(&mut self) -> bool {
        let Some(batch) = self.history.undo() else {
            return false;
        };
        for entry in batch.iter().rev() {
            match entry {
                HistoryEntry::StrokeAdded { page, stroke, .. } => {
                    self.pages[*page].retain(|s| s.id() != stroke.id());
                }
                HistoryEntry::StrokeRemoved {
                    page,
                    index,
                    stroke,
                } => {
                    let at = (*index).min(self.pages[*page].len());
                    self.pages[*page].insert(at, stroke.clone());
                }
                HistoryEntry::StrokeMoved { page, original, .. } => {
                    if let Some(s) = self.pages[*page]
                        .iter_mut()
                        .find(|s| s.id() == original.id())
                    {
                        *s = original.clone();
                    }
                }
            }
        }
        true
    }

    /// Re-apply the most recently undone batch.
    pub fn redo(&mut self) -> bool {
        let Some(batch) = self.history.redo() else {
            return false;
        };
        for entry in batch {
            match entry {
                HistoryEntry::StrokeAdded {
                    page,
                    index,
                    stroke,
                } => {
                    let at = (*index).min(self.pages[*page].len());
                    self.pages[*page].insert(at, stroke.clone());
                }
                HistoryEntry::StrokeRemoved { page, stroke, .. } => {
                    self.pages[*page].retain(|s| s.id() != stroke.id());
                }
                HistoryEntry::StrokeMoved { page, moved, .. } => {
                    if let Some(s) = self.pages[*page]
                        .iter_mut()
                        .find(|s| s.id() == moved.id())
                    {
                        *s = moved.clone();
                    }
                }
            }
        }
        true
    }
}
