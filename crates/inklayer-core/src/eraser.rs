//! Eraser engine: intersection testing and partial-mode stroke splitting.
//!
//! Partial erasing splits a stroke where the eraser crossed it and keeps
//! the surviving pieces; full erasing removes any intersecting stroke
//! wholesale. Either way the produced history batch restores the exact
//! pre-erase stroke set on undo.

use crate::geometry::{
    distance, distance_to_polyline, polyline_length, sample_polyline,
};
use crate::history::HistoryEntry;
use crate::stroke::{Stroke, StrokeGeometry};
use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

/// Arc-length step of the sampled intersection walk.
pub const SAMPLE_STEP: f64 = 5.0;
/// Surviving fragments shorter than this are discarded rather than kept.
pub const MIN_SEGMENT_LENGTH: f64 = 4.0;

/// Erasing behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EraserMode {
    /// Split strokes at the eraser's path, keeping the remainder.
    #[default]
    Partial,
    /// Remove any touched stroke entirely.
    Full,
}

/// Run an eraser pass over a page's strokes.
///
/// Mutates `strokes` in place and returns the history batch describing the
/// pass (empty when nothing intersected).
pub fn erase(
    strokes: &mut Vec<Stroke>,
    page: usize,
    eraser_path: &[Point],
    eraser_width: f64,
    mode: EraserMode,
) -> Vec<HistoryEntry> {
    if eraser_path.is_empty() {
        return Vec::new();
    }
    let half_width = eraser_width / 2.0;
    let eraser_bounds = bounds_of(eraser_path);
    let eraser_samples = sample_polyline(eraser_path, SAMPLE_STEP);

    let mut batch = Vec::new();
    let mut index = 0;
    while index < strokes.len() {
        if !intersects(&strokes[index], &eraser_samples, eraser_bounds, half_width) {
            index += 1;
            continue;
        }

        let stroke = strokes.remove(index);
        batch.push(HistoryEntry::StrokeRemoved {
            page,
            index,
            stroke: stroke.clone(),
        });

        if mode == EraserMode::Partial {
            // Survivors take the removed stroke's position in z-order.
            let survivors = split_stroke(&stroke, eraser_path, half_width);
            for survivor in survivors {
                batch.push(HistoryEntry::StrokeAdded {
                    page,
                    index,
                    stroke: survivor.clone(),
                });
                strokes.insert(index, survivor);
                index += 1;
            }
        }
    }
    batch
}

/// Sampled intersection test between a stroke outline and the eraser path.
///
/// A cheap bounding-box reject (stroke bounds inflated by the eraser
/// half-width) runs first; then both paths are walked at `SAMPLE_STEP` and
/// any sample pair within the half-width counts as a hit.
pub fn intersects(
    stroke: &Stroke,
    eraser_samples: &[Point],
    eraser_bounds: Rect,
    half_width: f64,
) -> bool {
    let inflated = stroke.bounds().inflate(half_width, half_width);
    if !rects_overlap(inflated, eraser_bounds) {
        return false;
    }
    let outline = sample_polyline(&stroke.geometry.outline(SAMPLE_STEP), SAMPLE_STEP);
    outline.iter().any(|&s| {
        eraser_samples
            .iter()
            .any(|&e| distance(s, e) <= half_width)
    })
}

/// Split one stroke against the eraser path, returning the survivors.
fn split_stroke(stroke: &Stroke, eraser_path: &[Point], half_width: f64) -> Vec<Stroke> {
    let erased = |p: Point| distance_to_polyline(p, eraser_path) <= half_width;
    match &stroke.geometry {
        StrokeGeometry::Freehand { points } => kept_runs(points, erased)
            .into_iter()
            .map(|run| Stroke::freehand(run, stroke.paint.clone()))
            .collect(),
        // A two-point primitive has no interior points to classify, so the
        // idealized segment is walked at a fixed step instead.
        StrokeGeometry::Line { start, end } => {
            let samples = sample_polyline(&[*start, *end], SAMPLE_STEP);
            kept_runs(&samples, erased)
                .into_iter()
                .filter(|run| run.len() >= 2)
                .map(|run| {
                    let (sub_start, sub_end) = (run[0], run[run.len() - 1]);
                    Stroke::shape(
                        vec![sub_start, sub_end],
                        StrokeGeometry::Line {
                            start: sub_start,
                            end: sub_end,
                        },
                        stroke.paint.clone(),
                    )
                })
                .collect()
        }
        // A cut circle or box is no longer that shape; the surviving arcs
        // demote to freehand.
        geometry => kept_runs(&geometry.outline(SAMPLE_STEP), erased)
            .into_iter()
            .map(|run| Stroke::freehand(run, stroke.paint.clone()))
            .collect(),
    }
}

/// Maximal consecutive runs of non-erased points, dropping fragments
/// shorter than `MIN_SEGMENT_LENGTH`.
fn kept_runs(points: &[Point], erased: impl Fn(Point) -> bool) -> Vec<Vec<Point>> {
    let mut runs = Vec::new();
    let mut current: Vec<Point> = Vec::new();
    for &p in points {
        if erased(p) {
            if !current.is_empty() {
                runs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(p);
        }
    }
    if !current.is_empty() {
        runs.push(current);
    }
    runs.retain(|run| polyline_length(run) > MIN_SEGMENT_LENGTH);
    runs
}

/// Closed-interval overlap test; unlike an area test it keeps degenerate
/// (zero-width) eraser paths from rejecting everything.
fn rects_overlap(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && b.x0 <= a.x1 && a.y0 <= b.y1 && b.y0 <= a.y1
}

fn bounds_of(points: &[Point]) -> Rect {
    let mut rect = Rect::from_points(points[0], points[0]);
    for &p in &points[1..] {
        rect = rect.union_pt(p);
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stroke::{ShapeKind, StrokePaint};

    fn horizontal_line() -> Stroke {
        Stroke::shape(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            StrokeGeometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 0.0),
            },
            StrokePaint::default(),
        )
    }

    fn crossing_eraser() -> Vec<Point> {
        vec![Point::new(50.0, -10.0), Point::new(50.0, 10.0)]
    }

    #[test]
    fn test_full_mode_removes_whole_stroke() {
        let mut strokes = vec![horizontal_line()];
        let batch = erase(&mut strokes, 0, &crossing_eraser(), 20.0, EraserMode::Full);
        assert!(strokes.is_empty());
        assert_eq!(batch.len(), 1);
        assert!(matches!(batch[0], HistoryEntry::StrokeRemoved { .. }));
    }

    #[test]
    fn test_line_split_at_midpoint() {
        // A 20-unit eraser centered on a 100-unit line leaves two segments,
        // each longer than the eraser half-width, clear of the erased middle.
        let mut strokes = vec![horizontal_line()];
        let batch = erase(
            &mut strokes,
            0,
            &crossing_eraser(),
            20.0,
            EraserMode::Partial,
        );
        assert_eq!(strokes.len(), 2);
        assert_eq!(batch.len(), 3);
        for stroke in &strokes {
            assert_eq!(stroke.kind(), ShapeKind::Line);
            let StrokeGeometry::Line { start, end } = stroke.geometry else {
                unreachable!();
            };
            assert!(distance(start, end) > 10.0);
            // Neither survivor reaches into the erased middle.
            assert!(end.x < 40.0 || start.x > 60.0);
        }
    }

    #[test]
    fn test_missed_stroke_untouched() {
        let mut strokes = vec![horizontal_line()];
        let far_eraser = vec![Point::new(50.0, 200.0), Point::new(50.0, 220.0)];
        let batch = erase(&mut strokes, 0, &far_eraser, 20.0, EraserMode::Partial);
        assert_eq!(strokes.len(), 1);
        assert!(batch.is_empty());
    }

    #[test]
    fn test_freehand_split_drops_short_fragment() {
        // Points every 2 units; erasing near one end leaves a fragment too
        // short to keep.
        let points: Vec<Point> = (0..=50).map(|i| Point::new(i as f64 * 2.0, 0.0)).collect();
        let mut strokes = vec![Stroke::freehand(points, StrokePaint::default())];
        let eraser = vec![Point::new(6.0, -5.0), Point::new(6.0, 5.0)];
        erase(&mut strokes, 0, &eraser, 8.0, EraserMode::Partial);
        // The left fragment (x in [0, 2]) is below the minimum length.
        assert_eq!(strokes.len(), 1);
        let StrokeGeometry::Freehand { points } = &strokes[0].geometry else {
            panic!("expected freehand survivor");
        };
        assert!(points[0].x >= 10.0);
    }

    #[test]
    fn test_circle_split_demotes_to_freehand() {
        let circle = Stroke::shape(
            Vec::new(),
            StrokeGeometry::Circle {
                center: Point::new(0.0, 0.0),
                radius: 50.0,
            },
            StrokePaint::default(),
        );
        let mut strokes = vec![circle];
        // Erase around the rightmost point of the circle.
        let eraser = vec![Point::new(50.0, -5.0), Point::new(50.0, 5.0)];
        erase(&mut strokes, 0, &eraser, 16.0, EraserMode::Partial);
        assert_eq!(strokes.len(), 1);
        assert_eq!(strokes[0].kind(), ShapeKind::Freehand);
    }

    #[test]
    fn test_survivors_keep_paint() {
        let mut paint = StrokePaint::default();
        paint.width = 7.0;
        let line = Stroke::shape(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            StrokeGeometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 0.0),
            },
            paint.clone(),
        );
        let mut strokes = vec![line];
        erase(&mut strokes, 0, &crossing_eraser(), 20.0, EraserMode::Partial);
        assert!(strokes.iter().all(|s| s.paint == paint));
    }
}
