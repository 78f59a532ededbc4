//! Heuristic shape recognition and correction for hand-drawn point runs.
//!
//! A completed (or paused) point run is tested against shape classes in a
//! fixed order (line, circle, triangle, rectangle) and the first match
//! wins. Matching replaces the noisy run with an idealized primitive; no
//! match leaves the authored path untouched. The tolerances are empirical
//! and tunable, not exact geometry.

use crate::geometry::{distance, distance_to_segment};
use crate::stroke::{ShapeKind, StrokeGeometry};
use kurbo::{Point, Rect, Vec2};
use std::f64::consts::TAU;

/// Max perpendicular deviation from the chord, as a fraction of chord length.
pub const LINE_TOLERANCE: f64 = 0.10;
/// Max radial deviation from the fitted radius, as a fraction of the radius.
pub const CIRCLE_TOLERANCE: f64 = 0.30;
/// Max deviation from a polygon edge, as a fraction of that edge's length.
pub const EDGE_TOLERANCE: f64 = 0.20;

/// Circle fitting needs enough points to distinguish a loop from an arc.
const MIN_CIRCLE_POINTS: usize = 4;
/// Minimum on-screen length of a corrected line, in device units.
const MIN_LINE_LENGTH: f64 = 8.0;
/// Candidate vertices closer together than this are degenerate.
const MIN_VERTEX_SPACING: f64 = 1.0;
/// A point counts against a polygon candidate beyond this multiple of the
/// mean edge length.
const POLYGON_OUTLIER_FACTOR: f64 = 0.4;
/// Fraction of stray points above which a polygon candidate is rejected.
const POLYGON_OUTLIER_FRACTION: f64 = 0.10;

/// Classify a point run into a shape class. Runs of fewer than two points
/// never match.
pub fn recognize(points: &[Point]) -> ShapeKind {
    if points.len() < 2 {
        return ShapeKind::Freehand;
    }
    if is_line(points) {
        ShapeKind::Line
    } else if is_circle(points) {
        ShapeKind::Circle
    } else if polygon_matches(points, 3, 2) {
        ShapeKind::Triangle
    } else if polygon_matches(points, 4, 3) {
        ShapeKind::Rectangle
    } else {
        ShapeKind::Freehand
    }
}

/// Classify a run and synthesize the idealized geometry for the match.
///
/// `scale` is the current viewport scale; it keeps the minimum corrected
/// line length constant on screen regardless of zoom.
pub fn correct(points: &[Point], scale: f64) -> StrokeGeometry {
    match recognize(points) {
        ShapeKind::Freehand => StrokeGeometry::Freehand {
            points: points.to_vec(),
        },
        ShapeKind::Line => {
            corrected_line(points[0], points[points.len() - 1], scale)
        }
        ShapeKind::Circle => {
            let bbox = bounds_of(points);
            StrokeGeometry::Circle {
                center: bbox.center(),
                radius: bbox.width().max(bbox.height()) / 2.0,
            }
        }
        ShapeKind::Triangle => {
            let bbox = bounds_of(points);
            StrokeGeometry::Triangle {
                a: Point::new(bbox.center().x, bbox.y0),
                b: Point::new(bbox.x1, bbox.y1),
                c: Point::new(bbox.x0, bbox.y1),
            }
        }
        ShapeKind::Rectangle => StrokeGeometry::Rectangle {
            rect: bounds_of(points),
        },
    }
}

/// All interior points stay within `LINE_TOLERANCE` of the chord between
/// the first and last point.
fn is_line(points: &[Point]) -> bool {
    let first = points[0];
    let last = points[points.len() - 1];
    let chord = distance(first, last);
    points[1..points.len() - 1]
        .iter()
        .all(|&p| distance_to_segment(p, first, last) < LINE_TOLERANCE * chord)
}

/// Every point stays within `CIRCLE_TOLERANCE` of the radius implied by the
/// bounding box.
fn is_circle(points: &[Point]) -> bool {
    if points.len() < MIN_CIRCLE_POINTS {
        return false;
    }
    let bbox = bounds_of(points);
    let center = bbox.center();
    let radius = bbox.width().max(bbox.height()) / 2.0;
    if radius < f64::EPSILON {
        return false;
    }
    points
        .iter()
        .all(|&p| (distance(p, center) - radius).abs() < CIRCLE_TOLERANCE * radius)
}

/// Test the run against a `sides`-gon: pick candidate vertices by
/// polar-angle sampling around the centroid, assign points to their nearest
/// candidate edge, and require `min_valid` edges to hold their points
/// within `EDGE_TOLERANCE`.
fn polygon_matches(points: &[Point], sides: usize, min_valid: usize) -> bool {
    let Some(vertices) = candidate_vertices(points, sides) else {
        return false;
    };
    let edges: Vec<(Point, Point)> = (0..sides)
        .map(|i| (vertices[i], vertices[(i + 1) % sides]))
        .collect();

    // Reject candidates that leave a chunk of the run stranded far from
    // every edge; a triangle drawn over three corners of a rectangle passes
    // the per-edge test but strands the fourth corner.
    let mean_edge_len: f64 =
        edges.iter().map(|&(a, b)| distance(a, b)).sum::<f64>() / sides as f64;
    let outlier_cutoff = POLYGON_OUTLIER_FACTOR * mean_edge_len;
    let strays = points
        .iter()
        .filter(|&&p| {
            edges
                .iter()
                .map(|&(a, b)| distance_to_segment(p, a, b))
                .fold(f64::INFINITY, f64::min)
                > outlier_cutoff
        })
        .count();
    if strays as f64 > POLYGON_OUTLIER_FRACTION * points.len() as f64 {
        return false;
    }

    // Worst deviation of the points assigned to each edge.
    let mut worst = vec![0.0_f64; sides];
    for &p in points {
        if let Some((edge, dev)) = assign_to_edge(p, &edges) {
            worst[edge] = worst[edge].max(dev);
        }
    }
    let valid = edges
        .iter()
        .enumerate()
        .filter(|&(i, &(a, b))| worst[i] <= EDGE_TOLERANCE * distance(a, b))
        .count();
    valid >= min_valid
}

/// One candidate vertex per polar sector around the centroid: the point
/// farthest from the centroid within that sector. Sectors are anchored at
/// the first point's angle. Returns None when a sector is empty or the
/// chosen vertices nearly coincide.
fn candidate_vertices(points: &[Point], sides: usize) -> Option<Vec<Point>> {
    let centroid = centroid(points);
    let base = (points[0].y - centroid.y).atan2(points[0].x - centroid.x);
    let span = TAU / sides as f64;

    let mut best: Vec<Option<(f64, Point)>> = vec![None; sides];
    for &p in points {
        let radius = distance(centroid, p);
        let angle = (p.y - centroid.y).atan2(p.x - centroid.x);
        let sector = (((angle - base).rem_euclid(TAU) / span) as usize).min(sides - 1);
        if best[sector].is_none_or(|(r, _)| radius > r) {
            best[sector] = Some((radius, p));
        }
    }

    let vertices: Vec<Point> = best
        .into_iter()
        .map(|b| b.map(|(_, p)| p))
        .collect::<Option<_>>()?;
    for i in 0..sides {
        for j in i + 1..sides {
            if distance(vertices[i], vertices[j]) < MIN_VERTEX_SPACING {
                return None;
            }
        }
    }
    Some(vertices)
}

/// Assign a point to its candidate edge: prefer edges whose inflated
/// bounding box contains the point, then take the closest by distance.
fn assign_to_edge(p: Point, edges: &[(Point, Point)]) -> Option<(usize, f64)> {
    let mut nearest: Option<(usize, f64)> = None;
    let mut nearest_contained: Option<(usize, f64)> = None;
    for (i, &(a, b)) in edges.iter().enumerate() {
        let dev = distance_to_segment(p, a, b);
        if nearest.is_none_or(|(_, d)| dev < d) {
            nearest = Some((i, dev));
        }
        let margin = EDGE_TOLERANCE * distance(a, b);
        if Rect::from_points(a, b).inflate(margin, margin).contains(p)
            && nearest_contained.is_none_or(|(_, d)| dev < d)
        {
            nearest_contained = Some((i, dev));
        }
    }
    nearest_contained.or(nearest)
}

fn corrected_line(start: Point, end: Point, scale: f64) -> StrokeGeometry {
    // A tap produces coincident endpoints; give the line a direction.
    let end = if distance(start, end) < f64::EPSILON {
        start + Vec2::new(1.0, 0.0)
    } else {
        end
    };
    let min_length = MIN_LINE_LENGTH / scale.max(f64::EPSILON);
    let length = distance(start, end);
    let end = if length < min_length {
        let dir = (end - start) * (1.0 / length);
        start + dir * min_length
    } else {
        end
    };
    StrokeGeometry::Line { start, end }
}

fn centroid(points: &[Point]) -> Point {
    let n = points.len() as f64;
    let sum = points
        .iter()
        .fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    (sum / n).to_point()
}

fn bounds_of(points: &[Point]) -> Rect {
    let mut rect = Rect::from_points(points[0], points[0]);
    for &p in &points[1..] {
        rect = rect.union_pt(p);
    }
    rect
}
