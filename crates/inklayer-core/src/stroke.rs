//! Stroke model: paint, geometry, and the committed stroke itself.

use crate::geometry::{distance, distance_to_polyline, sample_polyline};
use kurbo::{BezPath, Point, Rect, Shape as KurboShape, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for strokes.
pub type StrokeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// How a stroke composites against the page underneath it.
///
/// Pen strokes paint over the page; marker strokes multiply so the page
/// content stays readable through the ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlendMode {
    #[default]
    SourceOver,
    Multiply,
}

impl BlendMode {
    /// Map to the peniko blend description used by the renderer.
    pub fn to_peniko(self) -> peniko::BlendMode {
        let mix = match self {
            BlendMode::SourceOver => peniko::Mix::Normal,
            BlendMode::Multiply => peniko::Mix::Multiply,
        };
        peniko::BlendMode::new(mix, peniko::Compose::SrcOver)
    }
}

/// Stroke rendering style.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintStyle {
    #[default]
    Solid,
    Dashed,
}

/// Paint properties of a stroke.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrokePaint {
    /// Stroke color.
    pub color: SerializableColor,
    /// Stroke width in page units.
    pub width: f64,
    /// Overall opacity (0.0 = fully transparent, 1.0 = fully opaque).
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    /// Blend mode against the page.
    #[serde(default)]
    pub blend: BlendMode,
    /// Rendering style.
    #[serde(default)]
    pub style: PaintStyle,
}

fn default_opacity() -> f64 {
    1.0
}

impl StrokePaint {
    /// Get the color as a peniko Color.
    pub fn color(&self) -> Color {
        self.color.into()
    }

    /// Get the color with opacity applied.
    pub fn color_with_opacity(&self) -> Color {
        let color: Color = self.color.into();
        let rgba = color.to_rgba8();
        let alpha = (rgba.a as f64 * self.opacity) as u8;
        Color::from_rgba8(rgba.r, rgba.g, rgba.b, alpha)
    }
}

impl Default for StrokePaint {
    fn default() -> Self {
        Self {
            color: SerializableColor::black(),
            width: 2.0,
            opacity: 1.0,
            blend: BlendMode::default(),
            style: PaintStyle::default(),
        }
    }
}

/// Recognized shape classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShapeKind {
    /// No recognized shape; the authored path stands as drawn.
    #[default]
    Freehand,
    Line,
    Circle,
    Triangle,
    Rectangle,
}

/// Geometry of a committed stroke: either the freehand polyline as drawn
/// or an idealized primitive synthesized by the corrector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StrokeGeometry {
    Freehand { points: Vec<Point> },
    Line { start: Point, end: Point },
    Circle { center: Point, radius: f64 },
    Triangle { a: Point, b: Point, c: Point },
    Rectangle { rect: Rect },
}

/// Arc-length step used when flattening curved outlines.
const OUTLINE_STEP: f64 = 5.0;

impl StrokeGeometry {
    pub fn kind(&self) -> ShapeKind {
        match self {
            StrokeGeometry::Freehand { .. } => ShapeKind::Freehand,
            StrokeGeometry::Line { .. } => ShapeKind::Line,
            StrokeGeometry::Circle { .. } => ShapeKind::Circle,
            StrokeGeometry::Triangle { .. } => ShapeKind::Triangle,
            StrokeGeometry::Rectangle { .. } => ShapeKind::Rectangle,
        }
    }

    /// Bounding box in page-local coordinates.
    pub fn bounds(&self) -> Rect {
        match self {
            StrokeGeometry::Freehand { points } => bounds_of(points),
            StrokeGeometry::Line { start, end } => {
                Rect::from_points(*start, *end)
            }
            StrokeGeometry::Circle { center, radius } => Rect::new(
                center.x - radius,
                center.y - radius,
                center.x + radius,
                center.y + radius,
            ),
            StrokeGeometry::Triangle { a, b, c } => {
                Rect::from_points(*a, *b).union_pt(*c)
            }
            StrokeGeometry::Rectangle { rect } => *rect,
        }
    }

    /// The rendered outline as a polyline, for hit testing and erasing.
    ///
    /// Closed shapes return a closed loop (first point repeated at the end),
    /// sampled at roughly `step` units of arc length.
    pub fn outline(&self, step: f64) -> Vec<Point> {
        match self {
            StrokeGeometry::Freehand { points } => points.clone(),
            StrokeGeometry::Line { start, end } => {
                sample_polyline(&[*start, *end], step)
            }
            StrokeGeometry::Circle { center, radius } => {
                let circumference = 2.0 * std::f64::consts::PI * radius.max(f64::EPSILON);
                let n = ((circumference / step).ceil() as usize).max(8);
                let mut pts: Vec<Point> = (0..n)
                    .map(|i| {
                        let angle = 2.0 * std::f64::consts::PI * i as f64 / n as f64;
                        Point::new(
                            center.x + radius * angle.cos(),
                            center.y + radius * angle.sin(),
                        )
                    })
                    .collect();
                pts.push(pts[0]);
                pts
            }
            StrokeGeometry::Triangle { a, b, c } => {
                sample_polyline(&[*a, *b, *c, *a], step)
            }
            StrokeGeometry::Rectangle { rect } => {
                let corners = [
                    Point::new(rect.x0, rect.y0),
                    Point::new(rect.x1, rect.y0),
                    Point::new(rect.x1, rect.y1),
                    Point::new(rect.x0, rect.y1),
                    Point::new(rect.x0, rect.y0),
                ];
                sample_polyline(&corners, step)
            }
        }
    }

    /// Path representation for rendering.
    pub fn to_path(&self) -> BezPath {
        match self {
            StrokeGeometry::Freehand { points } => {
                let mut path = BezPath::new();
                if let Some(first) = points.first() {
                    path.move_to(*first);
                    for point in points.iter().skip(1) {
                        path.line_to(*point);
                    }
                }
                path
            }
            StrokeGeometry::Line { start, end } => {
                let mut path = BezPath::new();
                path.move_to(*start);
                path.line_to(*end);
                path
            }
            StrokeGeometry::Circle { center, radius } => {
                kurbo::Circle::new(*center, *radius).to_path(0.1)
            }
            StrokeGeometry::Triangle { a, b, c } => {
                let mut path = BezPath::new();
                path.move_to(*a);
                path.line_to(*b);
                path.line_to(*c);
                path.close_path();
                path
            }
            StrokeGeometry::Rectangle { rect } => rect.to_path(0.1),
        }
    }

    /// Translate the geometry by a delta.
    pub fn translate(&mut self, delta: Vec2) {
        match self {
            StrokeGeometry::Freehand { points } => {
                for p in points {
                    *p += delta;
                }
            }
            StrokeGeometry::Line { start, end } => {
                *start += delta;
                *end += delta;
            }
            StrokeGeometry::Circle { center, .. } => {
                *center += delta;
            }
            StrokeGeometry::Triangle { a, b, c } => {
                *a += delta;
                *b += delta;
                *c += delta;
            }
            StrokeGeometry::Rectangle { rect } => {
                *rect = *rect + delta;
            }
        }
    }
}

fn bounds_of(points: &[Point]) -> Rect {
    let Some(first) = points.first() else {
        return Rect::ZERO;
    };
    let mut rect = Rect::from_points(*first, *first);
    for p in points.iter().skip(1) {
        rect = rect.union_pt(*p);
    }
    rect
}

/// One committed drawing action on a page.
///
/// The authored point run is immutable after commit; moving or correcting a
/// stroke changes its geometry, never the record of what was drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub(crate) id: StrokeId,
    /// Raw input points, in page-local coordinates, as drawn.
    pub points: Vec<Point>,
    /// Paint properties.
    pub paint: StrokePaint,
    /// Current geometry (idealized shape or the freehand polyline).
    pub geometry: StrokeGeometry,
}

impl Stroke {
    /// Create a freehand stroke from an authored point run.
    pub fn freehand(points: Vec<Point>, paint: StrokePaint) -> Self {
        Self {
            id: Uuid::new_v4(),
            geometry: StrokeGeometry::Freehand {
                points: points.clone(),
            },
            points,
            paint,
        }
    }

    /// Create a corrected shape stroke, keeping the authored run.
    pub fn shape(points: Vec<Point>, geometry: StrokeGeometry, paint: StrokePaint) -> Self {
        Self {
            id: Uuid::new_v4(),
            points,
            paint,
            geometry,
        }
    }

    pub fn id(&self) -> StrokeId {
        self.id
    }

    /// Whether this stroke was corrected into a geometric primitive.
    pub fn is_shape(&self) -> bool {
        self.geometry.kind() != ShapeKind::Freehand
    }

    pub fn kind(&self) -> ShapeKind {
        self.geometry.kind()
    }

    pub fn bounds(&self) -> Rect {
        self.geometry.bounds()
    }

    pub fn to_path(&self) -> BezPath {
        self.geometry.to_path()
    }

    /// Check if a page-local point hits this stroke's outline.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let outline = self.geometry.outline(OUTLINE_STEP);
        if outline.len() == 1 {
            return distance(point, outline[0]) <= tolerance + self.paint.width / 2.0;
        }
        distance_to_polyline(point, &outline) <= tolerance + self.paint.width / 2.0
    }

    /// Translate the stroke (geometry and authored run) by a delta.
    pub fn translate(&mut self, delta: Vec2) {
        for p in &mut self.points {
            *p += delta;
        }
        self.geometry.translate(delta);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freehand_bounds() {
        let stroke = Stroke::freehand(
            vec![
                Point::new(0.0, 0.0),
                Point::new(100.0, 50.0),
                Point::new(50.0, 100.0),
            ],
            StrokePaint::default(),
        );
        let bounds = stroke.bounds();
        assert!((bounds.x1 - 100.0).abs() < f64::EPSILON);
        assert!((bounds.y1 - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_circle_outline_closed() {
        let geometry = StrokeGeometry::Circle {
            center: Point::new(0.0, 0.0),
            radius: 10.0,
        };
        let outline = geometry.outline(5.0);
        assert!(outline.len() >= 9);
        let first = outline[0];
        let last = *outline.last().unwrap();
        assert!((first.x - last.x).abs() < 1e-9);
        assert!((first.y - last.y).abs() < 1e-9);
        for p in &outline {
            assert!((distance(Point::ZERO, *p) - 10.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_hit_test_line() {
        let stroke = Stroke::shape(
            vec![Point::new(0.0, 0.0), Point::new(100.0, 0.0)],
            StrokeGeometry::Line {
                start: Point::new(0.0, 0.0),
                end: Point::new(100.0, 0.0),
            },
            StrokePaint::default(),
        );
        assert!(stroke.hit_test(Point::new(50.0, 2.0), 2.0));
        assert!(!stroke.hit_test(Point::new(50.0, 20.0), 2.0));
    }

    #[test]
    fn test_translate_moves_geometry_and_points() {
        let mut stroke = Stroke::freehand(
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0)],
            StrokePaint::default(),
        );
        stroke.translate(Vec2::new(5.0, 7.0));
        assert_eq!(stroke.points[0], Point::new(5.0, 7.0));
        let StrokeGeometry::Freehand { points } = &stroke.geometry else {
            panic!("geometry changed kind");
        };
        assert_eq!(points[1], Point::new(15.0, 7.0));
    }

    #[test]
    fn test_blend_mode_mapping() {
        assert_eq!(
            BlendMode::Multiply.to_peniko(),
            peniko::BlendMode::new(peniko::Mix::Multiply, peniko::Compose::SrcOver)
        );
    }

    #[test]
    fn test_rectangle_bounds_roundtrip() {
        let rect = Rect::new(10.0, 20.0, 110.0, 80.0);
        let geometry = StrokeGeometry::Rectangle { rect };
        assert_eq!(geometry.bounds(), rect);
        assert_eq!(geometry.kind(), ShapeKind::Rectangle);
    }
}
