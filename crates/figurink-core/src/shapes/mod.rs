//! Shape records for the figure editor.

mod binding;
mod curve;
mod style;
mod text;

pub use binding::{Binding, PathParam};
pub use curve::{Curve, CurveDegree};
pub use style::{SerializableColor, ShapeStyle, StrokeStyle};
pub use text::{ImageContent, TextContent};

use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Coarse grouping of shape kinds, deciding which transform strategy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Shapes defined by their vertices (point, segment, polygon, freehand).
    Vertex,
    /// Axis-aligned boxes around their own center: rectangle, square, circle,
    /// ellipse, text and image.
    Box,
    /// Analytic curves defined by coefficients.
    Curve,
}

/// What a shape is. Category payloads live on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShapeKind {
    Point,
    Segment,
    Polygon,
    Rectangle,
    Square,
    Circle,
    Ellipse,
    Text(TextContent),
    Image(ImageContent),
    Freehand,
    Curve(Curve),
}

impl ShapeKind {
    pub fn category(&self) -> Category {
        match self {
            ShapeKind::Point | ShapeKind::Segment | ShapeKind::Polygon | ShapeKind::Freehand => {
                Category::Vertex
            }
            ShapeKind::Rectangle
            | ShapeKind::Square
            | ShapeKind::Circle
            | ShapeKind::Ellipse
            | ShapeKind::Text(_)
            | ShapeKind::Image(_) => Category::Box,
            ShapeKind::Curve(_) => Category::Curve,
        }
    }

    /// Kinds that always keep their width/height ratio when resized.
    pub fn locks_aspect(&self) -> bool {
        matches!(self, ShapeKind::Square | ShapeKind::Circle)
    }

    /// Kinds whose boundary is an ellipse inscribed in the box.
    pub fn is_round(&self) -> bool {
        matches!(self, ShapeKind::Circle | ShapeKind::Ellipse)
    }

    /// Short lowercase name, used in log and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Point => "point",
            ShapeKind::Segment => "segment",
            ShapeKind::Polygon => "polygon",
            ShapeKind::Rectangle => "rectangle",
            ShapeKind::Square => "square",
            ShapeKind::Circle => "circle",
            ShapeKind::Ellipse => "ellipse",
            ShapeKind::Text(_) => "text",
            ShapeKind::Image(_) => "image",
            ShapeKind::Freehand => "freehand",
            ShapeKind::Curve(_) => "curve",
        }
    }

    /// Check whether `count` defining points are valid for this kind.
    fn accepts_point_count(&self, count: usize) -> bool {
        match self {
            ShapeKind::Point | ShapeKind::Text(_) | ShapeKind::Image(_) => count == 1,
            ShapeKind::Segment => count == 2,
            ShapeKind::Polygon => count >= 3,
            ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Circle | ShapeKind::Ellipse => {
                count == 2
            }
            ShapeKind::Freehand => count >= 1,
            ShapeKind::Curve(_) => count == 0,
        }
    }
}

/// Errors for malformed shape records.
#[derive(Debug, Error, PartialEq)]
pub enum ShapeError {
    #[error("{kind} shape {id} has {count} defining points")]
    PointCount {
        id: ShapeId,
        kind: &'static str,
        count: usize,
    },
    #[error("shape {0} has a non-finite coordinate")]
    NonFinite(ShapeId),
    #[error("shape {0} is bound to itself")]
    SelfBinding(ShapeId),
    #[error("shape {id} is bound to missing parent {parent}")]
    DanglingParent { id: ShapeId, parent: ShapeId },
    #[error("shape {id} has edge parameter {t} outside [0, 1]")]
    EdgeParameter { id: ShapeId, t: f64 },
}

/// An identified geometric figure.
///
/// `points` are always pre-rotation; `rotation` (degrees) turns the shape about
/// its own geometric center. Consumers that need on-screen positions go through
/// [`crate::geometry::visual_corners`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub kind: ShapeKind,
    #[serde(default)]
    pub points: Vec<Point>,
    /// Rotation in degrees about the shape's own center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(default)]
    pub style: ShapeStyle,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding: Option<Binding>,
}

impl Shape {
    /// Create a shape of any kind from its defining points.
    pub fn new(kind: ShapeKind, points: Vec<Point>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            points,
            rotation: 0.0,
            style: ShapeStyle::default(),
            binding: None,
        }
    }

    pub fn point(at: Point) -> Self {
        Self::new(ShapeKind::Point, vec![at])
    }

    pub fn segment(start: Point, end: Point) -> Self {
        Self::new(ShapeKind::Segment, vec![start, end])
    }

    pub fn polygon(vertices: Vec<Point>) -> Self {
        Self::new(ShapeKind::Polygon, vertices)
    }

    /// Create a rectangle from two opposite corners.
    pub fn rectangle(p1: Point, p2: Point) -> Self {
        Self::new(ShapeKind::Rectangle, vec![p1, p2])
    }

    /// Create a square with `p1` as one corner, growing towards `p2` by the larger side.
    pub fn square(p1: Point, p2: Point) -> Self {
        let side = (p2.x - p1.x).abs().max((p2.y - p1.y).abs());
        let corner = Point::new(
            p1.x + side.copysign(p2.x - p1.x),
            p1.y + side.copysign(p2.y - p1.y),
        );
        Self::new(ShapeKind::Square, vec![p1, corner])
    }

    pub fn circle(center: Point, radius: f64) -> Self {
        let r = Vec2::new(radius, radius);
        Self::new(ShapeKind::Circle, vec![center - r, center + r])
    }

    /// Create an ellipse inscribed in the box spanned by two opposite corners.
    pub fn ellipse(p1: Point, p2: Point) -> Self {
        Self::new(ShapeKind::Ellipse, vec![p1, p2])
    }

    pub fn text(anchor: Point, content: TextContent) -> Self {
        Self::new(ShapeKind::Text(content), vec![anchor])
    }

    pub fn image(anchor: Point, content: ImageContent) -> Self {
        Self::new(ShapeKind::Image(content), vec![anchor])
    }

    pub fn freehand(points: Vec<Point>) -> Self {
        Self::new(ShapeKind::Freehand, points)
    }

    pub fn curve(curve: Curve) -> Self {
        Self::new(ShapeKind::Curve(curve), Vec::new())
    }

    pub fn with_rotation(mut self, degrees: f64) -> Self {
        self.rotation = degrees;
        self
    }

    pub fn with_binding(mut self, binding: Binding) -> Self {
        self.binding = Some(binding);
        self
    }

    pub fn category(&self) -> Category {
        self.kind.category()
    }

    /// Copy of this shape with every defining point translated by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        let mut shape = self.clone();
        for p in &mut shape.points {
            *p += delta;
        }
        shape
    }

    /// Check the record for structural problems that do not depend on other shapes.
    pub fn validate(&self) -> Result<(), ShapeError> {
        if !self.kind.accepts_point_count(self.points.len()) {
            return Err(ShapeError::PointCount {
                id: self.id,
                kind: self.kind.name(),
                count: self.points.len(),
            });
        }
        let finite = self.points.iter().all(|p| p.is_finite()) && self.rotation.is_finite();
        if !finite {
            return Err(ShapeError::NonFinite(self.id));
        }
        if let Some(binding) = &self.binding {
            if binding.names(self.id) {
                return Err(ShapeError::SelfBinding(self.id));
            }
            if let Binding::OnEdge { t, .. } = binding {
                if !(0.0..=1.0).contains(t) {
                    return Err(ShapeError::EdgeParameter { id: self.id, t: *t });
                }
            }
        }
        Ok(())
    }
}
