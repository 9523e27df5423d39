//! Freehand stroke recognition.
//!
//! Turns a rough stroke into a canonical shape when the match is clear, and
//! returns None otherwise so the caller keeps the raw stroke.

use crate::geometry::{self, EPSILON, distance};
use crate::shapes::{Shape, ShapeKind};
use kurbo::{Point, Rect, Vec2};

/// Strokes with fewer points are never classified.
pub const MIN_POINTS: usize = 10;
/// Simplification tolerance for the straight-line test.
pub const LINE_TOLERANCE: f64 = 20.0;
/// Ends at least this fraction of the bounding diagonal apart may form a line.
pub const LINE_END_RATIO: f64 = 0.5;
/// Ends within this fraction of the path length close the loop.
pub const CLOSED_END_RATIO: f64 = 0.2;
/// Lower bound and diagonal fraction of the corner-finding tolerance.
pub const CORNER_TOLERANCE_MIN: f64 = 10.0;
pub const CORNER_TOLERANCE_RATIO: f64 = 0.04;
/// A box counts as square when width/height is within this distance of 1.
pub const SQUARE_RATIO_TOLERANCE: f64 = 0.15;
/// Largest coefficient of variation of the radius that still reads as a circle.
pub const CIRCLE_MAX_CV: f64 = 0.22;

/// A classified stroke: the canonical kind and its defining points.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognized {
    pub kind: ShapeKind,
    pub points: Vec<Point>,
}

impl Recognized {
    pub fn into_shape(self) -> Shape {
        Shape::new(self.kind, self.points)
    }
}

/// Classify a freehand stroke.
///
/// Corner counting runs before the circle test; otherwise noisy rectangles
/// read as circles.
pub fn classify(points: &[Point]) -> Option<Recognized> {
    if points.len() < MIN_POINTS {
        return None;
    }
    let bounds = bounding_rect(points)?;
    let diagonal = bounds.width().hypot(bounds.height());
    if diagonal < EPSILON {
        return None;
    }
    let (first, last) = (*points.first()?, *points.last()?);
    let end_gap = distance(first, last);
    let length: f64 = points.windows(2).map(|w| distance(w[0], w[1])).sum();

    if end_gap >= diagonal * LINE_END_RATIO && rdp_simplify(points, LINE_TOLERANCE).len() <= 3 {
        log::debug!("Stroke of {} points recognized as segment", points.len());
        return Some(Recognized {
            kind: ShapeKind::Segment,
            points: vec![first, last],
        });
    }

    if end_gap > length * CLOSED_END_RATIO {
        return None;
    }

    let tolerance = CORNER_TOLERANCE_MIN.max(diagonal * CORNER_TOLERANCE_RATIO);
    let mut corners = rdp_simplify(points, tolerance);
    let closing = corners
        .first()
        .zip(corners.last())
        .is_some_and(|(a, b)| distance(*a, *b) <= tolerance);
    if closing && corners.len() > 1 {
        corners.pop();
    }

    let count = corners.len();
    let recognized = match count {
        3 => Recognized {
            kind: ShapeKind::Polygon,
            points: corners,
        },
        4 | 5 => {
            let ratio = bounds.width() / bounds.height().max(EPSILON);
            let kind = if (ratio - 1.0).abs() <= SQUARE_RATIO_TOLERANCE {
                ShapeKind::Square
            } else {
                ShapeKind::Rectangle
            };
            Recognized {
                kind,
                points: vec![Point::new(bounds.x0, bounds.y0), Point::new(bounds.x1, bounds.y1)],
            }
        }
        _ => circle_fit(points)?,
    };
    log::debug!("Closed stroke with {count} corners recognized as {}", recognized.kind.name());
    Some(recognized)
}

/// Circle around the centroid with the mean radius, if the radii are even enough.
fn circle_fit(points: &[Point]) -> Option<Recognized> {
    let center = geometry::centroid(points)?;
    let radii: Vec<f64> = points.iter().map(|p| distance(*p, center)).collect();
    let n = radii.len() as f64;
    let mean = radii.iter().sum::<f64>() / n;
    if mean < EPSILON {
        return None;
    }
    let variance = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let cv = variance.sqrt() / mean;
    if cv >= CIRCLE_MAX_CV {
        log::debug!("Closed stroke rejected as circle (cv {cv:.3})");
        return None;
    }
    let r = Vec2::new(mean, mean);
    Some(Recognized {
        kind: ShapeKind::Circle,
        points: vec![center - r, center + r],
    })
}

fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    Some(
        points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
    )
}

/// Ramer-Douglas-Peucker line simplification.
fn rdp_simplify(points: &[Point], tolerance: f64) -> Vec<Point> {
    if points.len() < 3 {
        return points.to_vec();
    }

    let first = points[0];
    let last = points[points.len() - 1];

    let mut max_dist = 0.0;
    let mut max_index = 0;
    for (i, point) in points.iter().enumerate().skip(1).take(points.len() - 2) {
        let dist = perpendicular_distance(*point, first, last);
        if dist > max_dist {
            max_dist = dist;
            max_index = i;
        }
    }

    if max_dist > tolerance {
        let mut left = rdp_simplify(&points[..=max_index], tolerance);
        let right = rdp_simplify(&points[max_index..], tolerance);
        // Junction point appears in both halves.
        left.pop();
        left.extend(right);
        left
    } else {
        vec![first, last]
    }
}

/// Distance from `point` to the infinite line through `a` and `b`, or to `a`
/// when the line is degenerate (as for a closed loop).
fn perpendicular_distance(point: Point, a: Point, b: Point) -> f64 {
    let d = b - a;
    let len_sq = d.hypot2();
    if len_sq < EPSILON {
        return distance(point, a);
    }
    (point - a).cross(d).abs() / len_sq.sqrt()
}
