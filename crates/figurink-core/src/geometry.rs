//! Geometry primitives: rotation, shape centers, visual corners and projections.
//!
//! Everything that needs on-screen positions (binding, snapping, hit testing)
//! must go through [`visual_corners`] rather than reading `Shape::points`,
//! which are pre-rotation.

use crate::shapes::{Category, Curve, Shape, ShapeKind};
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Rect, Vec2};

/// Below this, lengths and areas count as zero.
pub const EPSILON: f64 = 1e-9;

/// Euclidean distance between two points.
pub fn distance(a: Point, b: Point) -> f64 {
    (b - a).hypot()
}

/// Rotate `point` about `center` by `degrees` (positive turns +x towards +y).
pub fn rotate_point(point: Point, center: Point, degrees: f64) -> Point {
    if degrees == 0.0 {
        return point;
    }
    Affine::rotate_about(degrees.to_radians(), center) * point
}

/// Rotate a vector by `degrees`.
pub fn rotate_vec(v: Vec2, degrees: f64) -> Vec2 {
    let (sin, cos) = degrees.to_radians().sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    a.lerp(b, t)
}

/// Project `point` onto segment `a`-`b`.
///
/// Returns the closest point on the closed segment and its parameter `t` in
/// `[0, 1]`. A zero-length segment yields `(a, 0.0)`.
pub fn project_onto_segment(point: Point, a: Point, b: Point) -> (Point, f64) {
    let seg = b - a;
    let len_sq = seg.hypot2();
    if len_sq < EPSILON {
        return (a, 0.0);
    }
    let t = ((point - a).dot(seg) / len_sq).clamp(0.0, 1.0);
    (a + seg * t, t)
}

/// Distance from a point to a line segment.
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    distance(point, project_onto_segment(point, a, b).0)
}

/// Unrotated box of a box-category shape.
///
/// Rectangles, squares, circles and ellipses span their two corners; text and
/// images extend from their anchor by their measured size.
pub fn box_rect(shape: &Shape) -> Option<Rect> {
    match &shape.kind {
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Circle | ShapeKind::Ellipse => {
            match shape.points.as_slice() {
                [p1, p2, ..] => Some(Rect::from_points(*p1, *p2)),
                _ => None,
            }
        }
        ShapeKind::Text(text) => shape
            .points
            .first()
            .map(|anchor| Rect::from_origin_size(*anchor, text.size())),
        ShapeKind::Image(image) => shape
            .points
            .first()
            .map(|anchor| Rect::from_origin_size(*anchor, image.size())),
        ShapeKind::Point
        | ShapeKind::Segment
        | ShapeKind::Polygon
        | ShapeKind::Freehand
        | ShapeKind::Curve(_) => None,
    }
}

/// Mean of a set of points.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let sum = points.iter().fold(Vec2::ZERO, |acc, p| acc + p.to_vec2());
    Some((sum / points.len() as f64).to_point())
}

/// Geometric center of a shape, the pivot of its own rotation.
///
/// Box kinds use their box midpoint, vertex kinds their vertex centroid.
/// Curves return their vertex in math coordinates; map it through a
/// [`Viewport`] for a screen position.
pub fn center(shape: &Shape) -> Point {
    match shape.category() {
        Category::Box => box_rect(shape).map(|r| r.center()).unwrap_or(Point::ZERO),
        Category::Vertex => centroid(&shape.points).unwrap_or(Point::ZERO),
        Category::Curve => match &shape.kind {
            ShapeKind::Curve(curve) => curve.vertex(),
            _ => Point::ZERO,
        },
    }
}

/// On-screen corners of a shape after applying its rotation.
///
/// Vertex kinds return their points rotated about the centroid. Box kinds
/// return the box corners in order top-left, top-right, bottom-right,
/// bottom-left, rotated about the box center. Curves have no corners.
pub fn visual_corners(shape: &Shape) -> Vec<Point> {
    match shape.category() {
        Category::Vertex => {
            let c = center(shape);
            shape
                .points
                .iter()
                .map(|p| rotate_point(*p, c, shape.rotation))
                .collect()
        }
        Category::Box => {
            let Some(rect) = box_rect(shape) else {
                return Vec::new();
            };
            let c = rect.center();
            [
                Point::new(rect.x0, rect.y0),
                Point::new(rect.x1, rect.y0),
                Point::new(rect.x1, rect.y1),
                Point::new(rect.x0, rect.y1),
            ]
            .into_iter()
            .map(|p| rotate_point(p, c, shape.rotation))
            .collect()
        }
        Category::Curve => Vec::new(),
    }
}

/// Number of edges along the visual outline.
///
/// Polygons and boxes are closed; segments have one edge; freehand strokes are
/// open polylines.
pub fn edge_count(shape: &Shape) -> usize {
    match &shape.kind {
        ShapeKind::Point | ShapeKind::Curve(_) => 0,
        ShapeKind::Segment => usize::from(shape.points.len() >= 2),
        ShapeKind::Freehand => shape.points.len().saturating_sub(1),
        ShapeKind::Polygon => shape.points.len(),
        ShapeKind::Rectangle
        | ShapeKind::Square
        | ShapeKind::Circle
        | ShapeKind::Ellipse
        | ShapeKind::Text(_)
        | ShapeKind::Image(_) => 4,
    }
}

/// Visual edge `index`, from corner `index` to corner `index + 1 (mod N)`.
///
/// Returns None when `index` is past the last edge of the shape.
pub fn edge(shape: &Shape, index: usize) -> Option<(Point, Point)> {
    if index >= edge_count(shape) {
        return None;
    }
    let corners = visual_corners(shape);
    let n = corners.len();
    if n < 2 {
        return None;
    }
    Some((corners[index % n], corners[(index + 1) % n]))
}

/// All visual edges of a shape.
pub fn edges(shape: &Shape) -> Vec<(Point, Point)> {
    let corners = visual_corners(shape);
    let n = corners.len();
    if n < 2 {
        return Vec::new();
    }
    (0..edge_count(shape))
        .map(|i| (corners[i % n], corners[(i + 1) % n]))
        .collect()
}

/// Point on the boundary of a circle or ellipse at parametric `angle` (degrees),
/// measured in the shape's own frame and then turned by its rotation.
pub fn ellipse_point(shape: &Shape, angle: f64) -> Option<Point> {
    if !shape.kind.is_round() {
        return None;
    }
    let rect = box_rect(shape)?;
    let c = rect.center();
    let (sin, cos) = angle.to_radians().sin_cos();
    let local = Vec2::new(rect.width() / 2.0 * cos, rect.height() / 2.0 * sin);
    Some(c + rotate_vec(local, shape.rotation))
}

/// Project `point` onto the boundary of a circle or ellipse.
///
/// Returns the boundary point and its parametric angle in degrees. A cursor at
/// the exact center projects to angle 0.
pub fn project_onto_ellipse(shape: &Shape, point: Point) -> Option<(Point, f64)> {
    if !shape.kind.is_round() {
        return None;
    }
    let rect = box_rect(shape)?;
    let (rx, ry) = (rect.width() / 2.0, rect.height() / 2.0);
    if rx < EPSILON || ry < EPSILON {
        return None;
    }
    let local = rotate_vec(point - rect.center(), -shape.rotation);
    let angle = if local.hypot2() < EPSILON {
        0.0
    } else {
        (local.y / ry).atan2(local.x / rx).to_degrees()
    };
    ellipse_point(shape, angle).map(|p| (p, angle))
}

/// Screen position of curve `curve` at input coordinate `x`.
pub fn curve_point(curve: &Curve, x: f64, viewport: &Viewport) -> Point {
    viewport.to_screen(Point::new(x, curve.eval(x)))
}

/// Closest point on `curve` to the screen point `point`, searched within
/// `radius` screen pixels horizontally.
///
/// Returns the screen point and its input coordinate.
pub fn project_onto_curve(
    curve: &Curve,
    point: Point,
    radius: f64,
    viewport: &Viewport,
) -> (Point, f64) {
    const SAMPLES: usize = 64;
    let x0 = viewport.to_math(point).x;
    let span = viewport.length_to_math(radius);
    let dist_at = |x: f64| distance(point, curve_point(curve, x, viewport));

    let step = 2.0 * span / SAMPLES as f64;
    let mut best_x = x0;
    let mut best_dist = dist_at(x0);
    for i in 0..=SAMPLES {
        let x = x0 - span + step * i as f64;
        let d = dist_at(x);
        if d < best_dist {
            best_dist = d;
            best_x = x;
        }
    }

    // Ternary search inside the winning sample cell.
    let (mut lo, mut hi) = (best_x - step, best_x + step);
    for _ in 0..40 {
        let m1 = lo + (hi - lo) / 3.0;
        let m2 = hi - (hi - lo) / 3.0;
        if dist_at(m1) < dist_at(m2) {
            hi = m2;
        } else {
            lo = m1;
        }
    }
    let refined = (lo + hi) / 2.0;
    if dist_at(refined) < best_dist {
        best_x = refined;
    }
    (curve_point(curve, best_x, viewport), best_x)
}

/// Axis-aligned bounds of the visual geometry.
///
/// Curves have no finite extent and report a zero-size rect at their vertex.
pub fn visual_bounds(shape: &Shape) -> Rect {
    let corners = visual_corners(shape);
    let Some(first) = corners.first() else {
        let c = center(shape);
        return Rect::from_points(c, c);
    };
    corners
        .iter()
        .skip(1)
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
}

/// Union of the visual bounds of every shape, None for an empty slice.
pub fn bounds_of(shapes: &[Shape]) -> Option<Rect> {
    shapes
        .iter()
        .filter(|s| s.category() != Category::Curve)
        .map(visual_bounds)
        .reduce(|a, b| a.union(b))
}

/// Check if `point` hits the visual geometry of `shape` within `tolerance`.
pub fn hit_test(shape: &Shape, point: Point, tolerance: f64, viewport: &Viewport) -> bool {
    let reach = tolerance + shape.style.stroke_width / 2.0;
    match &shape.kind {
        ShapeKind::Point => shape
            .points
            .first()
            .is_some_and(|p| distance(*p, point) <= reach),
        ShapeKind::Curve(curve) => {
            let (on_curve, _) = project_onto_curve(curve, point, reach, viewport);
            distance(on_curve, point) <= reach
        }
        ShapeKind::Circle | ShapeKind::Ellipse => {
            if shape.style.is_filled() && contains_in_local_box(shape, point, tolerance, true) {
                return true;
            }
            project_onto_ellipse(shape, point).is_some_and(|(p, _)| distance(p, point) <= reach)
        }
        ShapeKind::Text(_) | ShapeKind::Image(_) => {
            contains_in_local_box(shape, point, tolerance, false)
        }
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Polygon => {
            if shape.style.is_filled() && polygon_contains(&visual_corners(shape), point) {
                return true;
            }
            edges(shape)
                .iter()
                .any(|(a, b)| point_to_segment_dist(point, *a, *b) <= reach)
        }
        ShapeKind::Segment | ShapeKind::Freehand => {
            if shape.points.len() == 1 {
                return distance(shape.points[0], point) <= reach;
            }
            edges(shape)
                .iter()
                .any(|(a, b)| point_to_segment_dist(point, *a, *b) <= reach)
        }
    }
}

/// Check `point` against the unrotated box (or inscribed ellipse) in the shape's local frame.
fn contains_in_local_box(shape: &Shape, point: Point, tolerance: f64, round: bool) -> bool {
    let Some(rect) = box_rect(shape) else {
        return false;
    };
    let local = rotate_point(point, rect.center(), -shape.rotation);
    if round {
        let (rx, ry) = (rect.width() / 2.0 + tolerance, rect.height() / 2.0 + tolerance);
        if rx < EPSILON || ry < EPSILON {
            return false;
        }
        let d = local - rect.center();
        (d.x / rx).powi(2) + (d.y / ry).powi(2) <= 1.0
    } else {
        rect.inflate(tolerance, tolerance).contains(local)
    }
}

/// Even-odd point-in-polygon test.
fn polygon_contains(corners: &[Point], point: Point) -> bool {
    let n = corners.len();
    if n < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (a, b) = (corners[i], corners[j]);
        if (a.y > point.y) != (b.y > point.y)
            && point.x < (b.x - a.x) * (point.y - a.y) / (b.y - a.y) + a.x
        {
            inside = !inside;
        }
        j = i;
    }
    inside
}
