//! Move, rotate and resize operators.
//!
//! Every operator takes the last committed shape and the gesture parameters and
//! returns a new shape; nothing is mutated in place. Which resize strategy
//! applies depends on the shape category:
//!
//! - vertex shapes bake their rotation into the points when a vertex is dragged,
//! - box shapes pin the opposite corner and resize in their local frame,
//! - groups scale every point from the group's bounding box.

use crate::geometry::{self, EPSILON, rotate_point, rotate_vec};
use crate::shapes::{Category, Shape, ShapeKind};
use crate::snap::{ANGLE_SNAP_INCREMENT, snap_angle};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// Smallest width or height a resize can produce.
pub const MIN_SIZE: f64 = 1.0;

/// Corner positions, in visual corner order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomRight,
    BottomLeft,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Index into [`geometry::visual_corners`] for box shapes.
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }

    /// Direction of the corner from the box center, in the unrotated frame.
    fn signs(self) -> Vec2 {
        match self {
            Corner::TopLeft => Vec2::new(-1.0, -1.0),
            Corner::TopRight => Vec2::new(1.0, -1.0),
            Corner::BottomRight => Vec2::new(1.0, 1.0),
            Corner::BottomLeft => Vec2::new(-1.0, 1.0),
        }
    }

    /// The corner of an axis-aligned rect.
    pub(crate) fn of_rect(self, rect: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(rect.x0, rect.y0),
            Corner::TopRight => Point::new(rect.x1, rect.y0),
            Corner::BottomRight => Point::new(rect.x1, rect.y1),
            Corner::BottomLeft => Point::new(rect.x0, rect.y1),
        }
    }
}

/// Which part of a shape a resize gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Handle {
    /// A vertex of a vertex shape, by index into its points.
    Vertex(usize),
    /// A corner of a box shape, or of a vertex shape's bounding box.
    Corner(Corner),
}

/// Handles of a shape with their on-screen positions.
pub fn handles(shape: &Shape) -> Vec<(Handle, Point)> {
    match shape.category() {
        Category::Vertex => geometry::visual_corners(shape)
            .into_iter()
            .enumerate()
            .map(|(i, p)| (Handle::Vertex(i), p))
            .collect(),
        Category::Box => {
            let corners = geometry::visual_corners(shape);
            Corner::ALL
                .iter()
                .filter_map(|c| corners.get(c.index()).map(|p| (Handle::Corner(*c), *p)))
                .collect()
        }
        Category::Curve => Vec::new(),
    }
}

/// Find the handle under `point`, nearest first.
pub fn hit_test_handles(shape: &Shape, point: Point, tolerance: f64) -> Option<Handle> {
    handles(shape)
        .into_iter()
        .map(|(handle, at)| (handle, geometry::distance(at, point)))
        .filter(|(_, d)| *d <= tolerance)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(handle, _)| handle)
}

/// Move a shape by `delta` screen pixels.
///
/// Curves shift their vertex by the delta in math units and re-derive their
/// standard form.
pub fn translate(shape: &Shape, delta: Vec2, viewport: &Viewport) -> Shape {
    match &shape.kind {
        ShapeKind::Curve(curve) => {
            let d = viewport.delta_to_math(delta);
            let mut moved = shape.clone();
            moved.kind = ShapeKind::Curve(curve.shifted(d.x, d.y));
            moved
        }
        _ => shape.translated(delta),
    }
}

/// Rotate a shape by `delta` degrees.
///
/// With a `pivot`, the shape's center orbits the pivot and the whole shape
/// follows; the rotation field still turns the shape about its own center.
/// Curves do not rotate.
pub fn rotate(shape: &Shape, delta: f64, pivot: Option<Point>, snap: bool) -> Shape {
    if shape.category() == Category::Curve {
        return shape.clone();
    }
    let delta = if snap {
        snap_angle(delta, ANGLE_SNAP_INCREMENT)
    } else {
        delta
    };

    let mut rotated = shape.clone();
    rotated.rotation = (shape.rotation + delta).rem_euclid(360.0);
    if let Some(pivot) = pivot {
        let center = geometry::center(shape);
        let orbited = rotate_point(center, pivot, delta);
        rotated = rotated.translated(orbited - center);
    }
    rotated
}

/// Drag vertex `index` of a vertex shape to `cursor`.
///
/// The current rotation is baked into the points first and reset to zero, so
/// the remaining vertices stay exactly where they are on screen.
pub fn drag_vertex(shape: &Shape, index: usize, cursor: Point) -> Shape {
    if shape.category() != Category::Vertex || index >= shape.points.len() {
        return shape.clone();
    }
    let mut dragged = shape.clone();
    dragged.points = geometry::visual_corners(shape);
    dragged.points[index] = cursor;
    dragged.rotation = 0.0;
    dragged
}

/// Resize a box shape by dragging `corner` to `cursor`.
///
/// The opposite corner stays fixed on screen. The cursor offset is measured in
/// the shape's unrotated frame; with `lock_aspect` (always for squares and
/// circles) it keeps the original width/height ratio. Text scales its font by
/// the height ratio instead of stretching.
pub fn resize_box(shape: &Shape, corner: Corner, cursor: Point, lock_aspect: bool) -> Shape {
    let Some(rect) = geometry::box_rect(shape) else {
        return shape.clone();
    };
    let (w, h) = (rect.width(), rect.height());
    let theta = shape.rotation;
    let half = Vec2::new(w / 2.0, h / 2.0);
    let opposite = corner.opposite().signs();
    let pinned =
        rect.center() + rotate_vec(Vec2::new(opposite.x * half.x, opposite.y * half.y), theta);

    let mut local = rotate_vec(cursor - pinned, -theta);
    if (lock_aspect || shape.kind.locks_aspect()) && w > EPSILON && h > EPSILON {
        local = constrain_ratio(local, w / h);
    }
    let target = Vec2::new(local.x.abs().max(MIN_SIZE), local.y.abs().max(MIN_SIZE));

    let mut resized = shape.clone();
    let size = match &shape.kind {
        ShapeKind::Text(text) => {
            let factor = if h > EPSILON { target.y / h } else { 1.0 };
            let scaled = text.scaled(factor);
            let size = scaled.size();
            resized.kind = ShapeKind::Text(scaled);
            Vec2::new(size.width, size.height)
        }
        ShapeKind::Image(image) => {
            let mut image = image.clone();
            image.width = target.x;
            image.height = target.y;
            resized.kind = ShapeKind::Image(image);
            target
        }
        ShapeKind::Rectangle | ShapeKind::Square | ShapeKind::Circle | ShapeKind::Ellipse => target,
        ShapeKind::Point
        | ShapeKind::Segment
        | ShapeKind::Polygon
        | ShapeKind::Freehand
        | ShapeKind::Curve(_) => return shape.clone(),
    };

    // The dragged corner sits at `offset` from the pinned one in the local frame.
    let offset = Vec2::new(size.x.copysign(local.x), size.y.copysign(local.y));
    let center = pinned + rotate_vec(offset / 2.0, theta);
    let half = size / 2.0;
    resized.points = match &resized.kind {
        ShapeKind::Text(_) | ShapeKind::Image(_) => vec![center - half],
        _ => vec![center - half, center + half],
    };
    resized
}

/// Resize a group by dragging `corner` of its bounding box to `cursor`.
///
/// The opposite corner of the group's visual bounds stays fixed and every
/// point is remapped into the new bounds. Vertex shapes bake their rotation
/// first; box shapes keep theirs. Text scales its font by the height ratio,
/// images their size. Curves are left alone.
pub fn resize_group(
    shapes: &[Shape],
    corner: Corner,
    cursor: Point,
    lock_aspect: bool,
) -> Vec<Shape> {
    let Some(bounds) = geometry::bounds_of(shapes) else {
        return shapes.to_vec();
    };
    let (w, h) = (bounds.width(), bounds.height());
    let pinned = corner.opposite().of_rect(bounds);

    let mut offset = cursor - pinned;
    if lock_aspect && w > EPSILON && h > EPSILON {
        offset = constrain_ratio(offset, w / h);
    }
    let size = Vec2::new(offset.x.abs().max(MIN_SIZE), offset.y.abs().max(MIN_SIZE));
    let dragged = pinned + Vec2::new(size.x.copysign(offset.x), size.y.copysign(offset.y));
    let target = Rect::from_points(pinned, dragged);

    let sx = if w > EPSILON { target.width() / w } else { 1.0 };
    let sy = if h > EPSILON { target.height() / h } else { 1.0 };
    let remap = |p: Point| {
        Point::new(
            target.x0 + (p.x - bounds.x0) * sx,
            target.y0 + (p.y - bounds.y0) * sy,
        )
    };

    shapes
        .iter()
        .map(|shape| {
            let mut scaled = shape.clone();
            match &shape.kind {
                ShapeKind::Curve(_) => return scaled,
                ShapeKind::Point
                | ShapeKind::Segment
                | ShapeKind::Polygon
                | ShapeKind::Freehand => {
                    scaled.points =
                        geometry::visual_corners(shape).into_iter().map(remap).collect();
                    scaled.rotation = 0.0;
                }
                ShapeKind::Rectangle
                | ShapeKind::Square
                | ShapeKind::Circle
                | ShapeKind::Ellipse => {
                    scaled.points = shape.points.iter().map(|p| remap(*p)).collect();
                }
                ShapeKind::Text(text) => {
                    scaled.points = shape.points.iter().map(|p| remap(*p)).collect();
                    scaled.kind = ShapeKind::Text(text.scaled(sy));
                }
                ShapeKind::Image(image) => {
                    scaled.points = shape.points.iter().map(|p| remap(*p)).collect();
                    let mut image = image.clone();
                    image.width *= sx;
                    image.height *= sy;
                    scaled.kind = ShapeKind::Image(image);
                }
            }
            scaled
        })
        .collect()
}

/// Resize a single shape through whichever strategy fits the handle and category.
pub fn resize(shape: &Shape, handle: Handle, cursor: Point, lock_aspect: bool) -> Shape {
    match (handle, shape.category()) {
        (Handle::Vertex(index), Category::Vertex) => drag_vertex(shape, index, cursor),
        (Handle::Corner(corner), Category::Box) => resize_box(shape, corner, cursor, lock_aspect),
        (Handle::Corner(corner), Category::Vertex) => {
            resize_group(std::slice::from_ref(shape), corner, cursor, lock_aspect)
                .into_iter()
                .next()
                .unwrap_or_else(|| shape.clone())
        }
        (Handle::Vertex(_), Category::Box | Category::Curve)
        | (Handle::Corner(_), Category::Curve) => shape.clone(),
    }
}

/// Stretch `offset` so its |x|/|y| matches `ratio`, following the dominant axis.
fn constrain_ratio(offset: Vec2, ratio: f64) -> Vec2 {
    let (ax, ay) = (offset.x.abs(), offset.y.abs());
    let (nx, ny) = if ax / ratio >= ay {
        (ax, ax / ratio)
    } else {
        (ay * ratio, ay)
    };
    Vec2::new(nx.copysign(offset.x), ny.copysign(offset.y))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;
    use crate::shapes::{Curve, CurveDegree, ImageContent, TextContent};

    fn assert_close(a: Point, b: Point) {
        assert!(distance(a, b) < 1e-9, "{a:?} != {b:?}");
    }

    #[test]
    fn test_translate_points() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let moved = translate(&rect, Vec2::new(5.0, -3.0), &Viewport::default());
        assert_eq!(moved.points, vec![Point::new(5.0, -3.0), Point::new(15.0, 7.0)]);
        assert_eq!(moved.id, rect.id);
    }

    #[test]
    fn test_translate_curve_shifts_vertex() {
        let viewport = Viewport::new(Point::ZERO, 20.0);
        let curve = Shape::curve(Curve::new(CurveDegree::Quadratic, 1.0, 0.0, 0.0));
        let moved = translate(&curve, Vec2::new(40.0, -20.0), &viewport);
        let ShapeKind::Curve(c) = &moved.kind else {
            panic!("curve expected");
        };
        assert!((c.h - 2.0).abs() < 1e-12);
        assert!((c.k - 1.0).abs() < 1e-12);
        // (x - 2)^2 + 1 = x^2 - 4x + 5
        assert_eq!(c.coefficients, vec![5.0, -4.0, 1.0]);
        assert!(moved.points.is_empty());
    }

    #[test]
    fn test_rotate_about_own_center() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(20.0, 10.0));
        let rotated = rotate(&rect, 30.0, None, false);
        assert_eq!(rotated.points, rect.points);
        assert!((rotated.rotation - 30.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotate_about_external_pivot() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(20.0, 10.0));
        let pivot = Point::new(0.0, 0.0);
        let rotated = rotate(&rect, 90.0, Some(pivot), false);
        assert!((rotated.rotation - 90.0).abs() < 1e-12);
        let before = geometry::visual_corners(&rect);
        let after = geometry::visual_corners(&rotated);
        for (b, a) in before.iter().zip(&after) {
            assert_close(*a, rotate_point(*b, pivot, 90.0));
        }
    }

    #[test]
    fn test_rotate_snaps_delta() {
        let rect = Shape::rectangle(Point::ZERO, Point::new(1.0, 1.0)).with_rotation(10.0);
        assert!((rotate(&rect, 22.0, None, true).rotation - 25.0).abs() < 1e-12);
        assert!((rotate(&rect, 23.0, None, true).rotation - 40.0).abs() < 1e-12);
        assert!((rotate(&rect, -20.0, None, false).rotation - 350.0).abs() < 1e-12);
    }

    #[test]
    fn test_curves_do_not_rotate() {
        let curve = Shape::curve(Curve::new(CurveDegree::Cubic, 1.0, 0.0, 0.0));
        assert_eq!(rotate(&curve, 45.0, Some(Point::new(3.0, 3.0)), false), curve);
    }

    #[test]
    fn test_drag_vertex_bakes_rotation() {
        let tri = Shape::polygon(vec![Point::ZERO, Point::new(90.0, 0.0), Point::new(0.0, 90.0)])
            .with_rotation(90.0);
        let before = geometry::visual_corners(&tri);
        let cursor = Point::new(123.0, 45.0);
        let dragged = drag_vertex(&tri, 1, cursor);
        assert_eq!(dragged.rotation, 0.0);
        assert_eq!(dragged.points[1], cursor);
        assert_close(dragged.points[0], before[0]);
        assert_close(dragged.points[2], before[2]);
    }

    #[test]
    fn test_drag_vertex_ignores_boxes_and_bad_index() {
        let rect = Shape::rectangle(Point::ZERO, Point::new(10.0, 10.0));
        assert_eq!(drag_vertex(&rect, 0, Point::new(5.0, 5.0)), rect);
        let seg = Shape::segment(Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(drag_vertex(&seg, 2, Point::new(5.0, 5.0)), seg);
    }

    #[test]
    fn test_resize_box_unrotated() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let resized = resize_box(&rect, Corner::BottomRight, Point::new(150.0, 80.0), false);
        assert_eq!(resized.points, vec![Point::new(0.0, 0.0), Point::new(150.0, 80.0)]);
    }

    #[test]
    fn test_resize_box_rotated_pins_opposite_corner() {
        let rect = Shape::rectangle(Point::new(100.0, 100.0), Point::new(300.0, 200.0)).with_rotation(90.0);
        let pinned = geometry::visual_corners(&rect)[2];
        let cursor = Point::new(270.0, 30.0);
        let resized = resize_box(&rect, Corner::TopLeft, cursor, false);
        let corners = geometry::visual_corners(&resized);
        assert_close(corners[2], pinned);
        assert_close(corners[0], cursor);
        assert!((resized.rotation - 90.0).abs() < 1e-12);
        let r = geometry::box_rect(&resized).unwrap();
        assert!((r.width() - 220.0).abs() < 1e-9);
        assert!((r.height() - 120.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_square_locks_aspect() {
        let square = Shape::square(Point::new(0.0, 0.0), Point::new(100.0, 100.0));
        let resized = resize_box(&square, Corner::BottomRight, Point::new(150.0, 120.0), false);
        assert_eq!(resized.points, vec![Point::new(0.0, 0.0), Point::new(150.0, 150.0)]);
    }

    #[test]
    fn test_resize_lock_with_zero_height_is_unconstrained() {
        let flat = Shape::rectangle(Point::new(0.0, 0.0), Point::new(100.0, 0.0));
        let resized = resize_box(&flat, Corner::BottomRight, Point::new(50.0, 30.0), true);
        assert_eq!(resized.points, vec![Point::new(0.0, 0.0), Point::new(50.0, 30.0)]);
    }

    #[test]
    fn test_resize_box_minimum_size() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let resized = resize_box(&rect, Corner::BottomRight, Point::new(0.2, 0.3), false);
        assert_eq!(resized.points, vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0)]);
    }

    #[test]
    fn test_resize_text_scales_font() {
        let text = Shape::text(Point::ZERO, TextContent::new("abcd"));
        // Estimated size is 48 x 24 at the default font size.
        let resized = resize_box(&text, Corner::BottomRight, Point::new(70.0, 48.0), false);
        let ShapeKind::Text(content) = &resized.kind else {
            panic!("text expected");
        };
        assert!((content.font_size - 40.0).abs() < 1e-9);
        assert_close(resized.points[0], Point::ZERO);
    }

    #[test]
    fn test_resize_image() {
        let image = Shape::image(Point::new(10.0, 10.0), ImageContent::new(40.0, 20.0));
        let resized = resize_box(&image, Corner::TopLeft, Point::new(0.0, 5.0), false);
        let ShapeKind::Image(content) = &resized.kind else {
            panic!("image expected");
        };
        assert!((content.width - 50.0).abs() < 1e-9);
        assert!((content.height - 25.0).abs() < 1e-9);
        assert_close(resized.points[0], Point::new(0.0, 5.0));
    }

    #[test]
    fn test_resize_group() {
        let a = Shape::rectangle(Point::new(0.0, 0.0), Point::new(10.0, 10.0));
        let b = Shape::rectangle(Point::new(20.0, 20.0), Point::new(30.0, 30.0));
        let curve = Shape::curve(Curve::new(CurveDegree::Linear, 1.0, 0.0, 0.0));
        let resized = resize_group(&[a, b, curve.clone()], Corner::BottomRight, Point::new(60.0, 90.0), false);
        assert_eq!(resized[0].points, vec![Point::new(0.0, 0.0), Point::new(20.0, 30.0)]);
        assert_eq!(resized[1].points, vec![Point::new(40.0, 60.0), Point::new(60.0, 90.0)]);
        assert_eq!(resized[2], curve);
    }

    #[test]
    fn test_resize_group_text_and_aspect_lock() {
        let seg = Shape::segment(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let text = Shape::text(Point::new(0.0, 0.0), TextContent::new("a"));
        let resized = resize_group(&[seg, text], Corner::BottomRight, Point::new(200.0, 60.0), true);
        assert_eq!(resized[0].points, vec![Point::new(0.0, 0.0), Point::new(200.0, 100.0)]);
        let ShapeKind::Text(content) = &resized[1].kind else {
            panic!("text expected");
        };
        assert!((content.font_size - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_resize_dispatch() {
        let rect = Shape::rectangle(Point::ZERO, Point::new(10.0, 10.0));
        assert_eq!(resize(&rect, Handle::Vertex(0), Point::new(50.0, 50.0), false), rect);

        let tri = Shape::polygon(vec![Point::ZERO, Point::new(10.0, 0.0), Point::new(0.0, 10.0)]);
        let scaled = resize(&tri, Handle::Corner(Corner::BottomRight), Point::new(20.0, 20.0), false);
        assert_eq!(
            scaled.points,
            vec![Point::ZERO, Point::new(20.0, 0.0), Point::new(0.0, 20.0)]
        );
        let moved = resize(&tri, Handle::Vertex(2), Point::new(0.0, 30.0), false);
        assert_eq!(moved.points[2], Point::new(0.0, 30.0));
    }

    #[test]
    fn test_hit_test_handles() {
        let rect = Shape::rectangle(Point::ZERO, Point::new(100.0, 50.0));
        assert_eq!(
            hit_test_handles(&rect, Point::new(98.0, 52.0), 5.0),
            Some(Handle::Corner(Corner::BottomRight))
        );
        assert_eq!(hit_test_handles(&rect, Point::new(50.0, 25.0), 5.0), None);
        let seg = Shape::segment(Point::ZERO, Point::new(10.0, 0.0));
        assert_eq!(hit_test_handles(&seg, Point::new(9.0, 1.0), 3.0), Some(Handle::Vertex(1)));
    }
}
