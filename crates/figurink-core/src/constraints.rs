//! Constraint graph resolution.
//!
//! Dependents name their parents by id. Whenever a shape changes, every shape
//! bound to it is recomputed from the parent's current visual geometry, and
//! the change ripples on through the dependents of the dependents.

use crate::geometry::{self, EPSILON};
use crate::shapes::{Binding, PathParam, Shape, ShapeId, ShapeKind};
use crate::snap::EDGE_SNAP_THRESHOLD;
use crate::transform;
use crate::viewport::Viewport;
use kurbo::Point;
use std::collections::{HashSet, VecDeque};

/// Maximum propagation depth. Deeper chains point at a cyclic or malformed graph.
pub const MAX_RESOLVE_DEPTH: usize = 15;

/// Projection of a cursor onto one visual edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeProjection {
    pub point: Point,
    /// Position along the edge, in `[0, 1]`.
    pub t: f64,
}

/// Recompute every shape that depends, directly or transitively, on `changed`.
///
/// Returns a new collection; `shapes` is left untouched. Dependents whose parent
/// is missing stay as they are. If the chain runs deeper than
/// [`MAX_RESOLVE_DEPTH`], resolution stops and the shapes computed so far are
/// returned.
pub fn resolve(shapes: &[Shape], changed: ShapeId, viewport: &Viewport) -> Vec<Shape> {
    let mut resolved = shapes.to_vec();
    resolve_from(&mut resolved, changed, viewport, 0);
    resolved
}

/// Run [`resolve`] for each changed id in order.
pub fn resolve_all(shapes: &[Shape], changed: &[ShapeId], viewport: &Viewport) -> Vec<Shape> {
    let mut resolved = shapes.to_vec();
    for id in changed {
        if !resolve_from(&mut resolved, *id, viewport, 0) {
            break;
        }
    }
    resolved
}

/// Returns false once the depth bound has been hit, so callers stop as well.
fn resolve_from(shapes: &mut [Shape], changed: ShapeId, viewport: &Viewport, depth: usize) -> bool {
    if depth > MAX_RESOLVE_DEPTH {
        log::warn!(
            "Constraint resolution exceeded depth {MAX_RESOLVE_DEPTH} at shape {changed}, stopping"
        );
        return false;
    }

    let dependents: Vec<usize> = shapes
        .iter()
        .enumerate()
        .filter(|(_, s)| s.binding.as_ref().is_some_and(|b| b.names(changed)))
        .map(|(i, _)| i)
        .collect();

    for index in dependents {
        let Some(updated) = recompute(&shapes[index], shapes, viewport) else {
            continue;
        };
        if updated == shapes[index] {
            continue;
        }
        let id = updated.id;
        log::debug!("Resolved {} {id} from {changed} (depth {depth})", updated.kind.name());
        shapes[index] = updated;
        if !resolve_from(shapes, id, viewport, depth + 1) {
            return false;
        }
    }
    true
}

/// Recompute a dependent from its binding, or None if it cannot be placed.
fn recompute(dependent: &Shape, shapes: &[Shape], viewport: &Viewport) -> Option<Shape> {
    let binding = dependent.binding.as_ref()?;
    match binding {
        Binding::OnEdge { .. } | Binding::OnPath { .. } => {
            let target = bound_position(binding, shapes, viewport)?;
            Some(place(dependent, target, viewport))
        }
        Binding::PointsLink { parents } => link_points(dependent, parents, shapes),
    }
}

/// Position a single-parent binding currently stands for.
pub fn bound_position(binding: &Binding, shapes: &[Shape], viewport: &Viewport) -> Option<Point> {
    match binding {
        Binding::OnEdge { parent, edge, t } => {
            let parent = find(shapes, *parent)?;
            let (a, b) = geometry::edge(parent, *edge)?;
            Some(geometry::lerp(a, b, t.clamp(0.0, 1.0)))
        }
        Binding::OnPath { parent, param } => {
            let parent = find(shapes, *parent)?;
            match (param, &parent.kind) {
                (PathParam::Angle(angle), ShapeKind::Circle | ShapeKind::Ellipse) => {
                    geometry::ellipse_point(parent, *angle)
                }
                (PathParam::X(x), ShapeKind::Curve(curve)) => {
                    Some(geometry::curve_point(curve, *x, viewport))
                }
                _ => None,
            }
        }
        Binding::PointsLink { .. } => None,
    }
}

/// Move a dependent so it stands at `target`: points directly, anything else by its center.
fn place(dependent: &Shape, target: Point, viewport: &Viewport) -> Shape {
    match &dependent.kind {
        ShapeKind::Point => {
            let mut shape = dependent.clone();
            shape.points = vec![target];
            shape
        }
        _ => {
            let delta = target - placement(dependent, viewport);
            transform::translate(dependent, delta, viewport)
        }
    }
}

/// Screen position [`place`] moves onto the bound position: curves by their vertex.
fn placement(shape: &Shape, viewport: &Viewport) -> Point {
    match &shape.kind {
        ShapeKind::Curve(curve) => viewport.to_screen(curve.vertex()),
        _ => geometry::center(shape),
    }
}

/// Re-anchor a bound shape that was itself dragged, rotated or resized.
///
/// Edge and path bindings take the parameter of the parent boundary point
/// nearest to where the shape ended up, and the shape is placed there, so a
/// bound point never leaves its parent. A points link pulls its linked slots
/// back onto their points. Without a usable parent the shape is returned as is.
pub fn rebind(shape: &Shape, shapes: &[Shape], viewport: &Viewport) -> Shape {
    let Some(binding) = &shape.binding else {
        return shape.clone();
    };
    let at = placement(shape, viewport);
    let rebound = match binding {
        Binding::OnEdge { parent, edge, .. } => find(shapes, *parent).map(|p| {
            let EdgeProjection { t, .. } = constrain_point_to_edge(at, p, *edge);
            Binding::OnEdge {
                parent: *parent,
                edge: *edge,
                t,
            }
        }),
        Binding::OnPath { parent, param } => find(shapes, *parent)
            .and_then(|p| reproject(p, *param, at, viewport))
            .map(|param| Binding::OnPath {
                parent: *parent,
                param,
            }),
        Binding::PointsLink { parents } => {
            return link_points(shape, parents, shapes).unwrap_or_else(|| shape.clone());
        }
    };
    let Some(rebound) = rebound else {
        return shape.clone();
    };
    let Some(target) = bound_position(&rebound, shapes, viewport) else {
        return shape.clone();
    };
    let mut placed = place(shape, target, viewport);
    placed.binding = Some(rebound);
    placed
}

/// Path parameter of the point on `parent` nearest to `at`, in the form `param` uses.
fn reproject(
    parent: &Shape,
    param: PathParam,
    at: Point,
    viewport: &Viewport,
) -> Option<PathParam> {
    match (param, &parent.kind) {
        (PathParam::Angle(_), ShapeKind::Circle | ShapeKind::Ellipse) => {
            geometry::project_onto_ellipse(parent, at).map(|(_, angle)| PathParam::Angle(angle))
        }
        (PathParam::X(_), ShapeKind::Curve(curve)) => {
            let (_, x) = geometry::project_onto_curve(curve, at, EDGE_SNAP_THRESHOLD, viewport);
            Some(PathParam::X(x))
        }
        _ => None,
    }
}

/// Copy linked endpoints into their slots, baking any rotation first.
fn link_points(
    dependent: &Shape,
    parents: &[Option<ShapeId>; 2],
    shapes: &[Shape],
) -> Option<Shape> {
    let linked: Vec<(usize, Point)> = parents
        .iter()
        .enumerate()
        .filter_map(|(slot, parent)| {
            let parent = find(shapes, (*parent)?)?;
            let at = match parent.kind {
                ShapeKind::Point => geometry::visual_corners(parent).first().copied()?,
                _ => geometry::center(parent),
            };
            Some((slot, at))
        })
        .collect();
    if linked.is_empty() {
        return None;
    }

    let mut shape = dependent.clone();
    shape.points = geometry::visual_corners(dependent);
    shape.rotation = 0.0;
    for (slot, at) in linked {
        if let Some(p) = shape.points.get_mut(slot) {
            *p = at;
        }
    }
    Some(shape)
}

fn find(shapes: &[Shape], id: ShapeId) -> Option<&Shape> {
    shapes.iter().find(|s| s.id == id)
}

/// Project `cursor` onto visual edge `edge` of `parent`.
///
/// A missing edge or a zero-length edge yields the cursor itself with `t = 0`.
pub fn constrain_point_to_edge(cursor: Point, parent: &Shape, edge: usize) -> EdgeProjection {
    let unconstrained = EdgeProjection { point: cursor, t: 0.0 };
    let Some((a, b)) = geometry::edge(parent, edge) else {
        return unconstrained;
    };
    if (b - a).hypot2() < EPSILON {
        return unconstrained;
    }
    let (point, t) = geometry::project_onto_segment(cursor, a, b);
    EdgeProjection { point, t }
}

/// Every shape that transitively depends on any of `roots`, in breadth-first order.
///
/// The roots themselves are never part of the result, and each shape appears once.
pub fn get_dependents(shapes: &[Shape], roots: &[ShapeId]) -> Vec<Shape> {
    let mut visited: HashSet<ShapeId> = roots.iter().copied().collect();
    let mut queue: VecDeque<ShapeId> = roots.iter().copied().collect();
    let mut dependents = Vec::new();

    while let Some(id) = queue.pop_front() {
        for shape in shapes {
            let bound = shape.binding.as_ref().is_some_and(|b| b.names(id));
            if bound && visited.insert(shape.id) {
                queue.push_back(shape.id);
                dependents.push(shape.clone());
            }
        }
    }
    dependents
}

/// Delete `ids` and detach every binding that named one of them.
///
/// Detached dependents keep their current geometry. A points link only frees
/// the slots of the removed parents.
pub fn remove_shapes(shapes: &[Shape], ids: &[ShapeId]) -> Vec<Shape> {
    shapes
        .iter()
        .filter(|s| !ids.contains(&s.id))
        .map(|s| {
            let mut shape = s.clone();
            if let Some(binding) = &s.binding {
                let kept = ids
                    .iter()
                    .try_fold(binding.clone(), |b, id| b.without_parent(*id));
                if kept.is_none() {
                    log::debug!("Detached {} {} from removed parent", s.kind.name(), s.id);
                }
                shape.binding = kept;
            }
            shape
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::distance;
    use crate::shapes::{Curve, CurveDegree};
    use kurbo::Vec2;

    fn triangle() -> Shape {
        Shape::polygon(vec![Point::ZERO, Point::new(100.0, 0.0), Point::new(0.0, 100.0)])
    }

    fn replace(shapes: &mut [Shape], shape: Shape) {
        if let Some(slot) = shapes.iter_mut().find(|s| s.id == shape.id) {
            *slot = shape;
        }
    }

    fn by_id(shapes: &[Shape], id: ShapeId) -> &Shape {
        shapes.iter().find(|s| s.id == id).unwrap()
    }

    #[test]
    fn test_triangle_translate_scenario() {
        let tri = triangle();
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let mut shapes = vec![tri.clone(), marker.clone()];

        replace(&mut shapes, tri.translated(Vec2::new(10.0, 10.0)));
        let resolved = resolve(&shapes, tri.id, &Viewport::default());
        assert_eq!(by_id(&resolved, marker.id).points, vec![Point::new(60.0, 10.0)]);
    }

    #[test]
    fn test_rotated_rectangle_edge_midpoint() {
        let rect = Shape::rectangle(Point::new(100.0, 100.0), Point::new(300.0, 200.0));
        let marker = Shape::point(Point::new(200.0, 100.0))
            .with_binding(Binding::OnEdge { parent: rect.id, edge: 0, t: 0.5 });
        let mut shapes = vec![rect.clone(), marker.clone()];

        replace(&mut shapes, rect.clone().with_rotation(90.0));
        let resolved = resolve(&shapes, rect.id, &Viewport::default());
        // Edge 0 now runs from (250, 50) to (250, 250).
        let p = by_id(&resolved, marker.id).points[0];
        assert!(distance(p, Point::new(250.0, 150.0)) < 1e-9);
    }

    #[test]
    fn test_on_edge_tracks_resize() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(100.0, 50.0));
        let marker = Shape::point(Point::new(100.0, 25.0))
            .with_binding(Binding::OnEdge { parent: rect.id, edge: 1, t: 0.5 });
        let mut shapes = vec![rect.clone(), marker.clone()];

        let mut bigger = rect.clone();
        bigger.points[1] = Point::new(200.0, 80.0);
        replace(&mut shapes, bigger);
        let resolved = resolve(&shapes, rect.id, &Viewport::default());
        assert_eq!(by_id(&resolved, marker.id).points[0], Point::new(200.0, 40.0));
    }

    #[test]
    fn test_multi_hop_chain() {
        let a = Shape::point(Point::new(0.0, 0.0));
        let b = Shape::point(Point::new(100.0, 0.0));
        let seg = Shape::segment(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
            .with_binding(Binding::PointsLink { parents: [Some(a.id), Some(b.id)] });
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: seg.id, edge: 0, t: 0.5 });
        let mut shapes = vec![a.clone(), b, seg.clone(), marker.clone()];

        replace(&mut shapes, a.translated(Vec2::new(0.0, 40.0)));
        let resolved = resolve(&shapes, a.id, &Viewport::default());
        assert_eq!(
            by_id(&resolved, seg.id).points,
            vec![Point::new(0.0, 40.0), Point::new(100.0, 0.0)]
        );
        assert_eq!(by_id(&resolved, marker.id).points[0], Point::new(50.0, 20.0));
    }

    #[test]
    fn test_points_link_bakes_rotation_and_keeps_free_slot() {
        let a = Shape::point(Point::new(0.0, 0.0));
        let seg = Shape::segment(Point::new(0.0, 0.0), Point::new(100.0, 0.0))
            .with_rotation(90.0)
            .with_binding(Binding::PointsLink { parents: [Some(a.id), None] });
        let free_end = geometry::visual_corners(&seg)[1];
        let resolved = resolve(&[a.clone(), seg.clone()], a.id, &Viewport::default());
        let linked = by_id(&resolved, seg.id);
        assert_eq!(linked.rotation, 0.0);
        assert_eq!(linked.points[0], Point::ZERO);
        assert!(distance(linked.points[1], free_end) < 1e-9);
    }

    #[test]
    fn test_missing_parent_leaves_dependent() {
        let tri = triangle();
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let resolved = resolve(&[marker.clone()], tri.id, &Viewport::default());
        assert_eq!(resolved, vec![marker]);
    }

    #[test]
    fn test_out_of_range_edge_leaves_dependent() {
        let tri = triangle();
        let marker = Shape::point(Point::new(7.0, 7.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 5, t: 0.5 });
        let shapes = vec![tri.clone(), marker.clone()];
        let resolved = resolve(&shapes, tri.id, &Viewport::default());
        assert_eq!(by_id(&resolved, marker.id), &marker);
    }

    #[test]
    fn test_cycle_stops_at_depth_bound() {
        // The segment follows `a`, and `a` sits on the segment's midpoint: every
        // pass moves both again, so only the depth bound ends resolution.
        let mut a = Shape::point(Point::new(0.0, 0.0));
        let b = Shape::point(Point::new(100.0, 0.0));
        let seg = Shape::segment(Point::ZERO, Point::new(100.0, 0.0))
            .with_binding(Binding::PointsLink { parents: [Some(a.id), Some(b.id)] });
        a.binding = Some(Binding::OnEdge { parent: seg.id, edge: 0, t: 0.5 });
        let mut shapes = vec![a.clone(), b.clone(), seg.clone()];

        replace(&mut shapes, b.translated(Vec2::new(0.0, 64.0)));
        let resolved = resolve(&shapes, b.id, &Viewport::default());
        assert_eq!(resolved.len(), 3);
        let moved = by_id(&resolved, a.id).points[0];
        assert!(moved.x >= 50.0 && moved.x < 100.0);
        assert!(moved.y > 0.0);
    }

    #[test]
    fn test_on_path_circle_and_curve() {
        let viewport = Viewport::new(Point::new(200.0, 200.0), 20.0);
        let circle = Shape::circle(Point::new(50.0, 50.0), 10.0);
        let on_circle = Shape::point(Point::ZERO).with_binding(Binding::OnPath {
            parent: circle.id,
            param: PathParam::Angle(90.0),
        });
        let curve = Shape::curve(Curve::new(CurveDegree::Quadratic, 1.0, 0.0, 0.0));
        let on_curve = Shape::point(Point::ZERO).with_binding(Binding::OnPath {
            parent: curve.id,
            param: PathParam::X(2.0),
        });
        let shapes = vec![circle.clone(), on_circle.clone(), curve.clone(), on_curve.clone()];

        let resolved = resolve_all(&shapes, &[circle.id, curve.id], &viewport);
        assert!(distance(by_id(&resolved, on_circle.id).points[0], Point::new(50.0, 60.0)) < 1e-9);
        // x = 2 gives y = 4, i.e. screen (240, 120).
        assert!(distance(by_id(&resolved, on_curve.id).points[0], Point::new(240.0, 120.0)) < 1e-9);
    }

    #[test]
    fn test_non_point_dependent_moves_by_center() {
        let tri = triangle();
        let label = Shape::rectangle(Point::new(0.0, 0.0), Point::new(20.0, 10.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let resolved = resolve(&[tri.clone(), label.clone()], tri.id, &Viewport::default());
        assert_eq!(geometry::center(by_id(&resolved, label.id)), Point::new(50.0, 0.0));
    }

    #[test]
    fn test_constrain_point_to_edge() {
        let rect = Shape::rectangle(Point::new(0.0, 0.0), Point::new(100.0, 100.0)).with_rotation(30.0);
        for cursor in [Point::new(50.0, -20.0), Point::new(-40.0, 3.0), Point::new(200.0, 10.0)] {
            let projection = constrain_point_to_edge(cursor, &rect, 0);
            assert!((0.0..=1.0).contains(&projection.t));
            let (a, b) = geometry::edge(&rect, 0).unwrap();
            assert!(geometry::point_to_segment_dist(projection.point, a, b) < 1e-9);

            let again = constrain_point_to_edge(projection.point, &rect, 0);
            assert!(distance(again.point, projection.point) < 1e-9);
            assert!((again.t - projection.t).abs() < 1e-9);
        }
    }

    #[test]
    fn test_constrain_point_degenerate_input() {
        let cursor = Point::new(3.0, 4.0);
        let flat = Shape::segment(Point::new(1.0, 1.0), Point::new(1.0, 1.0));
        assert_eq!(constrain_point_to_edge(cursor, &flat, 0), EdgeProjection { point: cursor, t: 0.0 });
        assert_eq!(constrain_point_to_edge(cursor, &triangle(), 9), EdgeProjection { point: cursor, t: 0.0 });
    }

    #[test]
    fn test_rebind_reprojects_dragged_point() {
        let tri = triangle();
        let marker = Shape::point(Point::new(80.0, 40.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let rebound = rebind(&marker, &[tri.clone()], &Viewport::default());
        assert_eq!(rebound.points, vec![Point::new(80.0, 0.0)]);
        assert_eq!(rebound.binding, Some(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.8 }));

        let past_end = Shape::point(Point::new(150.0, 30.0)).with_binding(rebound.binding.clone().unwrap());
        let clamped = rebind(&past_end, &[tri], &Viewport::default());
        assert_eq!(clamped.points, vec![Point::new(100.0, 0.0)]);
    }

    #[test]
    fn test_rebind_on_path_circle() {
        let circle = Shape::circle(Point::ZERO, 50.0);
        let marker = Shape::point(Point::new(0.0, 80.0)).with_binding(Binding::OnPath {
            parent: circle.id,
            param: PathParam::Angle(0.0),
        });
        let rebound = rebind(&marker, &[circle.clone()], &Viewport::default());
        assert!(distance(rebound.points[0], Point::new(0.0, 50.0)) < 1e-9);
        let Some(Binding::OnPath { param: PathParam::Angle(angle), .. }) = rebound.binding else {
            panic!("path binding expected");
        };
        assert!((angle - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_rebind_pins_linked_slots() {
        let a = Shape::point(Point::ZERO);
        let seg = Shape::segment(Point::new(10.0, 10.0), Point::new(110.0, 10.0))
            .with_binding(Binding::PointsLink { parents: [Some(a.id), None] });
        let rebound = rebind(&seg, &[a.clone(), seg.clone()], &Viewport::default());
        assert_eq!(rebound.points, vec![Point::ZERO, Point::new(110.0, 10.0)]);
    }

    #[test]
    fn test_rebind_without_parent_keeps_shape() {
        let tri = triangle();
        let marker = Shape::point(Point::new(80.0, 40.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        assert_eq!(rebind(&marker, &[], &Viewport::default()), marker);
        let off_edge = Shape::point(Point::new(80.0, 40.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 7, t: 0.5 });
        assert_eq!(rebind(&off_edge, &[tri], &Viewport::default()), off_edge);
    }

    #[test]
    fn test_get_dependents_transitive_closure() {
        let a = Shape::point(Point::new(0.0, 0.0));
        let b = Shape::point(Point::new(100.0, 0.0));
        let seg = Shape::segment(Point::ZERO, Point::new(100.0, 0.0))
            .with_binding(Binding::PointsLink { parents: [Some(a.id), Some(b.id)] });
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: seg.id, edge: 0, t: 0.5 });
        let unrelated = Shape::point(Point::new(9.0, 9.0));
        let shapes = vec![marker.clone(), seg.clone(), a.clone(), b.clone(), unrelated];

        let ids: Vec<ShapeId> = get_dependents(&shapes, &[a.id]).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![seg.id, marker.id]);

        // Both endpoints as roots: the segment still appears once, roots never.
        let ids: Vec<ShapeId> = get_dependents(&shapes, &[a.id, b.id, seg.id]).iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![marker.id]);
    }

    #[test]
    fn test_remove_shapes_detaches() {
        let tri = triangle();
        let a = Shape::point(Point::ZERO);
        let b = Shape::point(Point::new(5.0, 5.0));
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let seg = Shape::segment(Point::ZERO, Point::new(5.0, 5.0))
            .with_binding(Binding::PointsLink { parents: [Some(a.id), Some(b.id)] });
        let shapes = vec![tri.clone(), a.clone(), b.clone(), marker.clone(), seg.clone()];

        let remaining = remove_shapes(&shapes, &[tri.id, a.id]);
        assert_eq!(remaining.len(), 3);
        assert_eq!(by_id(&remaining, marker.id).binding, None);
        assert_eq!(by_id(&remaining, marker.id).points, marker.points);
        assert_eq!(
            by_id(&remaining, seg.id).binding,
            Some(Binding::PointsLink { parents: [None, Some(b.id)] })
        );
    }
}
