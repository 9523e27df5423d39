//! Snap functionality: finds the bindable target nearest to the cursor.
//!
//! Priority order: discrete anchors (vertices and centers), then boundary
//! projections (edges, round boundaries, curves), then grid intersections.
//! An anchor inside the vertex threshold always wins over a boundary
//! projection, even a closer one.

use crate::geometry::{self, distance};
use crate::shapes::{Binding, PathParam, Shape, ShapeId, ShapeKind};
use crate::viewport::Viewport;
use kurbo::Point;
use serde::{Deserialize, Serialize};

/// Grid size for snapping (matches the visual grid).
pub const GRID_SIZE: f64 = 20.0;

/// Distance within which a vertex, center or grid point captures the cursor (screen pixels).
pub const VERTEX_SNAP_THRESHOLD: f64 = 8.0;

/// Distance within which an edge or path projection captures the cursor (screen pixels).
pub const EDGE_SNAP_THRESHOLD: f64 = 12.0;

/// Angle snap increment in degrees.
pub const ANGLE_SNAP_INCREMENT: f64 = 15.0;

/// Grid snapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Distance between grid lines.
    pub spacing: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self { spacing: GRID_SIZE }
    }
}

/// Snap thresholds and grid settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapConfig {
    pub vertex_threshold: f64,
    pub edge_threshold: f64,
    /// Grid snapping, None = disabled.
    pub grid: Option<GridConfig>,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            vertex_threshold: VERTEX_SNAP_THRESHOLD,
            edge_threshold: EDGE_SNAP_THRESHOLD,
            grid: None,
        }
    }
}

impl SnapConfig {
    pub fn with_grid(mut self, grid: GridConfig) -> Self {
        self.grid = Some(grid);
        self
    }
}

/// Type of snap target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapTargetKind {
    /// Visual corner/vertex of a shape, with its corner index.
    Vertex(usize),
    /// Center of a shape.
    Center,
    /// Point on a straight visual edge.
    Edge,
    /// Point on a round boundary or an analytic curve.
    Path,
    /// Grid intersection.
    Grid,
}

/// What the cursor snapped to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapTarget {
    /// The shape snapped to (None for grid points).
    pub shape: Option<ShapeId>,
    pub kind: SnapTargetKind,
}

/// Result of a snap operation.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapResult {
    /// The snapped point (the raw cursor when nothing snapped).
    pub point: Point,
    /// Whether any snapping occurred.
    pub snapped: bool,
    /// Binding the new or dragged shape should take on, if any.
    pub binding: Option<Binding>,
    /// What was snapped to.
    pub target: Option<SnapTarget>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(point: Point) -> Self {
        Self {
            point,
            snapped: false,
            binding: None,
            target: None,
        }
    }
}

/// Snap a value to the nearest multiple of `increment`.
pub fn snap_angle(angle_degrees: f64, increment: f64) -> f64 {
    if increment <= 0.0 {
        return angle_degrees;
    }
    (angle_degrees / increment).round() * increment
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Find the snap target nearest to `cursor` among `shapes`, skipping `exclude`.
///
/// Point-shape anchors produce a `points_link` binding, boundary projections an
/// `on_edge` or `on_path` binding; other anchors and grid points snap the
/// position only.
pub fn find_snap_target(
    cursor: Point,
    shapes: &[Shape],
    exclude: &[ShapeId],
    config: &SnapConfig,
    viewport: &Viewport,
) -> SnapResult {
    find(cursor, shapes, exclude, config, viewport, Anchors::All)
}

/// Snap for placing a free-standing point.
///
/// Points bind only to edges and paths: other point shapes are never anchors
/// here. A polygon or box vertex binds as the start of its edge (`t = 0`), a
/// center lying on the outline (a segment midpoint, a curve vertex) binds
/// there. Anchors that lie off the outline give way to the nearest boundary
/// projection, so a point that snaps to a shape is always bound to it.
pub fn snap_free_point(
    cursor: Point,
    shapes: &[Shape],
    exclude: &[ShapeId],
    config: &SnapConfig,
    viewport: &Viewport,
) -> SnapResult {
    let result = find(cursor, shapes, exclude, config, viewport, Anchors::ExceptPoints);
    let Some(SnapTarget {
        shape: Some(id),
        kind,
    }) = result.target
    else {
        return result;
    };
    if result.binding.is_some() {
        return result;
    }
    let binding = shapes.iter().find(|s| s.id == id).and_then(|s| match kind {
        SnapTargetKind::Vertex(index) => vertex_binding(s, index),
        SnapTargetKind::Center => center_binding(s),
        _ => None,
    });
    match binding {
        Some(binding) => SnapResult {
            binding: Some(binding),
            ..result
        },
        None => find(cursor, shapes, exclude, config, viewport, Anchors::Off),
    }
}

/// Snap for placing one endpoint (`slot` 0 or 1) of a connecting segment.
///
/// A point shape within the vertex threshold forces a `points_link`. Otherwise
/// the position still snaps, but edge and path bindings are dropped: segments
/// connect named points, not arbitrary boundary positions.
pub fn snap_segment_endpoint(
    cursor: Point,
    slot: usize,
    shapes: &[Shape],
    exclude: &[ShapeId],
    config: &SnapConfig,
    viewport: &Viewport,
) -> SnapResult {
    let nearest_point = shapes
        .iter()
        .filter(|s| matches!(s.kind, ShapeKind::Point) && !exclude.contains(&s.id))
        .filter_map(|s| {
            geometry::visual_corners(s)
                .first()
                .map(|p| (s.id, *p, distance(cursor, *p)))
        })
        .filter(|(_, _, d)| *d <= config.vertex_threshold)
        .min_by(|a, b| a.2.total_cmp(&b.2));

    if let Some((id, point, _)) = nearest_point {
        return SnapResult {
            point,
            snapped: true,
            binding: Some(Binding::link_endpoint(None, slot, id)),
            target: Some(SnapTarget {
                shape: Some(id),
                kind: SnapTargetKind::Vertex(0),
            }),
        };
    }

    let mut result = find(cursor, shapes, exclude, config, viewport, Anchors::All);
    result.binding = None;
    result
}

/// Which discrete anchors take part in a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchors {
    All,
    ExceptPoints,
    Off,
}

fn find(
    cursor: Point,
    shapes: &[Shape],
    exclude: &[ShapeId],
    config: &SnapConfig,
    viewport: &Viewport,
    anchors: Anchors,
) -> SnapResult {
    let candidates: Vec<&Shape> = shapes.iter().filter(|s| !exclude.contains(&s.id)).collect();

    if anchors != Anchors::Off {
        let point_anchors = anchors == Anchors::All;
        if let Some(result) = nearest_anchor(cursor, &candidates, config, viewport, point_anchors) {
            return result;
        }
    }
    if let Some(result) = nearest_boundary(cursor, &candidates, config, viewport) {
        return result;
    }
    if let Some(grid) = config.grid {
        let point = snap_to_grid(cursor, grid.spacing);
        if distance(point, cursor) <= config.vertex_threshold {
            return SnapResult {
                point,
                snapped: true,
                binding: None,
                target: Some(SnapTarget {
                    shape: None,
                    kind: SnapTargetKind::Grid,
                }),
            };
        }
    }
    SnapResult::none(cursor)
}

/// Step 1: vertices and centers.
fn nearest_anchor(
    cursor: Point,
    candidates: &[&Shape],
    config: &SnapConfig,
    viewport: &Viewport,
    point_anchors: bool,
) -> Option<SnapResult> {
    let mut anchors: Vec<(Point, &Shape, SnapTargetKind)> = Vec::new();
    for shape in candidates.iter().copied() {
        let is_point = matches!(shape.kind, ShapeKind::Point);
        if is_point && !point_anchors {
            continue;
        }
        for (i, corner) in geometry::visual_corners(shape).into_iter().enumerate() {
            anchors.push((corner, shape, SnapTargetKind::Vertex(i)));
        }
        if !is_point {
            let center = match &shape.kind {
                ShapeKind::Curve(curve) => viewport.to_screen(curve.vertex()),
                _ => geometry::center(shape),
            };
            anchors.push((center, shape, SnapTargetKind::Center));
        }
    }

    let (_, point, shape, kind) = anchors
        .into_iter()
        .map(|(point, shape, kind)| (distance(cursor, point), point, shape, kind))
        .filter(|(d, ..)| *d <= config.vertex_threshold)
        .min_by(|a, b| a.0.total_cmp(&b.0))?;

    let binding = matches!(shape.kind, ShapeKind::Point).then(|| Binding::PointsLink {
        parents: [Some(shape.id), None],
    });
    Some(SnapResult {
        point,
        snapped: true,
        binding,
        target: Some(SnapTarget {
            shape: Some(shape.id),
            kind,
        }),
    })
}

/// Step 2: projections onto edges, round boundaries and curves.
fn nearest_boundary(
    cursor: Point,
    candidates: &[&Shape],
    config: &SnapConfig,
    viewport: &Viewport,
) -> Option<SnapResult> {
    let mut projections: Vec<(Point, Binding, SnapTargetKind)> = Vec::new();
    for shape in candidates.iter().copied() {
        match &shape.kind {
            ShapeKind::Point => {}
            ShapeKind::Circle | ShapeKind::Ellipse => {
                if let Some((point, angle)) = geometry::project_onto_ellipse(shape, cursor) {
                    let binding = Binding::OnPath {
                        parent: shape.id,
                        param: PathParam::Angle(angle),
                    };
                    projections.push((point, binding, SnapTargetKind::Path));
                }
            }
            ShapeKind::Curve(curve) => {
                let (point, x) =
                    geometry::project_onto_curve(curve, cursor, config.edge_threshold, viewport);
                let binding = Binding::OnPath {
                    parent: shape.id,
                    param: PathParam::X(x),
                };
                projections.push((point, binding, SnapTargetKind::Path));
            }
            ShapeKind::Segment
            | ShapeKind::Polygon
            | ShapeKind::Freehand
            | ShapeKind::Rectangle
            | ShapeKind::Square
            | ShapeKind::Text(_)
            | ShapeKind::Image(_) => {
                for (edge, (a, b)) in geometry::edges(shape).into_iter().enumerate() {
                    let (point, t) = geometry::project_onto_segment(cursor, a, b);
                    let binding = Binding::OnEdge {
                        parent: shape.id,
                        edge,
                        t,
                    };
                    projections.push((point, binding, SnapTargetKind::Edge));
                }
            }
        }
    }

    let (_, point, binding, kind) = projections
        .into_iter()
        .map(|(point, binding, kind)| (distance(cursor, point), point, binding, kind))
        .filter(|(d, ..)| *d <= config.edge_threshold)
        .min_by(|a, b| a.0.total_cmp(&b.0))?;

    let shape = binding.parents().first().copied();
    Some(SnapResult {
        point,
        snapped: true,
        binding: Some(binding),
        target: Some(SnapTarget { shape, kind }),
    })
}

/// Edge binding that reproduces visual corner `index` of `shape`.
fn vertex_binding(shape: &Shape, index: usize) -> Option<Binding> {
    if shape.kind.is_round() {
        return None;
    }
    let count = geometry::edge_count(shape);
    if count == 0 {
        return None;
    }
    let (edge, t) = if index < count {
        (index, 0.0)
    } else {
        // Last vertex of an open polyline ends the final edge.
        (count - 1, 1.0)
    };
    Some(Binding::OnEdge {
        parent: shape.id,
        edge,
        t,
    })
}

/// Binding for the center anchor of `shape`, if the center lies on its outline.
fn center_binding(shape: &Shape) -> Option<Binding> {
    if let ShapeKind::Curve(curve) = &shape.kind {
        return Some(Binding::OnPath {
            parent: shape.id,
            param: PathParam::X(curve.h),
        });
    }
    let center = geometry::center(shape);
    geometry::edges(shape)
        .into_iter()
        .enumerate()
        .find_map(|(edge, (a, b))| {
            let (point, t) = geometry::project_onto_segment(center, a, b);
            (distance(point, center) < geometry::EPSILON).then_some(Binding::OnEdge {
                parent: shape.id,
                edge,
                t,
            })
        })
}
