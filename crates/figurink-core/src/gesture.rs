//! In-progress manipulation gestures.
//!
//! A gesture keeps the committed shapes it started from plus the cursor
//! positions. While the drag runs, the presentation layer draws the originals
//! through [`GesturePreview::affine`]; on release, [`Gesture::commit`] folds the
//! gesture into the shape collection with the same operators single edits use.
//! Cancelling a gesture is dropping it.

use crate::constraints;
use crate::geometry;
use crate::shapes::{Shape, ShapeId};
use crate::snap::{ANGLE_SNAP_INCREMENT, snap_angle};
use crate::transform::{self, Handle};
use crate::viewport::Viewport;
use kurbo::{Affine, Point, Vec2};

/// What the gesture does to its shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureKind {
    Move,
    /// Rotate around `pivot`, snapping to 15 degree steps when `snap` is set.
    Rotate { pivot: Point, snap: bool },
    /// Drag a handle. Several shapes resize as a group.
    Resize { handle: Handle, lock_aspect: bool },
}

/// Additive transform to draw on top of the committed shapes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GesturePreview {
    Translate(Vec2),
    Rotate { delta: f64, pivot: Point },
    Scale { sx: f64, sy: f64, anchor: Point },
}

impl GesturePreview {
    pub fn affine(&self) -> Affine {
        match *self {
            GesturePreview::Translate(delta) => Affine::translate(delta),
            GesturePreview::Rotate { delta, pivot } => {
                Affine::rotate_about(delta.to_radians(), pivot)
            }
            GesturePreview::Scale { sx, sy, anchor } => {
                Affine::translate(anchor.to_vec2())
                    * Affine::scale_non_uniform(sx, sy)
                    * Affine::translate(-anchor.to_vec2())
            }
        }
    }
}

/// State of an active manipulation.
#[derive(Debug, Clone)]
pub struct Gesture {
    pub kind: GestureKind,
    /// Committed shapes being manipulated.
    pub originals: Vec<Shape>,
    /// Starting point of the drag.
    pub start: Point,
    /// Current point of the drag.
    pub current: Point,
}

impl Gesture {
    pub fn new(kind: GestureKind, originals: Vec<Shape>, start: Point) -> Self {
        Self {
            kind,
            originals,
            start,
            current: start,
        }
    }

    pub fn update(&mut self, cursor: Point) {
        self.current = cursor;
    }

    /// Get the drag delta.
    pub fn delta(&self) -> Vec2 {
        self.current - self.start
    }

    pub fn shape_ids(&self) -> Vec<ShapeId> {
        self.originals.iter().map(|s| s.id).collect()
    }

    /// Rotation swept around `pivot` since the gesture started, in degrees.
    pub fn sweep(&self, pivot: Point, snap: bool) -> f64 {
        let from = self.start - pivot;
        let to = self.current - pivot;
        if from.hypot2() < geometry::EPSILON || to.hypot2() < geometry::EPSILON {
            return 0.0;
        }
        let sweep = (to.atan2() - from.atan2()).to_degrees();
        if snap {
            snap_angle(sweep, ANGLE_SNAP_INCREMENT)
        } else {
            sweep
        }
    }

    /// Whether a manipulated shape is bound to a shape outside the gesture.
    ///
    /// Such shapes are pulled back onto their parents, which no additive
    /// transform can express.
    pub fn is_anchored(&self) -> bool {
        let ids = self.shape_ids();
        self.originals.iter().any(|s| anchored_outside(s, &ids))
    }

    /// Preview transform for the current cursor.
    ///
    /// Vertex drags change shape rather than placement, and anchored shapes
    /// follow their parents; neither has a preview transform, so draw
    /// [`Gesture::apply`] instead.
    pub fn preview(&self) -> Option<GesturePreview> {
        if self.is_anchored() {
            return None;
        }
        match self.kind {
            GestureKind::Move => Some(GesturePreview::Translate(self.delta())),
            GestureKind::Rotate { pivot, snap } => Some(GesturePreview::Rotate {
                delta: self.sweep(pivot, snap),
                pivot,
            }),
            GestureKind::Resize {
                handle: Handle::Corner(corner),
                ..
            } => {
                let before = geometry::bounds_of(&self.originals)?;
                let after = geometry::bounds_of(&self.manipulate(&Viewport::default()))?;
                let sx = if before.width() > geometry::EPSILON {
                    after.width() / before.width()
                } else {
                    1.0
                };
                let sy = if before.height() > geometry::EPSILON {
                    after.height() / before.height()
                } else {
                    1.0
                };
                Some(GesturePreview::Scale {
                    sx,
                    sy,
                    anchor: corner.opposite().of_rect(before),
                })
            }
            GestureKind::Resize {
                handle: Handle::Vertex(_),
                ..
            } => None,
        }
    }

    /// The originals with the gesture applied.
    ///
    /// `shapes` is the committed collection; shapes bound to a parent outside
    /// the gesture are re-anchored on it (see [`constraints::rebind`]).
    pub fn apply(&self, shapes: &[Shape], viewport: &Viewport) -> Vec<Shape> {
        let manipulated = self.manipulate(viewport);
        let ids = self.shape_ids();
        if !manipulated.iter().any(|s| anchored_outside(s, &ids)) {
            return manipulated;
        }
        let context = merged(shapes, &manipulated);
        manipulated
            .iter()
            .map(|s| {
                if anchored_outside(s, &ids) {
                    constraints::rebind(s, &context, viewport)
                } else {
                    s.clone()
                }
            })
            .collect()
    }

    /// Fold the gesture into `shapes` and resolve everything bound to the
    /// manipulated shapes.
    pub fn commit(&self, shapes: &[Shape], viewport: &Viewport) -> Vec<Shape> {
        let applied = self.apply(shapes, viewport);
        log::debug!("Committing {:?} gesture on {} shape(s)", self.kind, applied.len());
        constraints::resolve_all(&merged(shapes, &applied), &self.shape_ids(), viewport)
    }

    fn manipulate(&self, viewport: &Viewport) -> Vec<Shape> {
        match self.kind {
            GestureKind::Move => {
                let delta = self.delta();
                self.originals
                    .iter()
                    .map(|s| transform::translate(s, delta, viewport))
                    .collect()
            }
            GestureKind::Rotate { pivot, snap } => {
                let sweep = self.sweep(pivot, snap);
                self.originals
                    .iter()
                    .map(|s| transform::rotate(s, sweep, Some(pivot), false))
                    .collect()
            }
            GestureKind::Resize {
                handle,
                lock_aspect,
            } => match (handle, self.originals.as_slice()) {
                (_, [single]) => vec![transform::resize(single, handle, self.current, lock_aspect)],
                (Handle::Corner(corner), group) => {
                    transform::resize_group(group, corner, self.current, lock_aspect)
                }
                (Handle::Vertex(_), group) => group.to_vec(),
            },
        }
    }
}

/// Bound to at least one parent that is not among `ids`.
fn anchored_outside(shape: &Shape, ids: &[ShapeId]) -> bool {
    shape
        .binding
        .as_ref()
        .is_some_and(|b| b.parents().iter().any(|p| !ids.contains(p)))
}

/// `shapes` with every shape in `replacements` swapped in by id.
fn merged(shapes: &[Shape], replacements: &[Shape]) -> Vec<Shape> {
    shapes
        .iter()
        .map(|s| {
            replacements
                .iter()
                .find(|r| r.id == s.id)
                .cloned()
                .unwrap_or_else(|| s.clone())
        })
        .collect()
}
