//! Bindings from a dependent shape to the shape(s) it sits on.

use super::ShapeId;
use serde::{Deserialize, Serialize};

/// Where on a round boundary or analytic curve a dependent sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathParam {
    /// Parametric angle in degrees, measured in the parent's own (unrotated) frame.
    Angle(f64),
    /// Input coordinate of an analytic curve, in math units.
    X(f64),
}

/// A reference from a dependent shape to its parent(s), by id only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Binding {
    /// Interpolated position on visual edge `edge` (corner `edge` to `edge + 1 mod N`).
    OnEdge { parent: ShapeId, edge: usize, t: f64 },
    /// Position on a circle/ellipse boundary or on an analytic curve.
    OnPath { parent: ShapeId, param: PathParam },
    /// Segment endpoints copied from point shapes; `None` slots stay free.
    PointsLink { parents: [Option<ShapeId>; 2] },
}

impl Binding {
    /// Ids of every parent this binding depends on.
    pub fn parents(&self) -> Vec<ShapeId> {
        match self {
            Binding::OnEdge { parent, .. } | Binding::OnPath { parent, .. } => vec![*parent],
            Binding::PointsLink { parents } => parents.iter().flatten().copied().collect(),
        }
    }

    /// Check whether this binding names `id` as a parent.
    pub fn names(&self, id: ShapeId) -> bool {
        match self {
            Binding::OnEdge { parent, .. } | Binding::OnPath { parent, .. } => *parent == id,
            Binding::PointsLink { parents } => parents.contains(&Some(id)),
        }
    }

    /// The binding left over once parent `id` is gone.
    ///
    /// Edge and path bindings disappear entirely. A points link frees the slot
    /// and disappears only when no slot is left.
    pub fn without_parent(&self, id: ShapeId) -> Option<Binding> {
        match self {
            Binding::OnEdge { parent, .. } | Binding::OnPath { parent, .. } => {
                if *parent == id {
                    None
                } else {
                    Some(self.clone())
                }
            }
            Binding::PointsLink { parents } => {
                let parents = parents.map(|slot| slot.filter(|p| *p != id));
                if parents.iter().all(Option::is_none) {
                    None
                } else {
                    Some(Binding::PointsLink { parents })
                }
            }
        }
    }

    /// Link endpoint `slot` (0 = start, 1 = end) of a segment to point shape `parent`.
    ///
    /// An existing points link keeps its other slot; any other binding is replaced.
    pub fn link_endpoint(existing: Option<&Binding>, slot: usize, parent: ShapeId) -> Binding {
        let mut parents = match existing {
            Some(Binding::PointsLink { parents }) => *parents,
            _ => [None, None],
        };
        if let Some(entry) = parents.get_mut(slot) {
            *entry = Some(parent);
        }
        Binding::PointsLink { parents }
    }
}
