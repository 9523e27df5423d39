//! Figurink Core Library
//!
//! Geometry, snapping, constraint resolution and transform operators for the
//! Figurink figure editor. Every operator is a pure function from the last
//! committed shapes to new shapes; rendering, input and persistence live in
//! the host.

pub mod constraints;
pub mod document;
pub mod geometry;
pub mod gesture;
pub mod recognize;
pub mod shapes;
pub mod snap;
pub mod transform;
pub mod viewport;

pub use constraints::{
    EdgeProjection, MAX_RESOLVE_DEPTH, constrain_point_to_edge, get_dependents, rebind,
    remove_shapes, resolve, resolve_all,
};
pub use document::{Document, DocumentError, DocumentResult};
pub use gesture::{Gesture, GestureKind, GesturePreview};
pub use recognize::{Recognized, classify};
pub use shapes::{Binding, Category, PathParam, Shape, ShapeError, ShapeId, ShapeKind};
pub use snap::{
    GRID_SIZE, GridConfig, SnapConfig, SnapResult, SnapTarget, SnapTargetKind, find_snap_target,
    snap_free_point, snap_segment_endpoint, snap_to_grid,
};
pub use transform::{
    Corner, Handle, drag_vertex, resize, resize_box, resize_group, rotate, translate,
};
pub use viewport::Viewport;
