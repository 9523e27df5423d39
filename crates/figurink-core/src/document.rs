//! Ordered shape collection and its JSON record codec.

use crate::constraints;
use crate::shapes::{Shape, ShapeError, ShapeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Document errors.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid shape: {0}")]
    Shape(#[from] ShapeError),
    #[error("Duplicate shape id: {0}")]
    DuplicateId(ShapeId),
}

/// Result type for document operations.
pub type DocumentResult<T> = Result<T, DocumentError>;

/// All shapes of a figure, back to front.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_shapes(shapes: Vec<Shape>) -> Self {
        Self { shapes }
    }

    /// Add a shape on top.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Remove shapes by id, detaching whatever was bound to them.
    pub fn remove_shapes(&mut self, ids: &[ShapeId]) {
        self.shapes = constraints::remove_shapes(&self.shapes, ids);
    }

    /// Check every record and every binding reference.
    pub fn validate(&self) -> DocumentResult<()> {
        let mut ids = HashSet::with_capacity(self.shapes.len());
        for shape in &self.shapes {
            if !ids.insert(shape.id) {
                return Err(DocumentError::DuplicateId(shape.id));
            }
        }
        for shape in &self.shapes {
            shape.validate()?;
            let dangling = shape
                .binding
                .iter()
                .flat_map(|b| b.parents())
                .find(|parent| !ids.contains(parent));
            if let Some(parent) = dangling {
                return Err(ShapeError::DanglingParent {
                    id: shape.id,
                    parent,
                }
                .into());
            }
        }
        Ok(())
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> DocumentResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize and validate a document from JSON.
    pub fn from_json(json: &str) -> DocumentResult<Self> {
        let document: Document = serde_json::from_str(json)?;
        if let Err(err) = document.validate() {
            log::warn!("Rejected document: {err}");
            return Err(err);
        }
        Ok(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::{Binding, Curve, CurveDegree, PathParam, TextContent};
    use kurbo::Point;
    use uuid::Uuid;

    fn sample() -> Document {
        let tri = Shape::polygon(vec![Point::ZERO, Point::new(100.0, 0.0), Point::new(0.0, 100.0)]);
        let marker = Shape::point(Point::new(50.0, 0.0))
            .with_binding(Binding::OnEdge { parent: tri.id, edge: 0, t: 0.5 });
        let circle = Shape::circle(Point::new(10.0, 10.0), 5.0);
        let on_circle = Shape::point(Point::new(15.0, 10.0)).with_binding(Binding::OnPath {
            parent: circle.id,
            param: PathParam::Angle(0.0),
        });
        let curve = Shape::curve(Curve::new(CurveDegree::Cubic, 0.5, 1.0, -2.0));
        let label = Shape::text(Point::new(5.0, 5.0), TextContent::new("A")).with_rotation(15.0);
        Document::from_shapes(vec![tri, marker, circle, on_circle, curve, label])
    }

    #[test]
    fn test_json_preserves_records_and_order() {
        let document = sample();
        let json = document.to_json().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back, document);
    }

    #[test]
    fn test_from_json_rejects_dangling_parent() {
        let mut document = sample();
        let missing = Uuid::new_v4();
        document.add_shape(
            Shape::point(Point::ZERO).with_binding(Binding::OnEdge { parent: missing, edge: 0, t: 0.0 }),
        );
        let json = document.to_json().unwrap();
        let err = Document::from_json(&json).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::Shape(ShapeError::DanglingParent { parent, .. }) if parent == missing
        ));
    }

    #[test]
    fn test_from_json_rejects_duplicate_ids() {
        let mut document = sample();
        let copy = document.shapes[0].clone();
        document.add_shape(copy);
        assert!(matches!(document.validate(), Err(DocumentError::DuplicateId(_))));
    }

    #[test]
    fn test_from_json_rejects_malformed_json() {
        assert!(matches!(Document::from_json("{\"shapes\": [1]}"), Err(DocumentError::Json(_))));
    }

    #[test]
    fn test_remove_shapes_detaches() {
        let mut document = sample();
        let tri = document.shapes[0].id;
        let marker = document.shapes[1].id;
        document.remove_shapes(&[tri]);
        assert_eq!(document.len(), 5);
        assert_eq!(document.get_shape(marker).and_then(|s| s.binding.clone()), None);
        assert!(document.validate().is_ok());
    }
}
