//! Mapping between curve math coordinates and screen coordinates.

use kurbo::{Affine, Point, Vec2};
use serde::{Deserialize, Serialize};

/// Default number of screen pixels per math unit.
pub const DEFAULT_UNIT: f64 = 40.0;

/// Viewport parameters for analytic curves.
///
/// Math space has y growing upward; screen space has y growing downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    /// Screen position of the math origin.
    pub origin: Point,
    /// Screen pixels per math unit.
    pub unit: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            origin: Point::ZERO,
            unit: DEFAULT_UNIT,
        }
    }
}

impl Viewport {
    pub fn new(origin: Point, unit: f64) -> Self {
        Self { origin, unit }
    }

    /// Transform from math coordinates to screen coordinates.
    pub fn transform(&self) -> Affine {
        Affine::translate(self.origin.to_vec2()) * Affine::scale_non_uniform(self.unit, -self.unit)
    }

    /// Transform from screen coordinates to math coordinates.
    pub fn inverse_transform(&self) -> Affine {
        self.transform().inverse()
    }

    pub fn to_screen(&self, math: Point) -> Point {
        self.transform() * math
    }

    pub fn to_math(&self, screen: Point) -> Point {
        self.inverse_transform() * screen
    }

    /// Convert a screen-space translation to a math-space translation.
    pub fn delta_to_math(&self, delta: Vec2) -> Vec2 {
        if self.unit.abs() < f64::EPSILON {
            return Vec2::ZERO;
        }
        Vec2::new(delta.x / self.unit, -delta.y / self.unit)
    }

    /// Convert a screen distance to math units.
    pub fn length_to_math(&self, length: f64) -> f64 {
        if self.unit.abs() < f64::EPSILON {
            return 0.0;
        }
        length / self.unit.abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert_eq!(viewport.to_screen(Point::new(1.0, 1.0)), Point::new(40.0, -40.0));
    }

    #[test]
    fn test_y_axis_flips() {
        let viewport = Viewport::new(Point::new(100.0, 200.0), 10.0);
        let screen = viewport.to_screen(Point::new(2.0, 3.0));
        assert!((screen.x - 120.0).abs() < 1e-10);
        assert!((screen.y - 170.0).abs() < 1e-10);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport::new(Point::new(30.0, -20.0), 25.0);
        let original = Point::new(123.0, 456.0);
        let back = viewport.to_screen(viewport.to_math(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);
    }

    #[test]
    fn test_delta_to_math() {
        let viewport = Viewport::new(Point::ZERO, 20.0);
        let delta = viewport.delta_to_math(Vec2::new(40.0, 20.0));
        assert!((delta.x - 2.0).abs() < f64::EPSILON);
        assert!((delta.y + 1.0).abs() < f64::EPSILON);
    }
}
