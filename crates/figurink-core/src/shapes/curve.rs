//! Analytic function curves.

use serde::{Deserialize, Serialize};

/// Polynomial degree of a curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurveDegree {
    Linear,
    #[default]
    Quadratic,
    Cubic,
}

impl CurveDegree {
    pub fn exponent(self) -> u32 {
        match self {
            CurveDegree::Linear => 1,
            CurveDegree::Quadratic => 2,
            CurveDegree::Cubic => 3,
        }
    }
}

/// A function curve `y = a * (x - h)^n + k` in math coordinates.
///
/// `(a, h, k)` is the vertex form the editor manipulates. `coefficients` is the
/// expanded standard form (`c0 + c1*x + ... + cn*x^n`), re-derived on every
/// change of the vertex form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Curve {
    #[serde(default)]
    pub degree: CurveDegree,
    pub a: f64,
    pub h: f64,
    pub k: f64,
    #[serde(default)]
    pub coefficients: Vec<f64>,
}

impl Curve {
    pub fn new(degree: CurveDegree, a: f64, h: f64, k: f64) -> Self {
        let mut curve = Self {
            degree,
            a,
            h,
            k,
            coefficients: Vec::new(),
        };
        curve.rederive();
        curve
    }

    /// Recompute the standard-form coefficients from the vertex form.
    pub fn rederive(&mut self) {
        let n = self.degree.exponent();
        let mut coefficients = vec![0.0; n as usize + 1];
        for (i, c) in coefficients.iter_mut().enumerate() {
            let i = i as u32;
            *c = self.a * binomial(n, i) as f64 * (-self.h).powi((n - i) as i32);
        }
        coefficients[0] += self.k;
        self.coefficients = coefficients;
    }

    /// Shift the vertex by `(dx, dy)` math units.
    pub fn shifted(&self, dx: f64, dy: f64) -> Self {
        Self::new(self.degree, self.a, self.h + dx, self.k + dy)
    }

    /// Evaluate `y` at `x`.
    pub fn eval(&self, x: f64) -> f64 {
        self.a * (x - self.h).powi(self.degree.exponent() as i32) + self.k
    }

    /// Evaluate the standard form with Horner's scheme.
    pub fn eval_standard(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// The vertex `(h, k)` in math coordinates.
    pub fn vertex(&self) -> kurbo::Point {
        kurbo::Point::new(self.h, self.k)
    }
}

fn binomial(n: u32, k: u32) -> u64 {
    (0..k).fold(1u64, |acc, i| acc * u64::from(n - i) / u64::from(i + 1))
}
