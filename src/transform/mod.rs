//! Retention-time transformations.
//!
//! A transformation is handed to this crate fully formed; nothing here fits
//! one. The appliers only rely on the [`Transform`] trait.

mod piecewise;

pub use piecewise::PiecewiseLinear;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum TransformationError {
    #[error("a piecewise-linear transformation needs at least one knot")]
    NoKnots,
    #[error("knot {index} is not finite: ({x}, {y})")]
    NonFinite { index: usize, x: f64, y: f64 },
}

/// Result of evaluating a transformation at one coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// The input lay outside the fitted domain and the boundary slope was used.
    pub extrapolated: bool,
}

impl Evaluation {
    fn exact(value: f64) -> Self {
        Evaluation {
            value,
            extrapolated: false,
        }
    }
}

/// A deterministic map from one coordinate to another.
///
/// Implementations must be total: every finite input yields a value.
pub trait Transform {
    fn evaluate(&self, x: f64) -> Evaluation;

    fn apply(&self, x: f64) -> f64 {
        self.evaluate(x).value
    }
}

/// The transformation models this crate knows how to evaluate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model", rename_all = "snake_case")]
pub enum Transformation {
    #[default]
    Identity,
    Linear { slope: f64, intercept: f64 },
    Interpolated(PiecewiseLinear),
}

impl Transformation {
    pub fn linear(slope: f64, intercept: f64) -> Self {
        Transformation::Linear { slope, intercept }
    }

    /// Constant offset `x + delta`.
    pub fn shift(delta: f64) -> Self {
        Transformation::linear(1.0, delta)
    }

    /// Piecewise-linear model through the given `(x, y)` knots.
    pub fn interpolated(
        knots: impl IntoIterator<Item = (f64, f64)>,
    ) -> Result<Self, TransformationError> {
        PiecewiseLinear::new(knots).map(Transformation::Interpolated)
    }
}

impl Transform for Transformation {
    fn evaluate(&self, x: f64) -> Evaluation {
        match self {
            Transformation::Identity => Evaluation::exact(x),
            Transformation::Linear { slope, intercept } => Evaluation::exact(slope * x + intercept),
            Transformation::Interpolated(model) => model.evaluate(x),
        }
    }
}
