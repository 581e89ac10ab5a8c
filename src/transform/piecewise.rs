use serde::{Deserialize, Serialize};

use super::{Evaluation, Transform, TransformationError};

/// Piecewise-linear interpolation through a set of knots.
///
/// Outside the knot domain the first or last segment is extended. A single
/// knot `(x0, y0)` describes the shift `x + (y0 - x0)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "KnotTable", into = "KnotTable")]
pub struct PiecewiseLinear {
    /// Strictly increasing in `x`.
    knots: Vec<(f64, f64)>,
}

#[derive(Serialize, Deserialize)]
struct KnotTable {
    points: Vec<(f64, f64)>,
}

impl TryFrom<KnotTable> for PiecewiseLinear {
    type Error = TransformationError;

    fn try_from(table: KnotTable) -> Result<Self, Self::Error> {
        PiecewiseLinear::new(table.points)
    }
}

impl From<PiecewiseLinear> for KnotTable {
    fn from(model: PiecewiseLinear) -> Self {
        KnotTable {
            points: model.knots,
        }
    }
}

impl PiecewiseLinear {
    /// Sorts the knots by `x`; knots sharing an `x` are merged by averaging `y`.
    pub fn new(knots: impl IntoIterator<Item = (f64, f64)>) -> Result<Self, TransformationError> {
        let mut raw: Vec<(f64, f64)> = knots.into_iter().collect();
        if raw.is_empty() {
            return Err(TransformationError::NoKnots);
        }
        if let Some((index, &(x, y))) = raw
            .iter()
            .enumerate()
            .find(|(_, (x, y))| !x.is_finite() || !y.is_finite())
        {
            return Err(TransformationError::NonFinite { index, x, y });
        }
        raw.sort_by(|a, b| a.0.total_cmp(&b.0));

        let mut knots: Vec<(f64, f64)> = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            let x = raw[i].0;
            let run = raw[i..].iter().take_while(|k| k.0 == x).count();
            let y = raw[i..i + run].iter().map(|k| k.1).sum::<f64>() / run as f64;
            knots.push((x, y));
            i += run;
        }
        Ok(PiecewiseLinear { knots })
    }

    pub fn knots(&self) -> &[(f64, f64)] {
        &self.knots
    }

    /// The fitted domain `[x_first, x_last]`.
    pub fn domain(&self) -> (f64, f64) {
        (self.knots[0].0, self.knots[self.knots.len() - 1].0)
    }
}

fn along(from: (f64, f64), to: (f64, f64), x: f64) -> f64 {
    let slope = (to.1 - from.1) / (to.0 - from.0);
    from.1 + (x - from.0) * slope
}

impl Transform for PiecewiseLinear {
    fn evaluate(&self, x: f64) -> Evaluation {
        // NaN is unordered against the knots; pass it through like the linear models.
        if x.is_nan() {
            return Evaluation {
                value: f64::NAN,
                extrapolated: false,
            };
        }
        let k = &self.knots;
        let n = k.len();
        let (lo, hi) = self.domain();

        if n == 1 {
            return Evaluation {
                value: x + (k[0].1 - k[0].0),
                extrapolated: x != lo,
            };
        }
        if x < lo {
            return Evaluation {
                value: along(k[0], k[1], x),
                extrapolated: true,
            };
        }
        if x > hi {
            return Evaluation {
                value: along(k[n - 2], k[n - 1], x),
                extrapolated: true,
            };
        }

        // First knot strictly right of x; x == hi lands on the last knot.
        let right = k.partition_point(|knot| knot.0 <= x);
        let value = if right == n {
            k[n - 1].1
        } else {
            along(k[right - 1], k[right], x)
        };
        Evaluation {
            value,
            extrapolated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interpolates_between_knots() {
        let model = PiecewiseLinear::new([(0.0, 0.0), (10.0, 20.0), (20.0, 25.0)]).unwrap();
        assert_eq!(model.apply(5.0), 10.0);
        assert_eq!(model.apply(10.0), 20.0);
        assert_eq!(model.apply(15.0), 22.5);
        assert_eq!(model.apply(20.0), 25.0);
        assert!(!model.evaluate(20.0).extrapolated);
    }

    #[test]
    fn extrapolates_with_boundary_slopes() {
        let model = PiecewiseLinear::new([(0.0, 0.0), (10.0, 20.0), (20.0, 25.0)]).unwrap();

        let left = model.evaluate(-5.0);
        assert_eq!(left.value, -10.0);
        assert!(left.extrapolated);

        let right = model.evaluate(30.0);
        assert_eq!(right.value, 30.0);
        assert!(right.extrapolated);
    }

    #[test]
    fn unsorted_and_duplicate_knots() {
        let model = PiecewiseLinear::new([(10.0, 12.0), (0.0, 1.0), (10.0, 14.0)]).unwrap();
        assert_eq!(model.knots(), &[(0.0, 1.0), (10.0, 13.0)]);
        assert_eq!(model.domain(), (0.0, 10.0));
    }

    #[test]
    fn single_knot_is_a_shift() {
        let model = PiecewiseLinear::new([(100.0, 103.0)]).unwrap();
        assert_eq!(model.evaluate(100.0).value, 103.0);
        assert!(!model.evaluate(100.0).extrapolated);
        let far = model.evaluate(50.0);
        assert_eq!(far.value, 53.0);
        assert!(far.extrapolated);
    }

    #[test]
    fn rejects_bad_knots() {
        assert_eq!(
            PiecewiseLinear::new(Vec::<(f64, f64)>::new()),
            Err(TransformationError::NoKnots)
        );
        assert!(matches!(
            PiecewiseLinear::new([(0.0, 0.0), (f64::NAN, 1.0)]),
            Err(TransformationError::NonFinite { index: 1, .. })
        ));
    }

    #[test]
    fn nan_passes_through() {
        let model = PiecewiseLinear::new([(0.0, 1.0), (10.0, 11.0)]).unwrap();
        let eval = model.evaluate(f64::NAN);
        assert!(eval.value.is_nan());
        assert!(!eval.extrapolated);

        let single = PiecewiseLinear::new([(5.0, 6.0)]).unwrap();
        assert!(single.apply(f64::NAN).is_nan());
    }

    #[test]
    fn non_monotonic_models_are_evaluated_as_given() {
        let model = PiecewiseLinear::new([(0.0, 10.0), (10.0, 0.0)]).unwrap();
        assert_eq!(model.apply(2.0), 8.0);
        assert_eq!(model.apply(12.0), -2.0);
    }
}
