use std::sync::Arc;

/// Piecewise-linear interpolant over one template row.
///
/// Segment slopes are computed once. Outside the grid the edge segments are
/// extended linearly.
#[derive(Debug, Clone)]
pub struct LinearInterpolant {
    knots: Arc<[f64]>,
    values: Vec<f64>,
    slopes: Vec<f64>,
}

impl LinearInterpolant {
    /// Build from a strictly increasing grid with at least two knots.
    ///
    /// The grid is shared between all interpolants of an archetype.
    #[must_use]
    pub fn new(knots: Arc<[f64]>, values: Vec<f64>) -> Self {
        debug_assert_eq!(knots.len(), values.len());
        debug_assert!(knots.len() >= 2);

        let slopes = knots
            .windows(2)
            .zip(values.windows(2))
            .map(|(x, y)| (y[1] - y[0]) / (x[1] - x[0]))
            .collect();
        Self {
            knots,
            values,
            slopes,
        }
    }

    /// Interpolated value at `x`
    #[must_use]
    pub fn eval(&self, x: f64) -> f64 {
        let k = self
            .knots
            .partition_point(|&w| w <= x)
            .saturating_sub(1)
            .min(self.slopes.len() - 1);
        self.values[k] + self.slopes[k] * (x - self.knots[k])
    }

    /// Interpolated values at every `x`
    #[must_use]
    pub fn eval_many(&self, x: impl IntoIterator<Item = f64>) -> Vec<f64> {
        x.into_iter().map(|xi| self.eval(xi)).collect()
    }
}
