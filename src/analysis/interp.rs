//! Piecewise-linear interpolation on sorted samples.
//!
//! Outside the sampled range the first or last segment is extended, so
//! evaluation never fails once the table is built.

use crate::analysis::AnalysisError;

#[derive(Debug, Clone)]
pub struct LinearInterp {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl LinearInterp {
    /// `xs` must be strictly increasing and match `ys` in length, with at
    /// least two samples.
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, AnalysisError> {
        if xs.len() != ys.len() {
            return Err(AnalysisError::Interp(format!(
                "{} abscissae for {} values",
                xs.len(),
                ys.len()
            )));
        }
        if xs.len() < 2 {
            return Err(AnalysisError::Interp(format!("need at least 2 samples, got {}", xs.len())));
        }
        if let Some(w) = xs.windows(2).find(|w| !(w[1] > w[0])) {
            return Err(AnalysisError::Interp(format!(
                "abscissae not strictly increasing at {} -> {}",
                w[0], w[1]
            )));
        }
        Ok(Self { xs, ys })
    }

    /// Value at `x`, extrapolating linearly past either end
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        // index of the segment [k, k + 1] used for x
        let k = match self.xs.partition_point(|&xi| xi <= x) {
            0 => 0,
            i if i >= n => n - 2,
            i => i - 1,
        };
        let (x0, x1) = (self.xs[k], self.xs[k + 1]);
        let (y0, y1) = (self.ys[k], self.ys[k + 1]);
        y0 + (x - x0) * (y1 - y0) / (x1 - x0)
    }

    pub fn eval_many(&self, at: &[f64]) -> Vec<f64> {
        at.iter().map(|&x| self.eval(x)).collect()
    }
}
