use serde::{Deserialize, Serialize};

use super::branch::Branch;
use super::error::{AnalysisError, Result};

// ---------------------------------------------------------------------------
// TrendRemover – baseline-drift estimation
// ---------------------------------------------------------------------------

/// Estimates a slow baseline under a visibility series.
pub trait TrendRemover {
    /// Short name used in logs and the UI.
    fn name(&self) -> &str;

    /// Fewest samples the estimator accepts.
    fn min_points(&self) -> usize;

    /// Baseline sampled at every input index; same length as `values`.
    fn fit(&self, values: &[f64]) -> Vec<f64>;

    /// Remove the baseline from `valid`, returning the detrended branch and the
    /// baseline itself so it can be reused on the negative branch.
    fn detrend(&self, valid: &Branch) -> Result<(Branch, Vec<f64>)> {
        let n = valid.visibility.len();
        if n < self.min_points() {
            return Err(AnalysisError::InsufficientData {
                stage: "detrend",
                needed: self.min_points(),
                got: n,
            });
        }

        let trend = self.fit(&valid.visibility);
        let visibility = valid
            .visibility
            .iter()
            .zip(&trend)
            .map(|(v, t)| v - t)
            .collect();

        Ok((
            Branch {
                position: valid.position.clone(),
                visibility,
            },
            trend,
        ))
    }
}

/// The closed set of built-in baseline estimators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TrendRemoval {
    /// Least-squares straight line over the sample index.
    #[default]
    Linear,
    /// Constant equal to the mean.
    Mean,
    /// Zero baseline.
    None,
}

impl TrendRemoval {
    pub const ALL: [TrendRemoval; 3] = [TrendRemoval::Linear, TrendRemoval::Mean, TrendRemoval::None];
}

impl TrendRemover for TrendRemoval {
    fn name(&self) -> &str {
        match self {
            TrendRemoval::Linear => "linear",
            TrendRemoval::Mean => "mean",
            TrendRemoval::None => "none",
        }
    }

    fn min_points(&self) -> usize {
        match self {
            TrendRemoval::Linear => 2,
            TrendRemoval::Mean => 1,
            TrendRemoval::None => 0,
        }
    }

    fn fit(&self, values: &[f64]) -> Vec<f64> {
        match self {
            TrendRemoval::Linear => linear_fit(values),
            TrendRemoval::Mean => vec![mean(values); values.len()],
            TrendRemoval::None => vec![0.0; values.len()],
        }
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Straight line `a + b·i` fitted by least squares against the index `i`.
fn linear_fit(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let x_mean = (n as f64 - 1.0) / 2.0;
    let y_mean = mean(values);

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for (i, &y) in values.iter().enumerate() {
        let dx = i as f64 - x_mean;
        sxy += dx * (y - y_mean);
        sxx += dx * dx;
    }
    let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
    let intercept = y_mean - slope * x_mean;

    (0..n).map(|i| intercept + slope * i as f64).collect()
}

/// Subtract the start of the valid-branch baseline from the negative branch.
///
/// Sample `i` of the negative branch (in scan order) is corrected by `trend[i]`.
/// This assumes the drift is continuous across the fringe and is an assumption
/// to validate against measured data, not a derived result.
pub fn correct_negative(negative: &Branch, trend: &[f64]) -> Result<Branch> {
    if negative.len() > trend.len() {
        return Err(AnalysisError::DimensionMismatch {
            what: "baseline for negative branch",
            expected: negative.len(),
            actual: trend.len(),
        });
    }

    Ok(Branch {
        position: negative.position.clone(),
        visibility: negative
            .visibility
            .iter()
            .zip(trend)
            .map(|(v, t)| v - t)
            .collect(),
    })
}
