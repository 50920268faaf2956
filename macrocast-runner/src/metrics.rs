//! Forecast accuracy metrics: pure functions over actual/predicted slices.
//!
//! No dependencies on the forecaster or the data pipeline.

use serde::{Deserialize, Serialize};

/// Accuracy of predictions over one partition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracyMetrics {
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,
    pub n_samples: usize,
}

impl AccuracyMetrics {
    pub fn compute(actual: &[f64], predicted: &[f64]) -> Self {
        Self {
            r2: r_squared(actual, predicted),
            rmse: rmse(actual, predicted),
            mae: mean_absolute_error(actual, predicted),
            n_samples: actual.len(),
        }
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Coefficient of determination: `1 - SS_res / SS_tot`.
///
/// When the actuals are constant, returns 1.0 for a perfect fit and 0.0
/// otherwise. Returns 0.0 for empty input.
pub fn r_squared(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mean = mean_f64(actual);
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let ss_res: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return if ss_res == 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Root mean squared error: `sqrt(mean((pred - actual)^2))`. 0.0 for empty input.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let mse = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).powi(2))
        .sum::<f64>()
        / actual.len() as f64;
    mse.sqrt()
}

/// Mean absolute error. 0.0 for empty input.
pub fn mean_absolute_error(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (p - a).abs())
        .sum::<f64>()
        / actual.len() as f64
}

fn mean_f64(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
