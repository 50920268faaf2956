//! Feature standardization: `(x - mean) / std` per column.
//!
//! Two fitting modes:
//! - `Global` fits on every row, train and test alike. This is the default
//!   and leaks test-period moments into training.
//! - `TrainOnly` fits on the train rows and applies the same parameters to
//!   the whole matrix.
//!
//! Zero-variance columns are not divided; they transform to 0.0.

use ndarray::{Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Which rows the scaler's parameters are fitted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalingMode {
    #[default]
    Global,
    TrainOnly,
}

/// Per-column mean and population standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittedScaler {
    pub means: Vec<f64>,
    pub stds: Vec<f64>,
}

impl FittedScaler {
    /// Fit on every row of `x`. An empty matrix yields zero means and stds.
    pub fn fit(x: ArrayView2<f64>) -> Self {
        let n = x.nrows();
        if n == 0 {
            return Self {
                means: vec![0.0; x.ncols()],
                stds: vec![0.0; x.ncols()],
            };
        }

        let mut means = Vec::with_capacity(x.ncols());
        let mut stds = Vec::with_capacity(x.ncols());
        for column in x.axis_iter(Axis(1)) {
            let mean = column.sum() / n as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
            means.push(mean);
            stds.push(var.sqrt());
        }
        Self { means, stds }
    }

    /// True if column `j` has no spread to scale by.
    pub fn is_zero_variance(&self, j: usize) -> bool {
        let scale = self.means[j].abs().max(1.0);
        self.stds[j] <= 1e-12 * scale
    }

    /// Apply the fitted parameters. Zero-variance columns become 0.0.
    pub fn transform(&self, x: ArrayView2<f64>) -> Array2<f64> {
        let mut out = x.to_owned();
        for (j, mut column) in out.axis_iter_mut(Axis(1)).enumerate() {
            if self.is_zero_variance(j) {
                column.fill(0.0);
            } else {
                let (mean, std) = (self.means[j], self.stds[j]);
                column.mapv_inplace(|v| (v - mean) / std);
            }
        }
        out
    }
}

/// Standardized feature matrix with the parameters that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledMatrix {
    values: Array2<f64>,
    feature_names: Vec<String>,
    scaler: FittedScaler,
    mode: ScalingMode,
}

impl ScaledMatrix {
    pub fn values(&self) -> &Array2<f64> {
        &self.values
    }

    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    pub fn scaler(&self) -> &FittedScaler {
        &self.scaler
    }

    pub fn mode(&self) -> ScalingMode {
        self.mode
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    /// Names of columns that had zero variance over the fitted rows.
    pub fn zero_variance_features(&self) -> Vec<&str> {
        self.feature_names
            .iter()
            .enumerate()
            .filter(|(j, _)| self.scaler.is_zero_variance(*j))
            .map(|(_, name)| name.as_str())
            .collect()
    }
}

/// Fits and applies standardization to a feature matrix.
pub struct FeatureScaler;

impl FeatureScaler {
    /// Fit on the full matrix and transform it.
    pub fn fit_transform(x: &Array2<f64>, feature_names: Vec<String>) -> ScaledMatrix {
        let scaler = FittedScaler::fit(x.view());
        ScaledMatrix {
            values: scaler.transform(x.view()),
            feature_names,
            scaler,
            mode: ScalingMode::Global,
        }
    }

    /// Fit on `rows` only, then transform the full matrix.
    pub fn fit_on_rows(
        x: &Array2<f64>,
        feature_names: Vec<String>,
        rows: Range<usize>,
    ) -> ScaledMatrix {
        let end = rows.end.min(x.nrows());
        let start = rows.start.min(end);
        let scaler = FittedScaler::fit(x.slice(ndarray::s![start..end, ..]));
        ScaledMatrix {
            values: scaler.transform(x.view()),
            feature_names,
            scaler,
            mode: ScalingMode::TrainOnly,
        }
    }

    /// Dispatch on `mode`. `train_rows` is ignored for `Global`.
    pub fn scale(
        x: &Array2<f64>,
        feature_names: Vec<String>,
        mode: ScalingMode,
        train_rows: Range<usize>,
    ) -> ScaledMatrix {
        match mode {
            ScalingMode::Global => Self::fit_transform(x, feature_names),
            ScalingMode::TrainOnly => Self::fit_on_rows(x, feature_names, train_rows),
        }
    }
}
