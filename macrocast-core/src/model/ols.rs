//! Ordinary least squares with an intercept.
//!
//! Solves the centered normal equations `(Xc'Xc) b = Xc'yc` with an
//! incremental Cholesky factorization. Centering absorbs the intercept, so a
//! column that is constant over the train rows duplicates the intercept.
//! Centering a non-zero constant leaves rounding noise rather than an exact
//! zero, so constancy is judged on the raw column: identical values, or a
//! centered sum of squares negligible next to the uncentered one. Otherwise a
//! pivot that collapses below a relative tolerance marks the column as
//! dependent on the columns before it.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PipelineError;

/// Relative pivot tolerance for declaring a column linearly dependent.
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Centered over uncentered sum of squares below which a column counts as
/// constant.
const CONSTANT_TOLERANCE: f64 = 1e-20;

/// What to do when the design matrix is rank-deficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SingularPolicy {
    /// Fail with `SingularFeatureSet`.
    #[default]
    Fail,
    /// Drop each feature that is a linear combination of earlier ones and fit
    /// on the rest. Dropped features get a zero coefficient.
    DropDependent,
}

/// Fitted linear model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    pub intercept: f64,
    /// One coefficient per input feature, zero for dropped ones.
    pub coefficients: Vec<f64>,
    /// Indices of features dropped as linearly dependent.
    pub dropped: Vec<usize>,
}

impl LinearModel {
    pub fn predict(&self, x: ArrayView2<f64>) -> Array1<f64> {
        x.dot(&Array1::from(self.coefficients.clone())) + self.intercept
    }
}

/// Fit `y ~ intercept + x` by least squares.
///
/// `feature_names` must match the columns of `x`; it only labels errors.
pub fn fit_ols(
    x: ArrayView2<f64>,
    y: ArrayView1<f64>,
    feature_names: &[String],
    policy: SingularPolicy,
) -> Result<LinearModel, PipelineError> {
    let n = x.nrows();
    let p = x.ncols();
    debug_assert_eq!(n, y.len());
    debug_assert_eq!(p, feature_names.len());

    let x_mean = x
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(p));
    let y_mean = y.mean().unwrap_or(0.0);
    let xc = &x - &x_mean;
    let yc = &y - y_mean;

    let gram = xc.t().dot(&xc);
    let rhs = xc.t().dot(&yc);

    // Rows of the lower-triangular factor for the accepted columns.
    let mut factor: Vec<Vec<f64>> = Vec::with_capacity(p);
    let mut active: Vec<usize> = Vec::with_capacity(p);
    let mut dropped: Vec<usize> = Vec::new();

    for j in 0..p {
        let mut row: Vec<f64> = Vec::with_capacity(active.len() + 1);
        for (i, &a) in active.iter().enumerate() {
            let partial: f64 = (0..i).map(|k| factor[i][k] * row[k]).sum();
            row.push((gram[[j, a]] - partial) / factor[i][i]);
        }
        let diag = gram[[j, j]];
        let pivot = diag - row.iter().map(|v| v * v).sum::<f64>();

        if is_constant(x.column(j), diag) || pivot <= PIVOT_TOLERANCE * diag {
            dropped.push(j);
            continue;
        }
        row.push(pivot.sqrt());
        factor.push(row);
        active.push(j);
    }

    if !dropped.is_empty() {
        let names: Vec<String> = dropped.iter().map(|&j| feature_names[j].clone()).collect();
        match policy {
            SingularPolicy::Fail => {
                return Err(PipelineError::SingularFeatureSet { features: names });
            }
            SingularPolicy::DropDependent if active.is_empty() => {
                return Err(PipelineError::SingularFeatureSet { features: names });
            }
            SingularPolicy::DropDependent => {
                warn!(dropped = ?names, "dropping linearly dependent features");
            }
        }
    }

    // Forward substitution: L z = rhs[active].
    let m = active.len();
    let mut z = vec![0.0; m];
    for i in 0..m {
        let partial: f64 = (0..i).map(|k| factor[i][k] * z[k]).sum();
        z[i] = (rhs[active[i]] - partial) / factor[i][i];
    }
    // Back substitution: L' b = z.
    let mut b = vec![0.0; m];
    for i in (0..m).rev() {
        let partial: f64 = (i + 1..m).map(|k| factor[k][i] * b[k]).sum();
        b[i] = (z[i] - partial) / factor[i][i];
    }

    let mut coefficients = vec![0.0; p];
    for (slot, &j) in active.iter().enumerate() {
        coefficients[j] = b[slot];
    }
    let intercept = y_mean
        - coefficients
            .iter()
            .zip(x_mean.iter())
            .map(|(c, m)| c * m)
            .sum::<f64>();

    debug!(rows = n, features = p, fitted = m, intercept, "fitted OLS model");

    Ok(LinearModel {
        intercept,
        coefficients,
        dropped,
    })
}

/// True if `column` carries no variation beyond rounding. `centered_ss` is
/// the column's centered sum of squares.
fn is_constant(column: ArrayView1<f64>, centered_ss: f64) -> bool {
    let Some(&first) = column.first() else {
        return true;
    };
    if column.iter().all(|&v| v == first) || centered_ss <= f64::MIN_POSITIVE {
        return true;
    }
    let raw_ss = column.dot(&column);
    centered_ss <= CONSTANT_TOLERANCE * raw_ss
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    fn names(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("f{i}")).collect()
    }

    #[test]
    fn recovers_exact_linear_relation() {
        let x = array![[1.0, 0.0], [2.0, 1.0], [3.0, 0.0], [4.0, 1.0], [5.0, 3.0]];
        let y: Array1<f64> = x.column(0).mapv(|v| 2.0 * v) + x.column(1).mapv(|v| -0.5 * v) + 7.0;

        let model = fit_ols(x.view(), y.view(), &names(2), SingularPolicy::Fail).unwrap();
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.coefficients[1] + 0.5).abs() < 1e-9);
        assert!((model.intercept - 7.0).abs() < 1e-9);
        assert!(model.dropped.is_empty());

        let preds = model.predict(x.view());
        for (p, t) in preds.iter().zip(y.iter()) {
            assert!((p - t).abs() < 1e-9);
        }
    }

    #[test]
    fn duplicate_column_fails_by_default() {
        let x = array![[1.0, 1.0], [2.0, 2.0], [3.0, 3.0], [4.0, 4.0]];
        let y = array![1.0, 2.0, 3.0, 5.0];
        let err = fit_ols(x.view(), y.view(), &names(2), SingularPolicy::Fail).unwrap_err();
        assert_eq!(
            err,
            PipelineError::SingularFeatureSet {
                features: vec!["f1".into()]
            }
        );
    }

    #[test]
    fn constant_column_is_dependent_on_intercept() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0]];
        let y = array![2.0, 4.0, 6.0];
        let err = fit_ols(x.view(), y.view(), &names(2), SingularPolicy::Fail).unwrap_err();
        assert!(matches!(err, PipelineError::SingularFeatureSet { .. }));
    }

    #[test]
    fn nonzero_constant_column_is_dependent_on_intercept() {
        let n = 28;
        let mut x = Array2::zeros((n, 2));
        for i in 0..n {
            let t = i as f64;
            x[[i, 0]] = (0.7 * t).sin() + 0.1 * t;
            x[[i, 1]] = -0.1609;
        }
        let y: Array1<f64> = x.column(0).mapv(|v| 2.0 * v + 1.0);

        let err = fit_ols(x.view(), y.view(), &names(2), SingularPolicy::Fail).unwrap_err();
        assert_eq!(
            err,
            PipelineError::SingularFeatureSet {
                features: vec!["f1".into()]
            }
        );

        let model =
            fit_ols(x.view(), y.view(), &names(2), SingularPolicy::DropDependent).unwrap();
        assert_eq!(model.dropped, vec![1]);
        assert!((model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((model.intercept - 1.0).abs() < 1e-9);
    }

    #[test]
    fn column_varying_below_rounding_is_constant() {
        let column = array![1e6, 1e6 + 1e-9, 1e6, 1e6];
        let mean = column.mean().unwrap();
        let centered = column.mapv(|v| v - mean);
        assert!(is_constant(column.view(), centered.dot(&centered)));

        let varying = array![0.1, 0.2, 0.1, 0.3];
        let mean = varying.mean().unwrap();
        let centered = varying.mapv(|v| v - mean);
        assert!(!is_constant(varying.view(), centered.dot(&centered)));
    }

    #[test]
    fn drop_dependent_fits_remaining_features() {
        let x = array![[1.0, 2.0, 0.5], [2.0, 4.0, 0.1], [3.0, 6.0, 0.9], [4.0, 8.0, 0.3], [5.0, 10.0, 0.2]];
        let y: Array1<f64> = x.column(0).mapv(|v| 3.0 * v) + x.column(2).mapv(|v| 1.5 * v) - 1.0;

        let model =
            fit_ols(x.view(), y.view(), &names(3), SingularPolicy::DropDependent).unwrap();
        assert_eq!(model.dropped, vec![1]);
        assert_eq!(model.coefficients[1], 0.0);
        assert!((model.coefficients[0] - 3.0).abs() < 1e-9);
        assert!((model.coefficients[2] - 1.5).abs() < 1e-9);
        assert!((model.intercept + 1.0).abs() < 1e-9);
    }

    #[test]
    fn all_dependent_fails_even_when_dropping() {
        let x: Array2<f64> = Array2::zeros((4, 2));
        let y = array![1.0, 2.0, 3.0, 4.0];
        let result = fit_ols(x.view(), y.view(), &names(2), SingularPolicy::DropDependent);
        assert!(result.is_err());
    }

    #[test]
    fn more_features_than_rows_is_singular() {
        let x = array![[1.0, 0.0, 3.0], [0.0, 1.0, 5.0]];
        let y = array![1.0, 2.0];
        let result = fit_ols(x.view(), y.view(), &names(3), SingularPolicy::Fail);
        assert!(matches!(result, Err(PipelineError::SingularFeatureSet { .. })));
    }
}
