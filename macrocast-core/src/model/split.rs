//! Temporal train/test partitioning.
//!
//! Rows are split by position only: the earliest rows train, the latest rows
//! test. Nothing is shuffled, so no future row can reach the fit.

use ndarray::{ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::error::{Partition, PipelineError};

/// Contiguous train and test row ranges over the same table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitResult {
    pub train: Range<usize>,
    pub test: Range<usize>,
}

impl SplitResult {
    pub fn train_len(&self) -> usize {
        self.train.len()
    }

    pub fn test_len(&self) -> usize {
        self.test.len()
    }

    pub fn total(&self) -> usize {
        self.test.end
    }

    /// Train and test row views of a feature matrix.
    pub fn split_rows<'a>(&self, x: ArrayView2<'a, f64>) -> (ArrayView2<'a, f64>, ArrayView2<'a, f64>) {
        let (train, test) = x.split_at(Axis(0), self.train.end);
        (train, test)
    }

    /// Train and test slices of a target vector.
    pub fn split_target<'a>(&self, y: ArrayView1<'a, f64>) -> (ArrayView1<'a, f64>, ArrayView1<'a, f64>) {
        y.split_at(Axis(0), self.train.end)
    }
}

/// Split `n_rows` into a leading train range and a trailing test range.
///
/// The test partition holds `round(n_rows * test_fraction)` rows. Fails with
/// `InsufficientData` if either side would be empty.
pub fn temporal_split(n_rows: usize, test_fraction: f64) -> Result<SplitResult, PipelineError> {
    let raw = (n_rows as f64 * test_fraction).round();
    let n_test = if raw.is_finite() && raw > 0.0 {
        (raw as usize).min(n_rows)
    } else {
        0
    };
    let n_train = n_rows - n_test;

    if n_train == 0 {
        return Err(PipelineError::InsufficientData {
            partition: Partition::Train,
            rows: 0,
            total: n_rows,
        });
    }
    if n_test == 0 {
        return Err(PipelineError::InsufficientData {
            partition: Partition::Test,
            rows: 0,
            total: n_rows,
        });
    }

    Ok(SplitResult {
        train: 0..n_train,
        test: n_train..n_rows,
    })
}
