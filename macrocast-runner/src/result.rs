//! Forecast result: the terminal artifact of a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use macrocast_core::features::ScalingMode;
use macrocast_core::model::FeatureWeight;

/// Current schema version for serialized results.
pub const SCHEMA_VERSION: u32 = 1;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// One test-partition row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub date: NaiveDate,
    pub actual: f64,
    pub predicted: f64,
}

/// Complete result of a forecasting run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Forecast target column.
    pub target: String,

    /// Every test row in date order. Metrics are computed over all of them.
    pub predictions: Vec<PredictionRecord>,

    /// First date of the display window (latest test date minus the window).
    pub display_start: NaiveDate,

    // ── Metrics (full test partition) ──
    pub r2: f64,
    pub rmse: f64,
    pub mae: f64,

    // ── Model ──
    pub intercept: f64,
    /// Fitted features ranked by coefficient, descending.
    pub ranked_features: Vec<FeatureWeight>,
    /// Features dropped as linearly dependent (only under `drop_dependent`).
    #[serde(default)]
    pub dropped_features: Vec<String>,
    /// Features that were constant over the scaler's fit rows.
    #[serde(default)]
    pub zero_variance_features: Vec<String>,

    // ── Provenance ──
    pub train_rows: usize,
    pub test_rows: usize,
    pub scaling: ScalingMode,
    /// BLAKE3 hash of the feature table the model was fitted on.
    pub dataset_hash: String,
}

impl ForecastResult {
    /// Test rows inside the display window. Presentation only.
    pub fn display_records(&self) -> &[PredictionRecord] {
        let start = self
            .predictions
            .partition_point(|r| r.date < self.display_start);
        &self.predictions[start..]
    }

    /// The `n` highest-ranked features.
    pub fn top_features(&self, n: usize) -> &[FeatureWeight] {
        &self.ranked_features[..n.min(self.ranked_features.len())]
    }

    /// Last date of the test partition.
    pub fn last_test_date(&self) -> Option<NaiveDate> {
        self.predictions.last().map(|r| r.date)
    }
}
