//! Forecaster: temporal split, scaling, OLS fit, evaluation and ranking.
//!
//! The forecaster owns no fitted state between runs. Each call to
//! [`Forecaster::forecast`] splits, scales and fits from scratch and returns a
//! fresh [`ForecastResult`].

use chrono::Duration;
use ndarray::Array1;
use tracing::{info, warn};

use macrocast_core::data::FeatureTable;
use macrocast_core::features::FeatureScaler;
use macrocast_core::model::{fit_ols, rank_coefficients, temporal_split};
use macrocast_core::{PipelineError, Stage};

use crate::config::ForecastConfig;
use crate::fingerprint::dataset_hash;
use crate::metrics::AccuracyMetrics;
use crate::result::{ForecastResult, PredictionRecord, SCHEMA_VERSION};

pub struct Forecaster {
    config: ForecastConfig,
}

impl Forecaster {
    pub fn new(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Feature columns in table order: everything but the target and the
    /// excluded columns.
    pub fn feature_columns(&self, table: &FeatureTable) -> Vec<String> {
        table
            .column_names()
            .into_iter()
            .filter(|name| !self.config.is_excluded(name))
            .map(str::to_string)
            .collect()
    }

    /// Fit on the earliest rows and evaluate on the latest.
    pub fn forecast(&self, table: &FeatureTable) -> Result<ForecastResult, PipelineError> {
        let target = &self.config.target_column;
        let features = self.feature_columns(table);
        if features.is_empty() {
            return Err(PipelineError::EmptyFeatureSet {
                target: target.clone(),
            });
        }

        let y = Array1::from(table.complete_values(target, Stage::Scale)?);
        let x = table.matrix(&features, Stage::Scale)?;

        let split = temporal_split(table.height(), self.config.test_fraction)?;
        info!(
            train = split.train_len(),
            test = split.test_len(),
            features = features.len(),
            "temporal split"
        );

        let scaled = FeatureScaler::scale(&x, features, self.config.scaling, split.train.clone());
        let zero_variance: Vec<String> = scaled
            .zero_variance_features()
            .into_iter()
            .map(str::to_string)
            .collect();
        if !zero_variance.is_empty() {
            warn!(features = ?zero_variance, "constant features scaled to zero");
        }

        let (x_train, x_test) = split.split_rows(scaled.values().view());
        let (y_train, y_test) = split.split_target(y.view());

        let model = fit_ols(
            x_train,
            y_train,
            scaled.feature_names(),
            self.config.on_singular,
        )?;

        let predicted = model.predict(x_test);
        let actual = y_test.to_vec();
        let predicted = predicted.to_vec();
        let metrics = AccuracyMetrics::compute(&actual, &predicted);
        info!(
            r2 = metrics.r2,
            rmse = metrics.rmse,
            mae = metrics.mae,
            samples = metrics.n_samples,
            "test metrics"
        );

        let names = scaled.feature_names();
        let dropped_features: Vec<String> =
            model.dropped.iter().map(|&j| names[j].clone()).collect();
        let (kept_names, kept_coefficients): (Vec<String>, Vec<f64>) = names
            .iter()
            .zip(&model.coefficients)
            .enumerate()
            .filter(|(j, _)| !model.dropped.contains(j))
            .map(|(_, (name, &c))| (name.clone(), c))
            .unzip();
        let ranked_features =
            rank_coefficients(&kept_names, &kept_coefficients, self.config.ranking);

        let test_dates = &table.dates()[split.test.clone()];
        let predictions: Vec<PredictionRecord> = test_dates
            .iter()
            .zip(actual.iter().zip(&predicted))
            .map(|(&date, (&actual, &predicted))| PredictionRecord {
                date,
                actual,
                predicted,
            })
            .collect();

        // temporal_split guarantees a non-empty test partition.
        let last = test_dates[test_dates.len() - 1];
        let display_start = last - Duration::days(i64::from(self.config.display_window_days));

        Ok(ForecastResult {
            schema_version: SCHEMA_VERSION,
            target: target.clone(),
            predictions,
            display_start,
            r2: metrics.r2,
            rmse: metrics.rmse,
            mae: metrics.mae,
            intercept: model.intercept,
            ranked_features,
            dropped_features,
            zero_variance_features: zero_variance,
            train_rows: split.train_len(),
            test_rows: split.test_len(),
            scaling: scaled.mode(),
            dataset_hash: dataset_hash(table),
        })
    }
}
