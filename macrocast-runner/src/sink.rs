//! Result sinks: where a finished forecast goes.
//!
//! A sink consumes a [`ForecastResult`] for persistence or display. The
//! pipeline never depends on what a sink does with it.

use std::path::PathBuf;

use anyhow::Result;
use tracing::info;

use crate::export::save_artifacts;
use crate::result::ForecastResult;

pub trait ResultSink {
    fn consume(&mut self, result: &ForecastResult) -> Result<()>;
}

/// Keeps every result in memory. Used by tests and embedding callers.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub results: Vec<ForecastResult>,
}

impl ResultSink for MemorySink {
    fn consume(&mut self, result: &ForecastResult) -> Result<()> {
        self.results.push(result.clone());
        Ok(())
    }
}

/// Writes the artifact bundle for each result under `output_dir`.
#[derive(Debug)]
pub struct ArtifactSink {
    output_dir: PathBuf,
    top_features: usize,
    written: Vec<PathBuf>,
}

impl ArtifactSink {
    pub fn new(output_dir: impl Into<PathBuf>, top_features: usize) -> Self {
        Self {
            output_dir: output_dir.into(),
            top_features,
            written: Vec::new(),
        }
    }

    /// Artifact directories written so far, oldest first.
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ResultSink for ArtifactSink {
    fn consume(&mut self, result: &ForecastResult) -> Result<()> {
        let dir = save_artifacts(result, &self.output_dir, self.top_features)?;
        info!(dir = %dir.display(), "artifacts saved");
        self.written.push(dir);
        Ok(())
    }
}

/// Logs metrics and the top features.
#[derive(Debug)]
pub struct LogSink {
    top_features: usize,
}

impl LogSink {
    pub fn new(top_features: usize) -> Self {
        Self { top_features }
    }
}

impl ResultSink for LogSink {
    fn consume(&mut self, result: &ForecastResult) -> Result<()> {
        info!(
            target_column = %result.target,
            r2 = result.r2,
            rmse = result.rmse,
            test_rows = result.test_rows,
            "forecast complete"
        );
        for (rank, w) in result.top_features(self.top_features).iter().enumerate() {
            info!(rank = rank + 1, feature = %w.feature, coefficient = w.coefficient, "feature");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ForecastConfig;
    use crate::pipeline::run_from_sources;
    use crate::sources::SyntheticSource;
    use chrono::NaiveDate;
    use macrocast_core::data::SeriesSource;

    fn synthetic_result() -> ForecastResult {
        let sources: Vec<Box<dyn SeriesSource>> = SyntheticSource::default_universe()
            .into_iter()
            .map(|s| Box::new(s) as Box<dyn SeriesSource>)
            .collect();
        let mut config = ForecastConfig::new("CPI");
        config.exclude_columns = vec!["Unemployment Rate".into()];
        run_from_sources(
            &sources,
            NaiveDate::from_ymd_opt(2022, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            &config,
        )
        .unwrap()
    }

    #[test]
    fn memory_sink_collects() {
        let result = synthetic_result();
        let mut sink = MemorySink::default();
        sink.consume(&result).unwrap();
        sink.consume(&result).unwrap();
        assert_eq!(sink.results.len(), 2);
        assert_eq!(sink.results[0], result);
    }

    #[test]
    fn log_sink_accepts_results() {
        let mut sink = LogSink::new(3);
        sink.consume(&synthetic_result()).unwrap();
    }
}
