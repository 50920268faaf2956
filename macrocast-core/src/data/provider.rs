//! Series source trait and structured fetch errors.
//!
//! The SeriesSource trait abstracts over data providers (FRED, Yahoo Finance,
//! news sentiment aggregation, CSV import) so the pipeline never depends on a
//! concrete HTTP client and tests can supply frozen series.

use chrono::NaiveDate;
use thiserror::Error;

use crate::series::TimeSeries;

/// Why a source could not produce its series.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FetchError {
    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("parse error at line {line}: {detail}")]
    Parse { line: usize, detail: String },
}

/// A provider of one named series over a date range.
///
/// Retries, timeouts and credentials belong to implementations; the pipeline
/// only sees the final `Result`.
pub trait SeriesSource: Send + Sync {
    /// Stable series name (e.g. "CPI", "S&P 500", "inflation_sentiment").
    fn name(&self) -> &str;

    /// Fetch the series restricted to `[start, end]`.
    fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries, FetchError>;
}

/// Source backed by an already materialized series. Used for frozen inputs.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    series: TimeSeries,
}

impl InMemorySource {
    pub fn new(series: TimeSeries) -> Self {
        Self { series }
    }
}

impl SeriesSource for InMemorySource {
    fn name(&self) -> &str {
        self.series.name()
    }

    fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries, FetchError> {
        let points = self
            .series
            .observations()
            .iter()
            .filter(|obs| obs.date >= start && obs.date <= end)
            .map(|obs| (obs.date, obs.value))
            .collect();
        TimeSeries::new(
            self.series.name(),
            self.series.provenance().clone(),
            points,
        )
        .map_err(|e| FetchError::ResponseFormatChanged(e.to_string()))
    }
}
