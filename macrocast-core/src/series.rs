//! TimeSeries: one named series of dated observations from a single source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::PipelineError;

/// Where a column came from. Two columns with the same name are the same
/// feature only if their provenance matches.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Provenance {
    /// Data source identifier (e.g. "fred", "yahoo", "newsapi").
    pub source: String,
    /// Unit of measure, if the source reports one.
    pub unit: Option<String>,
}

impl Provenance {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            unit: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.unit {
            Some(unit) => write!(f, "{} [{}]", self.source, unit),
            None => write!(f, "{}", self.source),
        }
    }
}

/// A single dated observation. `None` marks an explicitly missing value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub date: NaiveDate,
    pub value: Option<f64>,
}

/// Named series with strictly increasing dates.
///
/// Non-finite values are stored as missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeries {
    name: String,
    provenance: Provenance,
    observations: Vec<Observation>,
}

impl TimeSeries {
    /// Build a series from points that must already be strictly increasing by date.
    pub fn new(
        name: impl Into<String>,
        provenance: Provenance,
        points: Vec<(NaiveDate, Option<f64>)>,
    ) -> Result<Self, PipelineError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(PipelineError::InvalidSeries {
                series: name,
                detail: "series name is empty".into(),
            });
        }

        for pair in points.windows(2) {
            if pair[1].0 <= pair[0].0 {
                let detail = if pair[1].0 == pair[0].0 {
                    format!("duplicate date {}", pair[1].0)
                } else {
                    format!("date {} follows {}", pair[1].0, pair[0].0)
                };
                return Err(PipelineError::InvalidSeries { series: name, detail });
            }
        }

        Ok(Self {
            name,
            provenance,
            observations: points.into_iter().map(to_observation).collect(),
        })
    }

    /// Build a series from points in any order. Sorts by date and keeps the
    /// first occurrence of each duplicated date.
    pub fn canonicalize(
        name: impl Into<String>,
        provenance: Provenance,
        mut points: Vec<(NaiveDate, Option<f64>)>,
    ) -> Result<Self, PipelineError> {
        points.sort_by_key(|(date, _)| *date);
        points.dedup_by_key(|(date, _)| *date);
        Self::new(name, provenance, points)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provenance(&self) -> &Provenance {
        &self.provenance
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Dates of the first and last non-missing values. Listed dates with a
    /// missing value do not count.
    pub fn observed_span(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.first_observed()?;
        let last = self
            .observations
            .iter()
            .rev()
            .find(|obs| obs.value.is_some())
            .map(|obs| obs.date)?;
        Some((first, last))
    }

    /// Date of the first non-missing value.
    pub fn first_observed(&self) -> Option<NaiveDate> {
        self.observations
            .iter()
            .find(|obs| obs.value.is_some())
            .map(|obs| obs.date)
    }

    /// Number of non-missing values.
    pub fn observed_count(&self) -> usize {
        self.observations.iter().filter(|o| o.value.is_some()).count()
    }

    pub(crate) fn into_parts(self) -> (String, Provenance, Vec<Observation>) {
        (self.name, self.provenance, self.observations)
    }
}

fn to_observation((date, value): (NaiveDate, Option<f64>)) -> Observation {
    Observation {
        date,
        value: value.filter(|v| v.is_finite()),
    }
}
