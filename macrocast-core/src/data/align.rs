//! Daily calendar alignment.
//!
//! Reindexes series of any native frequency (daily prices, monthly prints,
//! sparse sentiment) onto one contiguous daily calendar running from the
//! first to the last observed value of any series.
//!
//! Macro/market series carry the last known value forward after their first
//! observation; dates before it stay missing for the fill stage to resolve.
//! Sentiment series are placed on their own dates only. Every other date
//! stays missing, so the fill stage reads it as "no coverage". Values are
//! never interpolated, so no date sees information from a later print.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::data::fill::{ColumnClass, ColumnClassifier};
use crate::error::{PipelineError, Stage};
use crate::series::{Provenance, TimeSeries};

/// Contiguous, inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCalendar {
    start: NaiveDate,
    end: NaiveDate,
}

impl DailyCalendar {
    /// Calendar over `[start, end]`. Returns `None` if `start > end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Calendar from the earliest to the latest observed value of any series.
    /// Listed dates whose value is missing do not extend it.
    pub fn spanning(series: &[TimeSeries]) -> Option<Self> {
        let (start, end) = series
            .iter()
            .filter_map(TimeSeries::observed_span)
            .reduce(|(lo, hi), (s, e)| (lo.min(s), hi.max(e)))?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of days in the calendar (always at least one).
    pub fn len(&self) -> usize {
        (self.end - self.start).num_days() as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        (0..self.len() as i64)
            .map(|offset| self.start + Duration::days(offset))
            .collect()
    }
}

/// One aligned column: a value or `None` per frame row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub provenance: Provenance,
    pub values: Vec<Option<f64>>,
}

impl Column {
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn is_all_missing(&self) -> bool {
        self.values.iter().all(Option::is_none)
    }
}

/// Date-indexed set of columns. Every column has one entry per date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub dates: Vec<NaiveDate>,
    pub columns: Vec<Column>,
}

impl Frame {
    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn missing_count(&self) -> usize {
        self.columns.iter().map(Column::missing_count).sum()
    }
}

/// Something the aligner noticed but did not treat as fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlignmentFlag {
    /// The series has no value anywhere in or before the calendar.
    AllMissing { series: String },
    /// The series starts observing after the calendar start.
    LeadingGap { series: String, days: usize },
}

/// Output of alignment: the frame plus any flags raised along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedFrame {
    pub frame: Frame,
    pub flags: Vec<AlignmentFlag>,
}

/// Reindexes series onto a fixed daily calendar.
///
/// The classifier decides which series carry values forward. Hand the
/// aligner the same classifier the fill resolver uses.
#[derive(Debug, Clone)]
pub struct SeriesAligner {
    calendar: DailyCalendar,
    classifier: ColumnClassifier,
}

impl SeriesAligner {
    pub fn new(calendar: DailyCalendar) -> Self {
        Self {
            calendar,
            classifier: ColumnClassifier::default(),
        }
    }

    pub fn with_classifier(mut self, classifier: ColumnClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn calendar(&self) -> DailyCalendar {
        self.calendar
    }

    /// Align every series onto the calendar. Never fails: a series with no
    /// usable value yields an all-missing column and an `AllMissing` flag.
    pub fn align(&self, series: Vec<TimeSeries>) -> AlignedFrame {
        let dates = self.calendar.dates();
        let mut columns = Vec::with_capacity(series.len());
        let mut flags = Vec::new();

        for s in series {
            let (name, provenance, observations) = s.into_parts();
            let values = match self.classifier.classify(&name) {
                ColumnClass::MacroMarket => forward_filled_on(&dates, &observations),
                ColumnClass::Sentiment => placed_on(&dates, &observations),
            };

            match values.iter().position(Option::is_some) {
                None => {
                    warn!(series = %name, "series has no observations on the calendar");
                    flags.push(AlignmentFlag::AllMissing {
                        series: name.clone(),
                    });
                }
                Some(0) => {}
                Some(days) => {
                    debug!(series = %name, days, "series starts after calendar start");
                    flags.push(AlignmentFlag::LeadingGap {
                        series: name.clone(),
                        days,
                    });
                }
            }

            columns.push(Column {
                name,
                provenance,
                values,
            });
        }

        debug!(
            start = %self.calendar.start(),
            end = %self.calendar.end(),
            days = dates.len(),
            columns = columns.len(),
            "aligned series onto daily calendar"
        );

        AlignedFrame {
            frame: Frame { dates, columns },
            flags,
        }
    }
}

/// Align series onto the calendar spanning all of them.
pub fn align_series(series: Vec<TimeSeries>) -> Result<AlignedFrame, PipelineError> {
    let calendar =
        DailyCalendar::spanning(&series).ok_or_else(|| PipelineError::DataUnavailable {
            stage: Stage::Align,
            column: series_names(&series),
        })?;
    Ok(SeriesAligner::new(calendar).align(series))
}

fn series_names(series: &[TimeSeries]) -> String {
    if series.is_empty() {
        return "<no series>".into();
    }
    series
        .iter()
        .map(TimeSeries::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Carry the last known value forward across `dates`. Observations dated
/// before the first calendar day still seed the carried value.
fn forward_filled_on(
    dates: &[NaiveDate],
    observations: &[crate::series::Observation],
) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(dates.len());
    let mut cursor = 0;
    let mut last = None;

    for date in dates {
        while cursor < observations.len() && observations[cursor].date <= *date {
            if let Some(v) = observations[cursor].value {
                last = Some(v);
            }
            cursor += 1;
        }
        out.push(last);
    }
    out
}

/// Put each observed value on its own date and leave every other date missing.
/// Observations outside `dates` are ignored.
fn placed_on(
    dates: &[NaiveDate],
    observations: &[crate::series::Observation],
) -> Vec<Option<f64>> {
    let mut out = vec![None; dates.len()];
    let Some(&start) = dates.first() else {
        return out;
    };
    for obs in observations {
        let offset = (obs.date - start).num_days();
        if offset >= 0 && (offset as usize) < out.len() {
            out[offset as usize] = obs.value;
        }
    }
    out
}
