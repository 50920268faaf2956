//! Concrete series sources: wide CSV files and deterministic synthetic data.
//!
//! HTTP provider clients live outside this crate. These two sources cover
//! frozen inputs and offline demos.

use std::collections::BTreeMap;
use std::io::Read;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use macrocast_core::data::{FetchError, SeriesSource, DATE_KEY};
use macrocast_core::{Provenance, TimeSeries};

use crate::config::InputSpec;

// ─── Wide CSV ───────────────────────────────────────────────────────

/// Parse a wide CSV: one `date` column plus one column per series.
///
/// Blank cells are missing. Dates accept `YYYY-MM-DD`, optionally followed by
/// a time part, which is ignored. Rows may be unsorted; duplicated dates keep
/// their first row.
pub fn read_wide_csv<R: Read>(
    reader: R,
    source: &str,
    units: &BTreeMap<String, String>,
) -> Result<Vec<TimeSeries>, FetchError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| FetchError::ResponseFormatChanged(e.to_string()))?
        .clone();
    let date_idx = headers
        .iter()
        .position(|h| h.eq_ignore_ascii_case(DATE_KEY))
        .ok_or_else(|| {
            FetchError::ResponseFormatChanged(format!("missing '{DATE_KEY}' column"))
        })?;

    let names: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|(i, h)| *i != date_idx && !h.is_empty())
        .map(|(i, h)| (i, h.to_string()))
        .collect();
    let mut points: Vec<Vec<(NaiveDate, Option<f64>)>> = vec![Vec::new(); names.len()];

    for (row, record) in rdr.records().enumerate() {
        // Header is line 1.
        let line = row + 2;
        let record = record.map_err(|e| FetchError::Parse {
            line,
            detail: e.to_string(),
        })?;
        let raw_date = record.get(date_idx).unwrap_or("");
        let date = parse_date(raw_date).ok_or_else(|| FetchError::Parse {
            line,
            detail: format!("invalid date '{raw_date}'"),
        })?;

        for (slot, (col, name)) in names.iter().enumerate() {
            let cell = record.get(*col).unwrap_or("");
            let value = if cell.is_empty() {
                None
            } else {
                Some(cell.parse::<f64>().map_err(|_| FetchError::Parse {
                    line,
                    detail: format!("invalid value '{cell}' in column '{name}'"),
                })?)
            };
            points[slot].push((date, value));
        }
    }

    names
        .into_iter()
        .zip(points)
        .map(|((_, name), points)| {
            let mut provenance = Provenance::new(source);
            if let Some(unit) = units.get(&name) {
                provenance = provenance.with_unit(unit);
            }
            TimeSeries::canonicalize(name, provenance, points)
                .map_err(|e| FetchError::ResponseFormatChanged(e.to_string()))
        })
        .collect()
}

/// Load every series of one manifest input.
pub fn load_input(input: &InputSpec) -> Result<Vec<TimeSeries>, FetchError> {
    let file = std::fs::File::open(&input.path)
        .map_err(|e| FetchError::Io(format!("{}: {e}", input.path.display())))?;
    read_wide_csv(file, &input.source, &input.units)
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let day = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
}

// ─── Synthetic ──────────────────────────────────────────────────────

/// Shape of a synthetic series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntheticKind {
    /// Business-day random walk (e.g. an index or commodity price).
    DailyMarket,
    /// One observation on the first of each month.
    MonthlyMacro,
    /// Scores in [-1, 1] on roughly a third of days.
    SparseSentiment,
}

/// Deterministic synthetic series for demos and benchmarks.
///
/// The generator is seeded from the series name, so the same name and range
/// always yield the same values.
#[derive(Debug, Clone)]
pub struct SyntheticSource {
    name: String,
    provenance: Provenance,
    kind: SyntheticKind,
    base: f64,
}

impl SyntheticSource {
    pub fn new(name: impl Into<String>, source: &str, kind: SyntheticKind, base: f64) -> Self {
        Self {
            name: name.into(),
            provenance: Provenance::new(source),
            kind,
            base,
        }
    }

    /// A small macro / market / sentiment universe with CPI as a natural target.
    pub fn default_universe() -> Vec<SyntheticSource> {
        use SyntheticKind::*;
        vec![
            Self::new("CPI", "synthetic-fred", MonthlyMacro, 300.0),
            Self::new("Unemployment Rate", "synthetic-fred", MonthlyMacro, 4.0),
            Self::new("Federal Funds Rate", "synthetic-fred", MonthlyMacro, 2.5),
            Self::new("S&P 500", "synthetic-yahoo", DailyMarket, 4000.0),
            Self::new("Oil Price (WTI)", "synthetic-yahoo", DailyMarket, 75.0),
            Self::new("inflation_sentiment", "synthetic-news", SparseSentiment, 0.0),
            Self::new("economy_sentiment", "synthetic-news", SparseSentiment, 0.0),
        ]
    }

    pub fn kind(&self) -> SyntheticKind {
        self.kind
    }

    fn rng(&self) -> StdRng {
        let seed = blake3::hash(self.name.as_bytes());
        StdRng::from_seed(*seed.as_bytes())
    }

    fn generate(&self, start: NaiveDate, end: NaiveDate) -> Vec<(NaiveDate, Option<f64>)> {
        let mut rng = self.rng();
        let mut points = Vec::new();
        let mut level = self.base;
        let mut current = start;

        while current <= end {
            match self.kind {
                SyntheticKind::DailyMarket => {
                    let weekend = matches!(current.weekday(), Weekday::Sat | Weekday::Sun);
                    if !weekend {
                        level *= 1.0 + rng.gen_range(-0.02..0.02);
                        points.push((current, Some(level)));
                    }
                }
                SyntheticKind::MonthlyMacro => {
                    if current.day() == 1 {
                        level *= 1.0 + rng.gen_range(-0.004..0.008);
                        points.push((current, Some(level)));
                    }
                }
                SyntheticKind::SparseSentiment => {
                    if rng.gen_bool(0.35) {
                        points.push((current, Some(rng.gen_range(-1.0..1.0))));
                    }
                }
            }
            current += Duration::days(1);
        }
        points
    }
}

impl SeriesSource for SyntheticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn fetch(&self, start: NaiveDate, end: NaiveDate) -> Result<TimeSeries, FetchError> {
        TimeSeries::new(
            self.name.clone(),
            self.provenance.clone(),
            self.generate(start, end),
        )
        .map_err(|e| FetchError::ResponseFormatChanged(e.to_string()))
    }
}
