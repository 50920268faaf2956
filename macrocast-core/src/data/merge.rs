//! Outer join of aligned frames on the date key.
//!
//! Columns are identified by name plus provenance. The same name arriving
//! from a different source or in a different unit is a conflict, not an
//! overwrite. The same name with the same provenance (one source delivered in
//! several batches) is coalesced.

use chrono::NaiveDate;
use ndarray::Array2;
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

use crate::data::align::{Column, Frame};
use crate::error::{PipelineError, Stage};

/// Name of the date key. No feature column may use it.
pub const DATE_KEY: &str = "date";

/// Merged, date-indexed feature table.
///
/// Dates are unique and ascending, column names are unique and never equal
/// to [`DATE_KEY`].
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    frame: Frame,
}

impl FeatureTable {
    pub fn dates(&self) -> &[NaiveDate] {
        &self.frame.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.frame.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.frame.column(name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.frame.column_names()
    }

    pub fn height(&self) -> usize {
        self.frame.height()
    }

    pub fn width(&self) -> usize {
        self.frame.columns.len()
    }

    pub fn missing_count(&self) -> usize {
        self.frame.missing_count()
    }

    pub fn as_frame(&self) -> &Frame {
        &self.frame
    }

    pub fn into_frame(self) -> Frame {
        self.frame
    }

    /// Rebuild a table from a frame produced by a previous table, e.g. after
    /// resolving fills on a merged table. Column layout is unchanged.
    pub fn from_resolved(frame: Frame) -> Self {
        Self { frame }
    }

    /// Values of one column with every row present. Fails with
    /// `DataUnavailable` if the column is absent or has a gap.
    pub fn complete_values(&self, name: &str, stage: Stage) -> Result<Vec<f64>, PipelineError> {
        let unavailable = || PipelineError::DataUnavailable {
            stage,
            column: name.to_string(),
        };
        let column = self.column(name).ok_or_else(unavailable)?;
        column
            .values
            .iter()
            .map(|v| v.ok_or_else(unavailable))
            .collect()
    }

    /// Row-major matrix of the named columns, in the given order.
    pub fn matrix(&self, names: &[String], stage: Stage) -> Result<Array2<f64>, PipelineError> {
        let mut out = Array2::zeros((self.height(), names.len()));
        for (j, name) in names.iter().enumerate() {
            let values = self.complete_values(name, stage)?;
            for (i, v) in values.into_iter().enumerate() {
                out[[i, j]] = v;
            }
        }
        Ok(out)
    }
}

/// Joins frames into one [`FeatureTable`].
pub struct DatasetMerger;

impl DatasetMerger {
    /// Outer-join `frames` on date. Output rows are the union of input dates in
    /// ascending order; a column absent from a frame is missing on that frame's
    /// dates.
    pub fn merge(frames: Vec<Frame>) -> Result<FeatureTable, PipelineError> {
        let dates: Vec<NaiveDate> = frames
            .iter()
            .flat_map(|f| f.dates.iter().copied())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let row_of: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut columns: Vec<Column> = Vec::new();
        let mut index_of: HashMap<String, usize> = HashMap::new();

        for frame in &frames {
            for incoming in &frame.columns {
                if incoming.name.eq_ignore_ascii_case(DATE_KEY) {
                    return Err(PipelineError::SchemaConflict {
                        column: incoming.name.clone(),
                        detail: format!("collides with the '{DATE_KEY}' key"),
                    });
                }

                let slot = match index_of.get(&incoming.name) {
                    Some(&slot) => {
                        let existing = &columns[slot];
                        if existing.provenance != incoming.provenance {
                            return Err(PipelineError::SchemaConflict {
                                column: incoming.name.clone(),
                                detail: format!(
                                    "provided by {} and {}",
                                    existing.provenance, incoming.provenance
                                ),
                            });
                        }
                        slot
                    }
                    None => {
                        index_of.insert(incoming.name.clone(), columns.len());
                        columns.push(Column {
                            name: incoming.name.clone(),
                            provenance: incoming.provenance.clone(),
                            values: vec![None; dates.len()],
                        });
                        columns.len() - 1
                    }
                };

                let target = &mut columns[slot];
                for (date, value) in frame.dates.iter().zip(&incoming.values) {
                    let Some(value) = value else { continue };
                    let cell = &mut target.values[row_of[date]];
                    match *cell {
                        Some(existing) if existing.to_bits() != value.to_bits() => {
                            return Err(PipelineError::SchemaConflict {
                                column: target.name.clone(),
                                detail: format!(
                                    "{} reports both {existing} and {value} on {date}",
                                    target.provenance
                                ),
                            });
                        }
                        Some(_) => {}
                        None => *cell = Some(*value),
                    }
                }
            }
        }

        debug!(
            frames = frames.len(),
            rows = dates.len(),
            columns = columns.len(),
            "merged frames on date key"
        );

        if columns.is_empty() && dates.is_empty() {
            return Err(PipelineError::DataUnavailable {
                stage: Stage::Merge,
                column: "<no frames>".into(),
            });
        }

        Ok(FeatureTable {
            frame: Frame { dates, columns },
        })
    }
}
