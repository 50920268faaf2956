//! Pipeline error taxonomy.
//!
//! Every failure aborts the run; there is no partial-result mode. Each variant
//! knows the stage that raised it so callers can print one terminal line naming
//! the stage and the offending column or partition.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Pipeline stage that raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingest,
    Align,
    Fill,
    Merge,
    Scale,
    Split,
    Fit,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingest => "ingest",
            Stage::Align => "align",
            Stage::Fill => "fill",
            Stage::Merge => "merge",
            Stage::Scale => "scale",
            Stage::Split => "split",
            Stage::Fit => "fit",
        };
        f.write_str(name)
    }
}

/// Train or test side of a temporal split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Partition {
    Train,
    Test,
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Train => f.write_str("train"),
            Partition::Test => f.write_str("test"),
        }
    }
}

/// Fatal pipeline errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("[{stage}] data unavailable: column '{column}' never received a value")]
    DataUnavailable { stage: Stage, column: String },

    #[error("[merge] schema conflict on column '{column}': {detail}")]
    SchemaConflict { column: String, detail: String },

    #[error("[split] insufficient data: {partition} partition would hold {rows} of {total} rows")]
    InsufficientData {
        partition: Partition,
        rows: usize,
        total: usize,
    },

    #[error("[fit] singular feature set: linearly dependent features [{}]", .features.join(", "))]
    SingularFeatureSet { features: Vec<String> },

    #[error("[scale] no feature columns left after excluding target '{target}'")]
    EmptyFeatureSet { target: String },

    #[error("[ingest] invalid series '{series}': {detail}")]
    InvalidSeries { series: String, detail: String },
}

impl PipelineError {
    /// The stage that raised this error.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::DataUnavailable { stage, .. } => *stage,
            PipelineError::SchemaConflict { .. } => Stage::Merge,
            PipelineError::InsufficientData { .. } => Stage::Split,
            PipelineError::SingularFeatureSet { .. } => Stage::Fit,
            PipelineError::EmptyFeatureSet { .. } => Stage::Scale,
            PipelineError::InvalidSeries { .. } => Stage::Ingest,
        }
    }
}
