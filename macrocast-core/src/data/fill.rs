//! Column-class fill policy.
//!
//! Columns are split into two classes by a single classifier:
//! - sentiment-like: missing means "no coverage", resolved to 0.0
//! - macro/market: forward fill, then backward fill for the leading gap
//!
//! A macro/market column that is still empty after both passes never
//! received a value; the run aborts with `DataUnavailable`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use crate::data::align::Frame;
use crate::error::{PipelineError, Stage};

/// Fill class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnClass {
    Sentiment,
    MacroMarket,
}

/// Decides the fill class of a column from its name.
#[derive(Clone)]
pub enum ColumnClassifier {
    /// Case-insensitive substring match. The pattern is stored lowercased.
    NameContains(String),
    /// Arbitrary predicate; `true` means sentiment-like.
    Predicate(fn(&str) -> bool),
}

impl ColumnClassifier {
    pub fn name_contains(pattern: impl AsRef<str>) -> Self {
        Self::NameContains(pattern.as_ref().to_lowercase())
    }

    pub fn classify(&self, column: &str) -> ColumnClass {
        let sentiment = match self {
            Self::NameContains(pattern) => column.to_lowercase().contains(pattern.as_str()),
            Self::Predicate(f) => f(column),
        };
        if sentiment {
            ColumnClass::Sentiment
        } else {
            ColumnClass::MacroMarket
        }
    }
}

impl fmt::Debug for ColumnClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameContains(pattern) => f.debug_tuple("NameContains").field(pattern).finish(),
            Self::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl Default for ColumnClassifier {
    fn default() -> Self {
        Self::name_contains("sentiment")
    }
}

/// What the resolver did to one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub column: String,
    pub class: ColumnClass,
    pub forward_filled: usize,
    pub backward_filled: usize,
    pub zero_filled: usize,
}

impl FillReport {
    pub fn total_filled(&self) -> usize {
        self.forward_filled + self.backward_filled + self.zero_filled
    }
}

/// Applies the class-specific missing-value rules to a frame.
#[derive(Debug, Clone, Default)]
pub struct FillPolicyResolver {
    classifier: ColumnClassifier,
}

impl FillPolicyResolver {
    pub fn new(classifier: ColumnClassifier) -> Self {
        Self { classifier }
    }

    pub fn classifier(&self) -> &ColumnClassifier {
        &self.classifier
    }

    /// Resolve every missing value in `frame`. Observed values are never
    /// overwritten.
    pub fn resolve(&self, mut frame: Frame) -> Result<(Frame, Vec<FillReport>), PipelineError> {
        let mut reports = Vec::with_capacity(frame.columns.len());

        for column in &mut frame.columns {
            let class = self.classifier.classify(&column.name);
            let mut report = FillReport {
                column: column.name.clone(),
                class,
                forward_filled: 0,
                backward_filled: 0,
                zero_filled: 0,
            };

            match class {
                ColumnClass::Sentiment => {
                    report.zero_filled = zero_fill(&mut column.values);
                }
                ColumnClass::MacroMarket => {
                    report.forward_filled = forward_fill(&mut column.values);
                    report.backward_filled = backward_fill(&mut column.values);
                    if column.values.iter().any(Option::is_none) {
                        return Err(PipelineError::DataUnavailable {
                            stage: Stage::Fill,
                            column: column.name.clone(),
                        });
                    }
                }
            }

            if report.total_filled() > 0 {
                debug!(
                    column = %report.column,
                    class = ?report.class,
                    forward = report.forward_filled,
                    backward = report.backward_filled,
                    zero = report.zero_filled,
                    "filled missing values"
                );
            }
            reports.push(report);
        }

        Ok((frame, reports))
    }
}

/// Carry the last seen value into later gaps. Returns the number of cells filled.
pub fn forward_fill(values: &mut [Option<f64>]) -> usize {
    let mut last = None;
    let mut filled = 0;
    for v in values.iter_mut() {
        if let Some(x) = *v {
            last = Some(x);
        } else if last.is_some() {
            *v = last;
            filled += 1;
        }
    }
    filled
}

/// Carry the next seen value into earlier gaps. Returns the number of cells filled.
pub fn backward_fill(values: &mut [Option<f64>]) -> usize {
    let mut next = None;
    let mut filled = 0;
    for v in values.iter_mut().rev() {
        if let Some(x) = *v {
            next = Some(x);
        } else if next.is_some() {
            *v = next;
            filled += 1;
        }
    }
    filled
}

/// Replace every gap with 0.0. Returns the number of cells filled.
pub fn zero_fill(values: &mut [Option<f64>]) -> usize {
    let mut filled = 0;
    for v in values.iter_mut().filter(|v| v.is_none()) {
        *v = Some(0.0);
        filled += 1;
    }
    filled
}
