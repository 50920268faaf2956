//! Macrocast Core: the time-aligned feature pipeline and model primitives.
//!
//! This crate contains the pure stages of a forecasting run:
//! - Series and provenance types, and the `SeriesSource` seam for providers
//! - Daily calendar alignment with forward fill (no interpolation)
//! - Column-class fill policy (macro/market vs. sentiment-like)
//! - Provenance-aware outer merge into a feature table
//! - Feature standardization (global or train-only)
//! - Temporal train/test split, OLS fit and coefficient ranking
//!
//! Every stage takes its input by value or reference and returns a new
//! artifact; nothing here holds process-wide state.

pub mod data;
pub mod error;
pub mod features;
pub mod model;
pub mod series;

pub use error::{Partition, PipelineError, Stage};
pub use series::{Observation, Provenance, TimeSeries};
