//! Macrocast Runner: forecast orchestration, sources, metrics and export.
//!
//! This crate builds on `macrocast-core` to provide:
//! - TOML configuration and run manifests
//! - Wide CSV and deterministic synthetic series sources
//! - Pipeline orchestration from series or sources to a forecast
//! - The forecaster: temporal split, scaling, OLS fit, metrics, ranking
//! - Result sinks and JSON / CSV / Markdown artifacts
//! - BLAKE3 dataset fingerprints

pub mod config;
pub mod export;
pub mod fingerprint;
pub mod forecaster;
pub mod metrics;
pub mod pipeline;
pub mod result;
pub mod sink;
pub mod sources;

pub use config::{ConfigError, ForecastConfig, InputSpec, RunManifest};
pub use forecaster::Forecaster;
pub use metrics::AccuracyMetrics;
pub use pipeline::{
    build_feature_table, fetch_all, load_inputs, run_from_sources, run_pipeline, CleanedData,
    RunError,
};
pub use result::{ForecastResult, PredictionRecord, SCHEMA_VERSION};
pub use sink::{ArtifactSink, LogSink, MemorySink, ResultSink};
pub use sources::{read_wide_csv, SyntheticKind, SyntheticSource};
