//! Pipeline orchestration: series → aligned frames → filled → merged → forecast.
//!
//! Series are grouped by provenance source. Every group is aligned on one
//! shared calendar and filled on its own, then the groups are outer-joined on
//! date. The fill resolver only runs again if the join left gaps. Aligner and
//! resolver share the resolver's classifier, so a column gets the same class
//! in both stages.

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{info, warn};

use macrocast_core::data::{
    AlignmentFlag, DailyCalendar, DatasetMerger, FeatureTable, FetchError, FillPolicyResolver,
    FillReport, SeriesAligner, SeriesSource,
};
use macrocast_core::{PipelineError, Stage, TimeSeries};

use crate::config::{ConfigError, ForecastConfig, InputSpec};
use crate::forecaster::Forecaster;
use crate::result::ForecastResult;
use crate::sources::load_input;

/// Top-level error for a run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("[ingest] source '{name}' failed: {source}")]
    Source {
        name: String,
        #[source]
        source: FetchError,
    },
}

/// Cleaned feature table plus what the fill stage did to it.
#[derive(Debug, Clone)]
pub struct CleanedData {
    pub table: FeatureTable,
    pub fill_reports: Vec<FillReport>,
    pub flags: Vec<AlignmentFlag>,
}

/// Align, fill and merge `series` into one gap-free table.
pub fn build_feature_table(
    series: Vec<TimeSeries>,
    resolver: &FillPolicyResolver,
) -> Result<CleanedData, PipelineError> {
    let calendar = DailyCalendar::spanning(&series).ok_or_else(|| PipelineError::DataUnavailable {
        stage: Stage::Align,
        column: "<no observations>".into(),
    })?;
    info!(
        start = %calendar.start(),
        end = %calendar.end(),
        days = calendar.len(),
        series = series.len(),
        "aligning on daily calendar"
    );

    // First-seen order of sources keeps the column layout stable.
    let mut groups: Vec<(String, Vec<TimeSeries>)> = Vec::new();
    for s in series {
        let source = s.provenance().source.clone();
        match groups.iter_mut().find(|(name, _)| *name == source) {
            Some((_, members)) => members.push(s),
            None => groups.push((source, vec![s])),
        }
    }

    let aligner = SeriesAligner::new(calendar).with_classifier(resolver.classifier().clone());
    let mut frames = Vec::with_capacity(groups.len());
    let mut fill_reports = Vec::new();
    let mut flags = Vec::new();
    for (_, members) in groups {
        let aligned = aligner.align(members);
        flags.extend(aligned.flags);
        let (filled, reports) = resolver.resolve(aligned.frame)?;
        fill_reports.extend(reports);
        frames.push(filled);
    }

    let mut table = DatasetMerger::merge(frames)?;
    if table.missing_count() > 0 {
        warn!(
            missing = table.missing_count(),
            "merge left gaps, resolving fills again"
        );
        let (filled, reports) = resolver.resolve(table.into_frame())?;
        fill_reports.extend(reports);
        table = FeatureTable::from_resolved(filled);
    }

    info!(
        rows = table.height(),
        columns = table.width(),
        "feature table ready"
    );
    Ok(CleanedData {
        table,
        fill_reports,
        flags,
    })
}

/// Run the whole pipeline on already fetched series.
pub fn run_pipeline(
    series: Vec<TimeSeries>,
    config: &ForecastConfig,
) -> Result<ForecastResult, PipelineError> {
    let resolver = FillPolicyResolver::new(config.classifier());
    let cleaned = build_feature_table(series, &resolver)?;
    Forecaster::new(config.clone()).forecast(&cleaned.table)
}

/// Fetch every source over `[start, end]`.
///
/// A source that fails outright becomes `DataUnavailable` naming the source.
pub fn fetch_all(
    sources: &[Box<dyn SeriesSource>],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Vec<TimeSeries>, PipelineError> {
    sources
        .iter()
        .map(|source| {
            source.fetch(start, end).map_err(|e| {
                warn!(source = source.name(), error = %e, "fetch failed");
                PipelineError::DataUnavailable {
                    stage: Stage::Ingest,
                    column: source.name().to_string(),
                }
            })
        })
        .collect()
}

/// Read every manifest input. A file that cannot be read or parsed fails the run.
pub fn load_inputs(inputs: &[InputSpec]) -> Result<Vec<TimeSeries>, RunError> {
    let mut series = Vec::new();
    for input in inputs {
        let loaded = load_input(input).map_err(|source| RunError::Source {
            name: input.path.display().to_string(),
            source,
        })?;
        info!(
            path = %input.path.display(),
            source = %input.source,
            series = loaded.len(),
            "loaded input"
        );
        series.extend(loaded);
    }
    Ok(series)
}

/// Validate `config`, fetch every source, then run the pipeline.
pub fn run_from_sources(
    sources: &[Box<dyn SeriesSource>],
    start: NaiveDate,
    end: NaiveDate,
    config: &ForecastConfig,
) -> Result<ForecastResult, RunError> {
    config.validate()?;
    let series = fetch_all(sources, start, end)?;
    Ok(run_pipeline(series, config)?)
}
