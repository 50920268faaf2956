//! Macrocast CLI: run forecasts and export cleaned feature tables.
//!
//! Commands:
//! - `run`: forecast from a TOML manifest of CSV inputs, or from synthetic data
//! - `clean`: align, fill and merge the manifest inputs into one CSV

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::info;

use macrocast_core::data::{FillPolicyResolver, SeriesSource};
use macrocast_runner::export::export_table_csv;
use macrocast_runner::{
    build_feature_table, load_inputs, run_from_sources, run_pipeline, ArtifactSink,
    ForecastConfig, ForecastResult, LogSink, ResultSink, RunManifest, SyntheticSource,
};

#[derive(Parser)]
#[command(
    name = "macrocast",
    about = "Macrocast CLI: macro, market and sentiment feature pipeline with a linear forecaster"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fit and evaluate a forecast, then write the artifact bundle.
    Run {
        /// Path to a TOML run manifest.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Use the built-in synthetic universe instead of a manifest.
        #[arg(long, default_value_t = false)]
        synthetic: bool,

        /// Target column for synthetic runs.
        #[arg(long, default_value = "CPI")]
        target: String,

        /// Start date for synthetic runs (YYYY-MM-DD).
        #[arg(long, default_value = "2019-01-01")]
        start: String,

        /// End date for synthetic runs (YYYY-MM-DD).
        #[arg(long, default_value = "2023-12-31")]
        end: String,

        /// Output directory for artifacts.
        #[arg(long, default_value = "results")]
        output_dir: PathBuf,
    },
    /// Write the cleaned feature table (aligned, filled, merged) as CSV.
    Clean {
        /// Path to a TOML run manifest.
        #[arg(long)]
        config: PathBuf,

        /// Output CSV path.
        #[arg(long, default_value = "cleaned_features.csv")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            config,
            synthetic,
            target,
            start,
            end,
            output_dir,
        } => run_forecast_cmd(config, synthetic, target, &start, &end, &output_dir),
        Commands::Clean { config, output } => run_clean_cmd(&config, &output),
    }
}

fn run_forecast_cmd(
    config_path: Option<PathBuf>,
    synthetic: bool,
    target: String,
    start: &str,
    end: &str,
    output_dir: &Path,
) -> Result<()> {
    let (result, top_features) = match (config_path, synthetic) {
        (Some(_), true) => bail!("--config and --synthetic are mutually exclusive"),
        (None, false) => bail!("one of --config or --synthetic is required"),
        (Some(path), false) => {
            let manifest = RunManifest::load(&path)?;
            if manifest.inputs.is_empty() {
                bail!("manifest {} lists no [[inputs]]", path.display());
            }
            let series = load_inputs(&manifest.inputs)?;
            let result = run_pipeline(series, &manifest.forecast)?;
            (result, manifest.forecast.top_features)
        }
        (None, true) => {
            let start = parse_date(start)?;
            let end = parse_date(end)?;
            let mut config = ForecastConfig::new(target.as_str());
            config.exclude_columns = ["CPI", "Unemployment Rate"]
                .iter()
                .filter(|c| **c != target)
                .map(|c| c.to_string())
                .collect();
            let sources: Vec<Box<dyn SeriesSource>> = SyntheticSource::default_universe()
                .into_iter()
                .map(|s| Box::new(s) as Box<dyn SeriesSource>)
                .collect();
            info!(sources = sources.len(), %start, %end, "running on synthetic data");
            let result = run_from_sources(&sources, start, end, &config)?;
            (result, config.top_features)
        }
    };

    LogSink::new(top_features).consume(&result)?;
    let mut artifacts = ArtifactSink::new(output_dir, top_features);
    artifacts.consume(&result)?;

    print_summary(&result, top_features);
    if let Some(dir) = artifacts.written().first() {
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn run_clean_cmd(config_path: &Path, output: &Path) -> Result<()> {
    let manifest = RunManifest::load(config_path)?;
    let series = load_inputs(&manifest.inputs)?;
    let resolver = FillPolicyResolver::new(manifest.forecast.classifier());
    let cleaned = build_feature_table(series, &resolver)?;

    let csv = export_table_csv(&cleaned.table)?;
    std::fs::write(output, csv)
        .with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "Cleaned table: {} rows x {} columns -> {}",
        cleaned.table.height(),
        cleaned.table.width(),
        output.display()
    );
    Ok(())
}

fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").with_context(|| format!("invalid date '{s}'"))
}

fn print_summary(result: &ForecastResult, top_features: usize) {
    println!();
    println!("=== Forecast: {} ===", result.target);
    if let (Some(first), Some(last)) = (result.predictions.first(), result.predictions.last()) {
        println!("Test period:  {} to {}", first.date, last.date);
    }
    println!(
        "Rows:         {} train / {} test",
        result.train_rows, result.test_rows
    );
    println!("R²:           {:.4}", result.r2);
    println!("RMSE:         {:.4}", result.rmse);
    println!("MAE:          {:.4}", result.mae);
    println!();
    println!("Top features:");
    for (i, w) in result.top_features(top_features).iter().enumerate() {
        println!("  {:>2}. {:<32} {:>12.6}", i + 1, w.feature, w.coefficient);
    }
    if !result.dropped_features.is_empty() {
        println!("Dropped (dependent): {}", result.dropped_features.join(", "));
    }
    println!();
}
