//! Reporting and export: JSON, CSV and Markdown artifact generation.
//!
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: display-window predictions, ranked features, cleaned feature table
//! - **Markdown**: human-readable run summary with the top-ranked features
//!
//! Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use macrocast_core::data::{FeatureTable, DATE_KEY};
use macrocast_core::model::FeatureWeight;

use crate::result::{ForecastResult, PredictionRecord, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_json(result: &ForecastResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize ForecastResult to JSON")
}

/// Deserialize a `ForecastResult` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<ForecastResult> {
    let result: ForecastResult =
        serde_json::from_str(json).context("failed to deserialize ForecastResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Columns: date, actual, predicted.
pub fn export_predictions_csv(records: &[PredictionRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "actual", "predicted"])?;
    for r in records {
        wtr.write_record([
            r.date.to_string(),
            r.actual.to_string(),
            r.predicted.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: rank, feature, coefficient.
pub fn export_features_csv(ranked: &[FeatureWeight]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["rank", "feature", "coefficient"])?;
    for (i, w) in ranked.iter().enumerate() {
        wtr.write_record([(i + 1).to_string(), w.feature.clone(), w.coefficient.to_string()])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Cleaned table with a leading `date` column. Missing cells are blank.
pub fn export_table_csv(table: &FeatureTable) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header = Vec::with_capacity(table.width() + 1);
    header.push(DATE_KEY);
    header.extend(table.column_names());
    wtr.write_record(&header)?;

    for (row, date) in table.dates().iter().enumerate() {
        let mut record = Vec::with_capacity(table.width() + 1);
        record.push(date.to_string());
        for column in table.columns() {
            record.push(column.values[row].map(|v| v.to_string()).unwrap_or_default());
        }
        wtr.write_record(&record)?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one forecast.
///
/// Creates `{target}_{timestamp}/` under `output_dir` containing:
/// - `result.json`: the full `ForecastResult`
/// - `predictions.csv`: display-window (date, actual, predicted) rows
/// - `features.csv`: ranked coefficients
/// - `summary.md`: Markdown summary with the top `top_n` features
///
/// Returns the path to the created directory.
pub fn save_artifacts(result: &ForecastResult, output_dir: &Path, top_n: usize) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}",
        sanitize(&result.target),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    std::fs::write(run_dir.join("result.json"), export_json(result)?)?;
    std::fs::write(
        run_dir.join("predictions.csv"),
        export_predictions_csv(result.display_records())?,
    )?;
    std::fs::write(
        run_dir.join("features.csv"),
        export_features_csv(&result.ranked_features)?,
    )?;
    std::fs::write(run_dir.join("summary.md"), generate_summary(result, top_n))?;

    Ok(run_dir)
}

/// Load a `ForecastResult` from an artifact directory's result.json.
pub fn load_artifacts(dir: &Path) -> Result<ForecastResult> {
    let path = dir.join("result.json");
    let json = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    import_json(&json)
}

/// Target names like "Unemployment Rate" become "Unemployment_Rate".
fn sanitize(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}

// ─── Markdown summary ───────────────────────────────────────────────

pub fn generate_summary(result: &ForecastResult, top_n: usize) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str(&format!("# Forecast Summary: {}\n\n", result.target));

    md.push_str("## Run\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    if let (Some(first), Some(last)) = (result.predictions.first(), result.predictions.last()) {
        md.push_str(&format!("| Test Period | {} to {} |\n", first.date, last.date));
    }
    md.push_str(&format!(
        "| Rows | {} train / {} test |\n",
        result.train_rows, result.test_rows
    ));
    md.push_str(&format!("| Scaling | {:?} |\n", result.scaling));
    md.push_str(&format!("| Display From | {} |\n", result.display_start));
    md.push_str(&format!("| Dataset Hash | {} |\n", result.dataset_hash));
    md.push('\n');

    md.push_str("## Accuracy (full test partition)\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| R² | {:.4} |\n", result.r2));
    md.push_str(&format!("| RMSE | {:.4} |\n", result.rmse));
    md.push_str(&format!("| MAE | {:.4} |\n", result.mae));
    md.push('\n');

    md.push_str(&format!("## Top {} Features\n\n", top_n.min(result.ranked_features.len())));
    md.push_str("| Rank | Feature | Coefficient |\n");
    md.push_str("| ---: | --- | ---: |\n");
    for (i, w) in result.top_features(top_n).iter().enumerate() {
        md.push_str(&format!("| {} | {} | {:.6} |\n", i + 1, w.feature, w.coefficient));
    }
    md.push_str(&format!("\nIntercept: {:.6}\n\n", result.intercept));

    if !result.dropped_features.is_empty() || !result.zero_variance_features.is_empty() {
        md.push_str("## Diagnostics\n\n");
        for name in &result.dropped_features {
            md.push_str(&format!("- dropped as linearly dependent: {name}\n"));
        }
        for name in &result.zero_variance_features {
            md.push_str(&format!("- constant over scaler fit rows: {name}\n"));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use macrocast_core::data::{Column, DatasetMerger, Frame};
    use macrocast_core::features::ScalingMode;
    use macrocast_core::Provenance;

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, day).unwrap()
    }

    fn sample() -> ForecastResult {
        ForecastResult {
            schema_version: SCHEMA_VERSION,
            target: "Unemployment Rate".into(),
            predictions: vec![
                PredictionRecord { date: d(1), actual: 4.0, predicted: 4.1 },
                PredictionRecord { date: d(2), actual: 4.2, predicted: 4.15 },
            ],
            display_start: d(2),
            r2: 0.75,
            rmse: 0.0791,
            mae: 0.075,
            intercept: 4.1,
            ranked_features: vec![
                FeatureWeight { feature: "CPI".into(), coefficient: 0.3 },
                FeatureWeight { feature: "S&P 500".into(), coefficient: 0.1 },
                FeatureWeight { feature: "inflation_sentiment".into(), coefficient: -0.2 },
            ],
            dropped_features: vec!["CPI copy".into()],
            zero_variance_features: vec![],
            train_rows: 5,
            test_rows: 2,
            scaling: ScalingMode::TrainOnly,
            dataset_hash: "deadbeef".into(),
        }
    }

    #[test]
    fn json_round_trip() {
        let result = sample();
        let back = import_json(&export_json(&result).unwrap()).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn json_rejects_future_schema() {
        let mut result = sample();
        result.schema_version = SCHEMA_VERSION + 1;
        let err = import_json(&export_json(&result).unwrap()).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn predictions_csv_has_header_and_rows() {
        let csv = export_predictions_csv(&sample().predictions).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "date,actual,predicted");
        assert_eq!(lines[1], "2024-02-01,4,4.1");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn features_csv_is_ranked() {
        let csv = export_features_csv(&sample().ranked_features).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[1], "1,CPI,0.3");
        assert_eq!(lines[3], "3,inflation_sentiment,-0.2");
    }

    #[test]
    fn table_csv_leads_with_date_and_blanks_missing() {
        let frame = Frame {
            dates: vec![d(1), d(2)],
            columns: vec![Column {
                name: "S&P 500".into(),
                provenance: Provenance::new("yahoo"),
                values: vec![Some(4800.5), None],
            }],
        };
        let table = DatasetMerger::merge(vec![frame]).unwrap();
        let csv = export_table_csv(&table).unwrap();
        assert_eq!(csv, "date,S&P 500\n2024-02-01,4800.5\n2024-02-02,\n");
    }

    #[test]
    fn summary_lists_top_features_and_diagnostics() {
        let md = generate_summary(&sample(), 2);
        assert!(md.contains("# Forecast Summary: Unemployment Rate"));
        assert!(md.contains("## Top 2 Features"));
        assert!(md.contains("| 1 | CPI | 0.300000 |"));
        assert!(!md.contains("inflation_sentiment"));
        assert!(md.contains("dropped as linearly dependent: CPI copy"));
        assert!(md.contains("| R² | 0.7500 |"));
    }

    #[test]
    fn sanitize_target_names() {
        assert_eq!(sanitize("Unemployment Rate"), "Unemployment_Rate");
        assert_eq!(sanitize("CPI"), "CPI");
    }
}
