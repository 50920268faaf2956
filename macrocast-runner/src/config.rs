//! Serializable forecast configuration.
//!
//! Loaded from TOML. Only `target_column` is required; every other option has
//! a default.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use macrocast_core::data::ColumnClassifier;
use macrocast_core::features::ScalingMode;
use macrocast_core::model::{RankingOrder, SingularPolicy};

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config field '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Options for a single forecasting run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastConfig {
    /// Column to forecast (e.g. "CPI").
    pub target_column: String,

    /// Fraction of rows held out for testing, taken from the end.
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Days before the latest test date included in the display window.
    #[serde(default = "default_display_window_days")]
    pub display_window_days: u32,

    /// Case-insensitive substring marking sentiment-like columns.
    #[serde(default = "default_sentiment_pattern")]
    pub sentiment_name_pattern: String,

    /// Rows the feature scaler is fitted on.
    #[serde(default)]
    pub scaling: ScalingMode,

    /// Coefficient ranking order.
    #[serde(default)]
    pub ranking: RankingOrder,

    /// Behaviour on a rank-deficient design matrix.
    #[serde(default)]
    pub on_singular: SingularPolicy,

    /// Columns withheld from the features besides the target (e.g. other targets).
    #[serde(default)]
    pub exclude_columns: Vec<String>,

    /// Number of ranked features shown in summaries.
    #[serde(default = "default_top_features")]
    pub top_features: usize,
}

fn default_test_fraction() -> f64 {
    0.3
}

fn default_display_window_days() -> u32 {
    365
}

fn default_sentiment_pattern() -> String {
    "sentiment".into()
}

fn default_top_features() -> usize {
    10
}

impl ForecastConfig {
    /// Config with defaults for everything but the target.
    pub fn new(target_column: impl Into<String>) -> Self {
        Self {
            target_column: target_column.into(),
            test_fraction: default_test_fraction(),
            display_window_days: default_display_window_days(),
            sentiment_name_pattern: default_sentiment_pattern(),
            scaling: ScalingMode::default(),
            ranking: RankingOrder::default(),
            on_singular: SingularPolicy::default(),
            exclude_columns: Vec::new(),
            top_features: default_top_features(),
        }
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.target_column.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "target_column",
                reason: "must not be empty".into(),
            });
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(ConfigError::Invalid {
                field: "test_fraction",
                reason: format!("must be in (0, 1), got {}", self.test_fraction),
            });
        }
        if self.display_window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "display_window_days",
                reason: "must be at least 1".into(),
            });
        }
        if self.sentiment_name_pattern.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "sentiment_name_pattern",
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Column classifier built from `sentiment_name_pattern`.
    pub fn classifier(&self) -> ColumnClassifier {
        ColumnClassifier::name_contains(&self.sentiment_name_pattern)
    }

    /// True if `column` must not be used as a feature.
    pub fn is_excluded(&self, column: &str) -> bool {
        column == self.target_column || self.exclude_columns.iter().any(|c| c == column)
    }
}

/// One wide CSV input: a `date` column plus one column per series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputSpec {
    pub path: PathBuf,
    /// Source identifier recorded as provenance for every column in the file.
    pub source: String,
    /// Optional unit per column name.
    #[serde(default)]
    pub units: BTreeMap<String, String>,
}

/// Full run manifest for the CLI: forecast options plus inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    pub forecast: ForecastConfig,
    #[serde(default)]
    pub inputs: Vec<InputSpec>,
}

impl RunManifest {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let manifest: Self = toml::from_str(s)?;
        manifest.forecast.validate()?;
        Ok(manifest)
    }

    /// Load a manifest. Relative input paths resolve against the manifest's directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut manifest = Self::from_toml_str(&text)?;
        if let Some(dir) = path.parent() {
            for input in &mut manifest.inputs {
                if input.path.is_relative() {
                    input.path = dir.join(&input.path);
                }
            }
        }
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_only_target_given() {
        let config = ForecastConfig::from_toml_str(r#"target_column = "CPI""#).unwrap();
        assert_eq!(config, ForecastConfig::new("CPI"));
        assert_eq!(config.test_fraction, 0.3);
        assert_eq!(config.display_window_days, 365);
        assert_eq!(config.sentiment_name_pattern, "sentiment");
        assert_eq!(config.scaling, ScalingMode::Global);
        assert_eq!(config.ranking, RankingOrder::Signed);
        assert_eq!(config.on_singular, SingularPolicy::Fail);
        assert_eq!(config.top_features, 10);
    }

    #[test]
    fn parses_all_options() {
        let config = ForecastConfig::from_toml_str(
            r#"
            target_column = "Unemployment Rate"
            test_fraction = 0.2
            display_window_days = 90
            sentiment_name_pattern = "tone"
            scaling = "train_only"
            ranking = "magnitude"
            on_singular = "drop_dependent"
            exclude_columns = ["CPI"]
            top_features = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.scaling, ScalingMode::TrainOnly);
        assert_eq!(config.ranking, RankingOrder::Magnitude);
        assert_eq!(config.on_singular, SingularPolicy::DropDependent);
        assert!(config.is_excluded("CPI"));
        assert!(config.is_excluded("Unemployment Rate"));
        assert!(!config.is_excluded("PPI"));
    }

    #[test]
    fn rejects_out_of_range_test_fraction() {
        for bad in ["0.0", "1.0", "-0.1", "1.5", "nan"] {
            let toml = format!("target_column = \"CPI\"\ntest_fraction = {bad}");
            let err = ForecastConfig::from_toml_str(&toml).unwrap_err();
            assert!(
                matches!(err, ConfigError::Invalid { field: "test_fraction", .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn rejects_missing_target() {
        assert!(matches!(
            ForecastConfig::from_toml_str("test_fraction = 0.3"),
            Err(ConfigError::Parse(_))
        ));
        assert!(ForecastConfig::from_toml_str(r#"target_column = "  ""#).is_err());
    }

    #[test]
    fn manifest_with_inputs() {
        let manifest = RunManifest::from_toml_str(
            r#"
            [forecast]
            target_column = "CPI"
            exclude_columns = ["Unemployment Rate"]

            [[inputs]]
            path = "raw/historical_macro_features.csv"
            source = "fred"
            units = { CPI = "index" }

            [[inputs]]
            path = "raw/daily_news_sentiment.csv"
            source = "newsapi"
            "#,
        )
        .unwrap();
        assert_eq!(manifest.inputs.len(), 2);
        assert_eq!(manifest.inputs[0].units["CPI"], "index");
        assert!(manifest.inputs[1].units.is_empty());
    }

    #[test]
    fn classifier_uses_pattern() {
        let mut config = ForecastConfig::new("CPI");
        config.sentiment_name_pattern = "Tone".into();
        let class = config.classifier().classify("headline_tone");
        assert_eq!(class, macrocast_core::data::ColumnClass::Sentiment);
    }
}
