//! Feature attribution by fitted coefficient.

use serde::{Deserialize, Serialize};

/// How coefficients are ordered in the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankingOrder {
    /// Descending by signed value. Large negative coefficients rank last.
    #[default]
    Signed,
    /// Descending by absolute value.
    Magnitude,
}

/// One feature and its fitted coefficient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureWeight {
    pub feature: String,
    pub coefficient: f64,
}

/// Pair names with coefficients and sort descending. Ties keep column order.
pub fn rank_coefficients(
    names: &[String],
    coefficients: &[f64],
    order: RankingOrder,
) -> Vec<FeatureWeight> {
    let mut ranked: Vec<FeatureWeight> = names
        .iter()
        .zip(coefficients)
        .map(|(name, &coefficient)| FeatureWeight {
            feature: name.clone(),
            coefficient,
        })
        .collect();

    match order {
        RankingOrder::Signed => ranked.sort_by(|a, b| b.coefficient.total_cmp(&a.coefficient)),
        RankingOrder::Magnitude => {
            ranked.sort_by(|a, b| b.coefficient.abs().total_cmp(&a.coefficient.abs()))
        }
    }
    ranked
}
