//! Deterministic BLAKE3 fingerprints for feature tables and results.

use macrocast_core::data::FeatureTable;

use crate::result::ForecastResult;

/// Hash over column names, provenance, dates and values, in table order.
///
/// Missing cells hash differently from any observed value, so a fill change
/// always changes the hash.
pub fn dataset_hash(table: &FeatureTable) -> String {
    let mut hasher = blake3::Hasher::new();

    for column in table.columns() {
        hasher.update(column.name.as_bytes());
        hasher.update(b"\x1f");
        hasher.update(column.provenance.to_string().as_bytes());
        hasher.update(b"\x1e");
    }
    for (row, date) in table.dates().iter().enumerate() {
        hasher.update(date.to_string().as_bytes());
        for column in table.columns() {
            match column.values[row] {
                Some(v) => {
                    hasher.update(&[1]);
                    hasher.update(&v.to_le_bytes());
                }
                None => {
                    hasher.update(&[0]);
                }
            }
        }
    }

    hasher.finalize().to_hex().to_string()
}

/// Hash over the canonical JSON of a result.
pub fn result_hash(result: &ForecastResult) -> Result<String, serde_json::Error> {
    let json = serde_json::to_string(result)?;
    Ok(blake3::hash(json.as_bytes()).to_hex().to_string())
}
