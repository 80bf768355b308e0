//! Before/after comparison of Kₜ traces.

use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::core::error::AppError;

/// Keys accepted for the Kₜ value, in priority order.
pub const KT_KEYS: [&str; 4] = ["Kt", "kt", "Kₜ", "K_t"];

#[derive(Debug, Clone, PartialEq)]
pub struct KtSummary {
    pub steps: usize,
    pub start: f64,
    pub end: f64,
    pub delta: f64,
}

/// Kₜ values from a JSONL trace. Rows without a Kₜ key are skipped; a line
/// that is not JSON is an error.
pub fn load_kt(path: &Path) -> Result<Vec<f64>, AppError> {
    let data = fs::read_to_string(path)
        .map_err(|e| AppError::Usage(format!("cannot read {}: {e}", path.display())))?;
    let mut values = Vec::new();
    for (i, line) in data.lines().enumerate().filter(|(_, l)| !l.trim().is_empty()) {
        let record: Value = serde_json::from_str(line)
            .map_err(|e| AppError::Store(format!("{}:{}: {e}", path.display(), i + 1)))?;
        if let Some(v) = KT_KEYS.iter().find_map(|k| record.get(*k)).and_then(Value::as_f64) {
            values.push(v);
        }
    }
    Ok(values)
}

pub fn summarize_kt(values: &[f64]) -> Option<KtSummary> {
    let (&start, &end) = (values.first()?, values.last()?);
    Some(KtSummary { steps: values.len(), start, end, delta: end - start })
}
