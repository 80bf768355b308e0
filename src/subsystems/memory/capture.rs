//! Explicit snapshot capture. Manual invocation only.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::core::error::AppError;
use crate::core::time::utc_now_iso;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Ignored,
    Captured,
}

impl CaptureOutcome {
    pub fn message(self) -> &'static str {
        match self {
            CaptureOutcome::Ignored => "empty capture ignored",
            CaptureOutcome::Captured => "✓ snapshot captured",
        }
    }
}

#[derive(Serialize)]
struct CaptureEntry<'a> {
    ts: String,
    text: &'a str,
}

/// Append `{ts, text}` to the capture log unless the text is blank.
pub fn capture(log: &Path, text: &str) -> Result<CaptureOutcome, AppError> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(CaptureOutcome::Ignored);
    }
    if let Some(parent) = log.parent() {
        fs::create_dir_all(parent)?;
    }
    let line = serde_json::to_string(&CaptureEntry { ts: utc_now_iso(), text })?;
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log)
        .map_err(|e| AppError::Store(format!("cannot open {}: {e}", log.display())))?;
    writeln!(file, "{line}")?;
    Ok(CaptureOutcome::Captured)
}
