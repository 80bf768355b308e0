//! Append-only observation log.
//!
//! Records gate behavior after the fact. Nothing here feeds back into the
//! gate except the optional window seeding done by callers.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::error::AppError;
use crate::core::time::utc_now_iso;
use crate::subsystems::gate::{GateOutcome, GateSnapshot, STABILIZE};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub ts: String,
    pub entropy: f64,
    pub mean_entropy: f64,
    #[serde(default)]
    pub active_constraints: Vec<String>,
    pub identity_pressure: f64,
    pub dampening: f64,
}

impl Observation {
    pub fn from_outcome(outcome: &GateOutcome) -> Self {
        let s = &outcome.snapshot;
        Self {
            ts: utc_now_iso(),
            entropy: s.entropy,
            mean_entropy: s.mean_entropy,
            active_constraints: s.active_constraints.clone(),
            identity_pressure: s.identity_pressure,
            dampening: outcome.dampening,
        }
    }

    pub fn is_stabilizing(&self) -> bool {
        self.active_constraints.iter().any(|c| c == STABILIZE)
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            entropy: self.entropy,
            mean_entropy: self.mean_entropy,
            active_constraints: self.active_constraints.clone(),
            identity_pressure: self.identity_pressure,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ObservationLog {
    path: PathBuf,
}

impl ObservationLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, obs: &Observation) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let line = serde_json::to_string(obs)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Store(format!("cannot open {}: {e}", self.path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| AppError::Store(format!("cannot append {}: {e}", self.path.display())))
    }

    /// Every decodable JSON line, whatever its shape.
    pub fn load_raw(&self) -> Result<Vec<Value>, AppError> {
        Ok(self.lines()?.iter().filter_map(|l| serde_json::from_str(l).ok()).collect())
    }

    /// Every well-formed observation.
    pub fn load(&self) -> Result<Vec<Observation>, AppError> {
        Ok(self.lines()?.iter().filter_map(|l| serde_json::from_str(l).ok()).collect())
    }

    /// Well-formed observations among the last `n` lines.
    pub fn recent(&self, n: usize) -> Result<Vec<Observation>, AppError> {
        let lines = self.lines()?;
        let start = lines.len().saturating_sub(n);
        Ok(lines[start..].iter().filter_map(|l| serde_json::from_str(l).ok()).collect())
    }

    fn lines(&self) -> Result<Vec<String>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Store(format!("cannot read {}: {e}", self.path.display())))?;
        Ok(data.lines().map(str::to_string).collect())
    }
}
