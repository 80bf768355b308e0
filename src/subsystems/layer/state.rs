//! Persisted layer state and its JSON file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::config::LayerConfig;
use crate::core::error::AppError;

/// Lines carried across a segmentation boundary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invariants {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerState {
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "K_hist")]
    pub k_hist: Vec<f64>,
    #[serde(rename = "R_hist")]
    pub r_hist: Vec<f64>,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub turn_index: i64,

    pub cooldown_active: bool,
    pub cooldown_turns_left: i64,
    #[serde(rename = "cooldown_exit_K")]
    pub cooldown_exit_k: f64,
    pub cooldown_min_turns: i64,
    pub last_segment_turn: i64,

    pub invariants: Invariants,
    pub trace_hash: String,
    /// Previous turn's lowercased token set, for overlap scoring.
    pub last_tokens: Vec<String>,
}

impl Default for LayerState {
    fn default() -> Self {
        Self::from_config(&LayerConfig::default())
    }
}

impl LayerState {
    pub fn from_config(cfg: &LayerConfig) -> Self {
        Self {
            k_t: 1.0,
            r_t: 0.0,
            k_hist: Vec::new(),
            r_hist: Vec::new(),
            kt_slope_2: 0.0,
            turn_index: 0,
            cooldown_active: false,
            cooldown_turns_left: 0,
            cooldown_exit_k: cfg.cooldown_exit_k,
            cooldown_min_turns: cfg.cooldown_min_turns,
            last_segment_turn: -10,
            invariants: Invariants::default(),
            trace_hash: String::new(),
            last_tokens: Vec::new(),
        }
    }

    /// Load state from `path`; a missing file yields a fresh state.
    pub fn load(path: &Path, cfg: &LayerConfig) -> Result<Self, AppError> {
        if !path.exists() {
            return Ok(Self::from_config(cfg));
        }
        let data = fs::read_to_string(path)
            .map_err(|e| AppError::Store(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&data)
            .map_err(|e| AppError::Store(format!("malformed {}: {e}", path.display())))
    }

    /// Write state as pretty JSON, replacing the file atomically.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)?;
        let mut tmp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        tmp_name.push(".tmp");
        let tmp = path.with_file_name(tmp_name);
        fs::write(&tmp, data)
            .map_err(|e| AppError::Store(format!("cannot write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, path)
            .map_err(|e| AppError::Store(format!("cannot replace {}: {e}", path.display())))
    }
}
