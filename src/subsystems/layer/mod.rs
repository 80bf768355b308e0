//! Kₜ/Rₜ coherence layer: scores each turn and decides when to segment.
//!
//! The layer keeps short Kₜ (coherence) and Rₜ (recursion) histories. A
//! segment fires either on accelerating coherence collapse under high
//! recursion, or when recursion saturates while coherence sits in a low
//! basin. After a segment the layer enters a cooldown in which only a
//! steeper collapse re-triggers.

pub mod heuristics;
pub mod state;

use serde::{Deserialize, Serialize};
use serde_json::json;
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::core::config::LayerConfig;
use crate::core::json::to_spaced_string;

pub use heuristics::{clamp01, estimate_coherence, estimate_recursion, has_word_run};
pub use state::{Invariants, LayerState};

pub const SEGMENT_REASON: &str = "LAST_RECOVERABLE_MOMENT";

const INVARIANT_SCAN_LINES: usize = 8;
const INVARIANT_MAX: usize = 10;

/// Metrics reported after each turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnMetrics {
    pub turn: i64,
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub cooldown: bool,
    pub trace_hash: String,
}

/// Context handed forward when the layer segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeedPack {
    pub reason: String,
    pub turn: i64,
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    #[serde(rename = "Kt_slope_2")]
    pub kt_slope_2: f64,
    pub invariants: Invariants,
    pub trace_hash: String,
}

#[derive(Debug, Clone)]
pub struct CoherenceLayer {
    cfg: LayerConfig,
    state: LayerState,
}

impl CoherenceLayer {
    pub fn new(cfg: LayerConfig) -> Self {
        let state = LayerState::from_config(&cfg);
        Self { cfg, state }
    }

    pub fn with_state(cfg: LayerConfig, state: LayerState) -> Self {
        Self { cfg, state }
    }

    pub fn state(&self) -> &LayerState {
        &self.state
    }

    pub fn into_state(self) -> LayerState {
        self.state
    }

    /// Score one turn and advance the state.
    pub fn update(&mut self, text: &str) -> TurnMetrics {
        let s = &mut self.state;
        let k = estimate_coherence(text, &mut s.last_tokens);
        let r = estimate_recursion(text);

        s.turn_index += 1;
        push_capped(&mut s.k_hist, k, self.cfg.history_len);
        push_capped(&mut s.r_hist, r, self.cfg.history_len);

        s.kt_slope_2 = match s.k_hist.len() {
            n if n >= 3 => (s.k_hist[n - 1] - s.k_hist[n - 3]) / 2.0,
            _ => 0.0,
        };
        s.k_t = k;
        s.r_t = r;
        s.trace_hash = trace_hash(&s.k_hist, &s.r_hist, s.turn_index);

        if s.cooldown_active {
            s.cooldown_turns_left -= 1;
            let served = s.turn_index - s.last_segment_turn >= s.cooldown_min_turns;
            if served && s.cooldown_turns_left <= 0 && s.k_t >= s.cooldown_exit_k {
                s.cooldown_active = false;
                debug!(turn = s.turn_index, "cooldown ended");
            }
        }

        TurnMetrics {
            turn: s.turn_index,
            k_t: s.k_t,
            r_t: s.r_t,
            kt_slope_2: s.kt_slope_2,
            cooldown: s.cooldown_active,
            trace_hash: s.trace_hash.clone(),
        }
    }

    pub fn should_segment(&self) -> bool {
        let s = &self.state;
        let c = &self.cfg;
        let acceleration = s.kt_slope_2 < c.collapse_slope && s.r_t > c.recursion_high;
        let saturation = s.r_t > c.recursion_high
            && s.k_t < c.coherence_low
            && s.k_hist.len() >= 3
            && s.k_hist[s.k_hist.len() - 3..].iter().all(|&k| k < c.coherence_low);
        let trigger = acceleration || saturation;

        if s.cooldown_active {
            trigger && s.kt_slope_2 < c.cooldown_collapse_slope
        } else {
            trigger
        }
    }

    /// Cut here: keep the invariant lines from `buffer` and enter cooldown.
    pub fn segment(&mut self, buffer: &[String]) -> SeedPack {
        let s = &mut self.state;
        s.invariants = extract_invariants(buffer);
        s.cooldown_active = true;
        s.cooldown_turns_left = self.cfg.cooldown_turns;
        s.last_segment_turn = s.turn_index;

        info!(
            turn = s.turn_index,
            k_t = s.k_t,
            r_t = s.r_t,
            invariants = s.invariants.constraints.len(),
            "segmenting"
        );

        SeedPack {
            reason: SEGMENT_REASON.to_string(),
            turn: s.turn_index,
            k_t: s.k_t,
            r_t: s.r_t,
            kt_slope_2: s.kt_slope_2,
            invariants: s.invariants.clone(),
            trace_hash: s.trace_hash.clone(),
        }
    }
}

fn push_capped(hist: &mut Vec<f64>, value: f64, cap: usize) {
    hist.push(value);
    if hist.len() > cap {
        hist.drain(..hist.len() - cap);
    }
}

/// First 16 hex chars of SHA-256 over `{"K": [...], "R": [...], "t": n}`.
pub fn trace_hash(k_hist: &[f64], r_hist: &[f64], turn: i64) -> String {
    let payload = json!({ "K": k_hist, "R": r_hist, "t": turn });
    let text = to_spaced_string(&payload).unwrap_or_default();
    let digest = Sha256::digest(text.as_bytes());
    hex::encode(digest)[..16].to_string()
}

/// Structural lines (`-` bullets, `#` headings) among the last 8 buffer lines.
pub fn extract_invariants(buffer: &[String]) -> Invariants {
    let start = buffer.len().saturating_sub(INVARIANT_SCAN_LINES);
    let constraints = buffer[start..]
        .iter()
        .map(|l| l.trim())
        .filter(|l| l.starts_with('-') || l.starts_with('#'))
        .take(INVARIANT_MAX)
        .map(str::to_string)
        .collect();
    Invariants { constraints }
}
