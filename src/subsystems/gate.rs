//! Entropy gate: observe, constrain, signal restraint.
//!
//! Each processed text contributes its character entropy to a rolling
//! window. When the window mean exceeds `entropy_max` the gate raises the
//! `stabilize` constraint and reports a dampening factor below 1.0. The gate
//! never generates or stores anything itself.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::config::ControlConfig;

pub const STABILIZE: &str = "stabilize";

/// What the gate saw on one input. Entropy values are rounded to 4 places.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GateSnapshot {
    pub entropy: f64,
    pub mean_entropy: f64,
    pub active_constraints: Vec<String>,
    pub identity_pressure: f64,
}

impl GateSnapshot {
    pub fn is_stabilizing(&self) -> bool {
        self.active_constraints.iter().any(|c| c == STABILIZE)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateOutcome {
    #[serde(flatten)]
    pub snapshot: GateSnapshot,
    pub dampening: f64,
}

#[derive(Debug, Clone)]
pub struct EntropyGate {
    window: VecDeque<f64>,
    window_size: usize,
    entropy_max: f64,
    stabilize_dampening: f64,
    identity_pressure: f64,
}

impl EntropyGate {
    pub fn new(cfg: &ControlConfig) -> Self {
        let window_size = cfg.window_size.max(1);
        Self {
            window: VecDeque::with_capacity(window_size),
            window_size,
            entropy_max: cfg.entropy_max,
            stabilize_dampening: cfg.stabilize_dampening,
            identity_pressure: 0.0,
        }
    }

    /// Seed the window with previously observed entropies, oldest first.
    /// Only the most recent `window_size` values are kept.
    pub fn with_history(mut self, entropies: impl IntoIterator<Item = f64>) -> Self {
        for e in entropies {
            self.push(e);
        }
        self
    }

    pub fn entropy_max(&self) -> f64 {
        self.entropy_max
    }

    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    fn push(&mut self, entropy: f64) {
        if self.window.len() == self.window_size {
            self.window.pop_front();
        }
        self.window.push_back(entropy);
    }

    fn mean(&self) -> f64 {
        if self.window.is_empty() {
            0.0
        } else {
            self.window.iter().sum::<f64>() / self.window.len() as f64
        }
    }

    pub fn process(&mut self, text: &str) -> GateOutcome {
        let signal = text.trim();
        let entropy = measure_entropy(signal);
        self.push(entropy);
        let mean = self.mean();

        let mut active_constraints = Vec::new();
        if mean > self.entropy_max {
            active_constraints.push(STABILIZE.to_string());
        }
        let dampening = if active_constraints.is_empty() { 1.0 } else { self.stabilize_dampening };

        debug!(entropy, mean, entropy_max = self.entropy_max, dampening, "gate processed");

        GateOutcome {
            snapshot: GateSnapshot {
                entropy: round_to(entropy, 4),
                mean_entropy: round_to(mean, 4),
                active_constraints,
                identity_pressure: round_to(self.identity_pressure, 4),
            },
            dampening,
        }
    }
}

/// Distinct characters over total characters; `0.0` for empty input.
pub fn measure_entropy(text: &str) -> f64 {
    let total = text.chars().count();
    if total == 0 {
        return 0.0;
    }
    let mut seen: Vec<char> = text.chars().collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len() as f64 / total as f64
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(max: f64) -> EntropyGate {
        EntropyGate::new(&ControlConfig { entropy_max: max, ..Default::default() })
    }

    #[test]
    fn entropy_of_simple_inputs() {
        assert_eq!(measure_entropy(""), 0.0);
        assert_eq!(measure_entropy("aaaa"), 0.25);
        assert_eq!(measure_entropy("abcd"), 1.0);
        assert_eq!(measure_entropy("héé"), 2.0 / 3.0);
    }

    #[test]
    fn low_entropy_passes() {
        let mut g = gate(0.30);
        let out = g.process("  hello hello hello hello hello hello  ");
        assert!(out.snapshot.entropy < 0.30);
        assert!(!out.snapshot.is_stabilizing());
        assert_eq!(out.dampening, 1.0);
    }

    #[test]
    fn high_mean_stabilizes() {
        let mut g = gate(0.30);
        let out = g.process("hello");
        assert_eq!(out.snapshot.entropy, 0.8);
        assert_eq!(out.snapshot.active_constraints, vec![STABILIZE]);
        assert_eq!(out.dampening, 0.7);
    }

    #[test]
    fn window_is_bounded_and_rolling() {
        let mut g = gate(0.30).with_history(vec![1.0; 15]);
        assert_eq!(g.window_len(), 10);
        for _ in 0..10 {
            g.process("aaaaaaaaaa");
        }
        let out = g.process("aaaaaaaaaa");
        assert_eq!(out.snapshot.mean_entropy, 0.1);
        assert!(!out.snapshot.is_stabilizing());
    }

    #[test]
    fn comparison_uses_unrounded_mean() {
        let mut g = gate(0.3);
        // 3 distinct of 10 chars, exactly at the ceiling
        let out = g.process("aaaaaaaabc");
        assert_eq!(out.snapshot.mean_entropy, 0.3);
        assert!(!out.snapshot.is_stabilizing());
    }

    #[test]
    fn outcome_serializes_flat() {
        let mut g = gate(0.30);
        let v = serde_json::to_value(g.process("ab")).unwrap();
        assert_eq!(v["entropy"], 1.0);
        assert_eq!(v["dampening"], 0.7);
        assert!(v["active_constraints"].is_array());
    }
}
