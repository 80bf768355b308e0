//! Experiments: stress inputs, threshold calibration and Kₜ trace comparison.

pub mod compare;

use serde::Serialize;
use tracing::debug;

use crate::core::config::ControlConfig;
use crate::subsystems::gate::EntropyGate;
use crate::subsystems::instrumentation::metrics::{self, MetricsSummary};
use crate::subsystems::instrumentation::Observation;

pub use compare::{load_kt, summarize_kt, KtSummary};

/// Thresholds swept by `calibrate`.
pub const CALIBRATION_THRESHOLDS: [f64; 5] = [0.20, 0.25, 0.30, 0.35, 0.40];

#[derive(Debug, Clone)]
pub struct StressCase {
    pub label: &'static str,
    pub text: String,
}

/// Controlled pressure: calm, normal, repetitive and high-entropy inputs.
pub fn stress_cases() -> Vec<StressCase> {
    let high_entropy: String = (0..200u32)
        .filter_map(|i| char::from_u32(33 + i % 90))
        .collect();
    vec![
        StressCase { label: "short-calm", text: "hello".into() },
        StressCase { label: "medium-text", text: "hello elyria this is a normal sentence".into() },
        StressCase { label: "repetition", text: "hello ".repeat(20) },
        StressCase { label: "high-entropy", text: high_entropy },
        StressCase { label: "long-repetition", text: "elyria ".repeat(100) },
    ]
}

#[derive(Debug, Clone, Serialize)]
pub struct CalibrationRow {
    pub threshold: f64,
    pub summary: Option<MetricsSummary>,
}

/// Run the stress cases through a fresh gate per threshold. Nothing is
/// written to the persistent logs.
pub fn calibrate(thresholds: &[f64], base: &ControlConfig) -> Vec<CalibrationRow> {
    let cases = stress_cases();
    thresholds
        .iter()
        .map(|&threshold| {
            let cfg = ControlConfig { entropy_max: threshold, ..base.clone() };
            let mut gate = EntropyGate::new(&cfg);
            let events: Vec<Observation> = cases
                .iter()
                .map(|c| Observation::from_outcome(&gate.process(&c.text)))
                .collect();
            let summary = metrics::summarize(&events);
            debug!(threshold, observations = events.len(), "calibration pass");
            CalibrationRow { threshold, summary }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stress_case_shapes() {
        let cases = stress_cases();
        assert_eq!(cases.len(), 5);
        assert_eq!(cases[2].text.len(), 120);
        assert_eq!(cases[3].text.chars().count(), 200);
        assert!(cases[3].text.starts_with("!\"#"));
        assert_eq!(cases[4].text.len(), 700);
    }

    #[test]
    fn stricter_thresholds_stabilize_at_least_as_often() {
        let rows = calibrate(&CALIBRATION_THRESHOLDS, &ControlConfig::default());
        assert_eq!(rows.len(), 5);
        let rates: Vec<f64> = rows
            .iter()
            .map(|r| r.summary.as_ref().map_or(0.0, |s| s.stabilization_rate))
            .collect();
        assert!(rates.windows(2).all(|w| w[0] >= w[1]));
        assert!(rows.iter().all(|r| r.summary.as_ref().is_some_and(|s| s.observations == 5)));
    }
}
