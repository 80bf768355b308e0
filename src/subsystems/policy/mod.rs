//! Advisory policy: turns observation averages into recommendations.
//!
//! Nothing in this module changes behavior. Recommendations feed the
//! dry-run actuation layer and the operator, never the gate.

pub mod actuation;
pub mod threshold;

use std::fmt;

use serde::{Serialize, Serializer};

use crate::core::config::PolicyConfig;
use crate::subsystems::gate::round_to;
use crate::subsystems::instrumentation::metrics;
use crate::subsystems::instrumentation::Observation;

pub use actuation::simulate;
pub use threshold::{may_act, Decision, PolicySnapshot, Verdict};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    CollectMoreObservations,
    LowerEntropyMax,
    ReviewInputPatterns,
    RelaxDampening,
    WithinBounds,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::CollectMoreObservations => "collect more observations",
            Recommendation::LowerEntropyMax => "consider lowering ENTROPY_MAX",
            Recommendation::ReviewInputPatterns => "system frequently stabilizing; review input patterns",
            Recommendation::RelaxDampening => "dampening low; entropy may be over-constrained",
            Recommendation::WithinBounds => "system operating within expected bounds",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(self.as_str())
    }
}

/// Averages are rounded for display: entropy to 4 places, rates to 3.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PolicyReport {
    NoData {
        status: &'static str,
        recommendations: Vec<Recommendation>,
    },
    Analyzed {
        observations: usize,
        avg_entropy: f64,
        stabilization_rate: f64,
        avg_dampening: f64,
        recommendations: Vec<Recommendation>,
    },
}

impl PolicyReport {
    pub fn recommendations(&self) -> &[Recommendation] {
        match self {
            PolicyReport::NoData { recommendations, .. }
            | PolicyReport::Analyzed { recommendations, .. } => recommendations,
        }
    }

    /// Field/value rows in report order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        let recs = format!(
            "[{}]",
            self.recommendations().iter().map(|r| format!("'{r}'")).collect::<Vec<_>>().join(", ")
        );
        match self {
            PolicyReport::NoData { status, .. } => {
                vec![("status", status.to_string()), ("recommendations", recs)]
            }
            PolicyReport::Analyzed { observations, avg_entropy, stabilization_rate, avg_dampening, .. } => vec![
                ("observations", observations.to_string()),
                ("avg_entropy", format!("{avg_entropy:?}")),
                ("stabilization_rate", format!("{stabilization_rate:?}")),
                ("avg_dampening", format!("{avg_dampening:?}")),
                ("recommendations", recs),
            ],
        }
    }
}

pub fn analyze(events: &[Observation], cfg: &PolicyConfig) -> PolicyReport {
    let Some(summary) = metrics::summarize(events) else {
        return PolicyReport::NoData {
            status: "no-data",
            recommendations: vec![Recommendation::CollectMoreObservations],
        };
    };

    let mut recs = Vec::new();
    if summary.avg_entropy > cfg.entropy_target {
        recs.push(Recommendation::LowerEntropyMax);
    }
    if summary.stabilization_rate > cfg.stabilization_target {
        recs.push(Recommendation::ReviewInputPatterns);
    }
    if summary.avg_dampening < cfg.dampening_target {
        recs.push(Recommendation::RelaxDampening);
    }
    if recs.is_empty() {
        recs.push(Recommendation::WithinBounds);
    }

    PolicyReport::Analyzed {
        observations: summary.observations,
        avg_entropy: round_to(summary.avg_entropy, 4),
        stabilization_rate: round_to(summary.stabilization_rate, 3),
        avg_dampening: round_to(summary.avg_dampening, 3),
        recommendations: recs,
    }
}
