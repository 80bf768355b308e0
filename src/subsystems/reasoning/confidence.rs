//! Confidence from measurable system pressure only.

use crate::subsystems::gate::{round_to, GateSnapshot};
use crate::subsystems::instrumentation::InvariantStatus;

/// Bounded confidence in `[0.0, 1.0]`, rounded to 3 places.
///
/// Mean entropy costs up to 0.4, an active `stabilize` costs 0.2, and
/// unclean invariants force 0. Missing inputs are treated as calm and clean.
pub fn compute(gate: Option<&GateSnapshot>, invariants: Option<InvariantStatus>) -> f64 {
    let (entropy, stabilized) = gate.map_or((0.0, false), |g| (g.mean_entropy, g.is_stabilizing()));
    let clean = invariants.is_none_or(InvariantStatus::is_clean);

    let mut confidence = 1.0 - entropy.min(1.0) * 0.4;
    if stabilized {
        confidence -= 0.2;
    }
    if !clean {
        confidence = 0.0;
    }
    round_to(confidence.clamp(0.0, 1.0), 3)
}
