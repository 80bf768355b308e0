//! Explicit intent → capability binding table.

use serde::Serialize;

use crate::subsystems::instrumentation::InvariantStatus;

pub const EXPLAIN: &str = "explain";

/// Static binding table. Keys cover both input kinds and intents.
pub const INTENT_BINDINGS: [(&str, &[&str]); 4] = [
    ("statement", &[]),
    ("explanation", &[EXPLAIN]),
    ("question", &[EXPLAIN]),
    ("request", &[]),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Binding {
    pub allowed: Vec<&'static str>,
    pub reason: &'static str,
}

pub fn allowed_capabilities(
    intent: &str,
    confidence: f64,
    invariants: InvariantStatus,
    min_confidence: f64,
) -> Binding {
    if !invariants.is_clean() {
        return Binding { allowed: Vec::new(), reason: "invariants not clean" };
    }
    if confidence < min_confidence {
        return Binding { allowed: Vec::new(), reason: "confidence too low" };
    }
    let allowed = INTENT_BINDINGS
        .iter()
        .find(|(key, _)| *key == intent)
        .map(|(_, caps)| caps.to_vec())
        .unwrap_or_default();
    Binding { allowed, reason: "explicit binding" }
}
