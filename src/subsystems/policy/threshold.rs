//! Thresholded actuation gate. Decides whether action is permitted; never acts.

use std::fmt;

use serde::Serialize;

use crate::subsystems::instrumentation::InvariantStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Allow,
    Deny,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Allow => "ALLOW",
            Verdict::Deny => "DENY",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Decision {
    pub decision: Verdict,
    pub reason: &'static str,
}

impl Decision {
    pub fn allow(reason: &'static str) -> Self {
        Self { decision: Verdict::Allow, reason }
    }

    pub fn deny(reason: &'static str) -> Self {
        Self { decision: Verdict::Deny, reason }
    }

    pub fn is_allowed(&self) -> bool {
        self.decision == Verdict::Allow
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicySnapshot {
    pub allow_action: bool,
}

/// Invariants first, then confidence, then the policy snapshot if any.
pub fn may_act(
    confidence: f64,
    invariants: InvariantStatus,
    policy: Option<PolicySnapshot>,
    threshold: f64,
) -> Decision {
    if !invariants.is_clean() {
        return Decision::deny("invariants not clean");
    }
    if confidence < threshold {
        return Decision::deny("confidence below threshold");
    }
    if policy.is_some_and(|p| !p.allow_action) {
        return Decision::deny("policy prohibits action");
    }
    Decision::allow("all thresholds satisfied")
}
