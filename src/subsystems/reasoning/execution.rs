//! Execution gate and the single executable capability.
//!
//! Execution is denied unless the caller asks for `execute` mode and an
//! operator has approved it.

use serde::Serialize;

use super::bindings::EXPLAIN;
use crate::subsystems::policy::Decision;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    #[default]
    DryRun,
    Execute,
}

pub fn may_execute(capabilities: &[&str], mode: ExecutionMode, operator_ok: bool) -> Decision {
    if mode != ExecutionMode::Execute {
        return Decision::deny("execution mode not enabled");
    }
    if !operator_ok {
        return Decision::deny("operator approval not present");
    }
    if capabilities.is_empty() {
        return Decision::deny("no executable capabilities");
    }
    Decision::allow("explicit execution binding satisfied")
}

const EXPLANATION: &str = "Elyria is stable because each layer operates under strict constraints, \
with explicit boundaries between understanding, permission, and action.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "UPPERCASE")]
pub enum ExecutionOutcome {
    Executed { capability: &'static str, output: &'static str },
    Denied { reason: &'static str },
    Noop { reason: &'static str },
    Skipped { reason: &'static str },
}

pub fn execute(capability: &str, text: &str) -> ExecutionOutcome {
    if capability != EXPLAIN {
        return ExecutionOutcome::Denied { reason: "capability not executable" };
    }
    if text.trim().is_empty() {
        return ExecutionOutcome::Noop { reason: "empty input" };
    }
    ExecutionOutcome::Executed { capability: EXPLAIN, output: EXPLANATION }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_deny() {
        assert_eq!(may_execute(&[EXPLAIN], ExecutionMode::default(), true).reason, "execution mode not enabled");
        assert_eq!(may_execute(&[EXPLAIN], ExecutionMode::Execute, false).reason, "operator approval not present");
        assert_eq!(may_execute(&[], ExecutionMode::Execute, true).reason, "no executable capabilities");
        assert!(may_execute(&[EXPLAIN], ExecutionMode::Execute, true).is_allowed());
    }

    #[test]
    fn only_explain_runs() {
        assert_eq!(execute("search", "x"), ExecutionOutcome::Denied { reason: "capability not executable" });
        assert_eq!(execute(EXPLAIN, "  "), ExecutionOutcome::Noop { reason: "empty input" });
        assert!(matches!(execute(EXPLAIN, "why?"), ExecutionOutcome::Executed { .. }));
    }

    #[test]
    fn outcome_is_tagged_by_status() {
        let v = serde_json::to_value(ExecutionOutcome::Skipped { reason: "r" }).unwrap();
        assert_eq!(v, serde_json::json!({"status": "SKIPPED", "reason": "r"}));
    }
}
