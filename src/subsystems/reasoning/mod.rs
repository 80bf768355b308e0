//! Bounded reasoning: understanding, permission and action kept as
//! separate, explicit stages.
//!
//! No stage reads memory or carries state between calls. Execution is a
//! single fixed capability behind an operator opt-in.

pub mod bindings;
pub mod capabilities;
pub mod confidence;
pub mod dispatch;
pub mod execution;
pub mod orchestrator;
pub mod pipeline;
pub mod reflection;

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reasoning {
    pub status: &'static str,
    pub analysis: &'static str,
    pub response: &'static str,
}

/// Acknowledge explicit input without assuming context or history.
pub fn reason(text: &str) -> Reasoning {
    if text.trim().is_empty() {
        return Reasoning { status: "no-input", analysis: "", response: "" };
    }
    Reasoning {
        status: "ok",
        analysis: "Input received. Analyzing structure and intent without assuming context, identity, or history.",
        response: "Statement acknowledged. No action taken without an explicit request.",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_is_bounded() {
        assert_eq!(reason("  ").status, "no-input");
        let r = reason("hello");
        assert_eq!(r.status, "ok");
        assert!(r.response.starts_with("Statement acknowledged"));
    }
}
