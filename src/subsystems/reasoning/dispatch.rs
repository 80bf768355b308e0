//! Dry-run dispatch: describe what permitted capabilities would do.

use serde::Serialize;

use super::bindings::EXPLAIN;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DispatchResult {
    pub status: &'static str,
    pub description: String,
}

pub fn dispatch(capabilities: &[&str], _text: &str) -> DispatchResult {
    if capabilities.is_empty() {
        return DispatchResult {
            status: "noop",
            description: "No capabilities permitted for this intent.".into(),
        };
    }
    let descriptions: Vec<String> = capabilities
        .iter()
        .map(|cap| match *cap {
            EXPLAIN => "System would generate an explanation based solely on explicit input.".to_string(),
            other => format!("Capability '{other}' has no defined dispatch behavior."),
        })
        .collect();
    DispatchResult { status: "dry-run", description: descriptions.join(" ") }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_without_capabilities() {
        assert_eq!(dispatch(&[], "x").status, "noop");
    }

    #[test]
    fn describes_each_capability() {
        let d = dispatch(&[EXPLAIN, "search"], "x");
        assert_eq!(d.status, "dry-run");
        assert!(d.description.starts_with("System would generate an explanation"));
        assert!(d.description.ends_with("Capability 'search' has no defined dispatch behavior."));
    }
}
