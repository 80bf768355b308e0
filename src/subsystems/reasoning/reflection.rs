//! Descriptive reflection over one processed input.

use serde::Serialize;

use super::orchestrator::RouteResult;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reflection {
    pub status: &'static str,
    pub reflection: String,
}

pub fn reflect(text: &str, routing: &RouteResult, confidence: f64) -> Reflection {
    if text.trim().is_empty() {
        return Reflection { status: "no-input", reflection: String::new() };
    }
    let kind = routing.kind.map_or("None", |k| k.as_str());
    let intent = routing.intent.map_or("None", |i| i.as_str());
    Reflection {
        status: "ok",
        reflection: format!(
            "The system processed an explicit input under bounded reasoning. \
             Input type was '{kind}' with intent '{intent}'. \
             Confidence level was {confidence:.2}. \
             No memory was accessed and no action was taken."
        ),
    }
}
