//! Thin orchestration: routes explicit input to the stateless capabilities.

use serde::Serialize;

use super::capabilities::{classify, extract_intent, summarize, InputKind, Intent};

#[derive(Debug, Clone, Copy)]
pub struct RouteContext {
    pub allow_summary: bool,
    pub summary_words: usize,
}

impl Default for RouteContext {
    fn default() -> Self {
        Self { allow_summary: true, summary_words: 12 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteResult {
    pub status: &'static str,
    pub used: Vec<&'static str>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<InputKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

pub fn route(text: &str, ctx: RouteContext) -> RouteResult {
    let text = text.trim();
    if text.is_empty() {
        return RouteResult { status: "no-input", used: Vec::new(), kind: None, intent: None, summary: None };
    }

    let mut used = vec!["classify", "extract_intent"];
    let summary = ctx.allow_summary.then(|| {
        used.push("summarize");
        summarize(text, ctx.summary_words)
    });

    RouteResult {
        status: "ok",
        used,
        kind: Some(classify(text)),
        intent: Some(extract_intent(text)),
        summary,
    }
}
