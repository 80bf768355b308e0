//! Stateless capability functions: structural classification, intent
//! extraction and bounded summarization.

use std::fmt;

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Empty,
    Question,
    Request,
    Statement,
}

impl InputKind {
    pub fn as_str(self) -> &'static str {
        match self {
            InputKind::Empty => "empty",
            InputKind::Question => "question",
            InputKind::Request => "request",
            InputKind::Statement => "statement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Explanation,
    Procedure,
    DecisionSupport,
    Unspecified,
}

impl Intent {
    pub fn as_str(self) -> &'static str {
        match self {
            Intent::Explanation => "explanation",
            Intent::Procedure => "procedure",
            Intent::DecisionSupport => "decision_support",
            Intent::Unspecified => "unspecified",
        }
    }
}

macro_rules! str_enum_impls {
    ($($t:ty),*) => {$(
        impl fmt::Display for $t {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl Serialize for $t {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.as_str())
            }
        }
    )*};
}

str_enum_impls!(InputKind, Intent);

const REQUEST_PREFIXES: [&str; 3] = ["please", "do ", "can you"];

pub fn classify(text: &str) -> InputKind {
    let text = text.trim();
    if text.is_empty() {
        InputKind::Empty
    } else if text.ends_with('?') {
        InputKind::Question
    } else if REQUEST_PREFIXES.iter().any(|p| text.to_lowercase().starts_with(p)) {
        InputKind::Request
    } else {
        InputKind::Statement
    }
}

/// Keyword intent, no inference. Matches anywhere in the text, so `"show"`
/// counts as `how`.
pub fn extract_intent(text: &str) -> Intent {
    let text = text.to_lowercase();
    if text.contains("why") {
        Intent::Explanation
    } else if text.contains("how") {
        Intent::Procedure
    } else if text.contains("should") || text.contains("can i") {
        Intent::DecisionSupport
    } else {
        Intent::Unspecified
    }
}

/// First `max_words` whitespace-separated words.
pub fn summarize(text: &str, max_words: usize) -> String {
    text.split_whitespace().take(max_words).collect::<Vec<_>>().join(" ")
}
