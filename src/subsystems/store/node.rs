//! `Node`: one recorded interaction line in the store.
//!
//! The on-disk record is a free-form JSON object. The well-known keys are
//! lifted into typed fields when they have the expected shape; everything
//! else (gate/layer results, foreign keys, `parse_error`) rides along in
//! `extra` and is written back unchanged.

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::core::time::utc_now_iso;

/// Keys consulted, in order, when resolving a node's display text.
pub const TEXT_KEYS: [&str; 6] = ["text", "content", "message", "prompt", "raw", "input"];

pub const DEFAULT_KIND: &str = "node";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ts: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub meta: Map<String, Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Fresh node with id, timestamp, kind and text set.
    pub fn new(kind: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            ts: Some(utc_now_iso()),
            kind: Some(kind.into()),
            text: Some(text.into()),
            tags: Vec::new(),
            meta: Map::new(),
            extra: Map::new(),
        }
    }

    /// Wrap any JSON value as a node.
    ///
    /// Objects keep their fields; anything else becomes the text of a fresh
    /// node (strings verbatim, other values as compact JSON).
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(map) => Self::from_object(map),
            Value::String(s) => Self::stamped(s),
            other => Self::stamped(other.to_string()),
        }
    }

    /// Placeholder for a line that is not valid JSON.
    pub fn unparsed(line: &str) -> Self {
        let mut node = Self::stamped(line.to_string());
        node.extra.insert("parse_error".into(), Value::Bool(true));
        node
    }

    fn stamped(text: String) -> Self {
        Self {
            id: Some(Uuid::new_v4().to_string()),
            ts: Some(utc_now_iso()),
            kind: None,
            text: Some(text),
            tags: Vec::new(),
            meta: Map::new(),
            extra: Map::new(),
        }
    }

    fn from_object(mut map: Map<String, Value>) -> Self {
        let id = take_string(&mut map, "id");
        let ts = take_string(&mut map, "ts");
        let kind = take_string(&mut map, "kind");
        let text = take_string(&mut map, "text");

        let tags = match map.remove("tags") {
            Some(Value::Array(items)) if items.iter().all(Value::is_string) => items
                .into_iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(other) => {
                map.insert("tags".into(), other);
                Vec::new()
            }
            None => Vec::new(),
        };

        let meta = match map.remove("meta") {
            Some(Value::Object(m)) => m,
            Some(other) => {
                map.insert("meta".into(), other);
                Map::new()
            }
            None => Map::new(),
        };

        Self { id, ts, kind, text, tags, meta, extra: map }
    }

    /// Display kind; nodes written without one read as `"node"`.
    pub fn kind(&self) -> &str {
        self.kind.as_deref().unwrap_or(DEFAULT_KIND)
    }

    pub fn ts(&self) -> &str {
        self.ts.as_deref().unwrap_or("")
    }

    /// Resolve the node's text: the first non-blank string among
    /// [`TEXT_KEYS`], falling back to the whole record as JSON.
    pub fn resolved_text(&self) -> String {
        if let Some(t) = self.text.as_deref().filter(|t| !t.trim().is_empty()) {
            return t.to_string();
        }
        for key in &TEXT_KEYS[1..] {
            if let Some(Value::String(s)) = self.extra.get(*key) {
                if !s.trim().is_empty() {
                    return s.clone();
                }
            }
        }
        serde_json::to_string(self).unwrap_or_default()
    }

    /// `true` for placeholders created from undecodable lines.
    pub fn is_parse_error(&self) -> bool {
        matches!(self.extra.get("parse_error"), Some(Value::Bool(true)))
    }

    /// Fill in a missing id, timestamp or text so the record is self-describing.
    /// A key that is present keeps its value, whatever its type.
    pub fn normalized(mut self) -> Self {
        if self.id.is_none() && !self.extra.contains_key("id") {
            self.id = Some(Uuid::new_v4().to_string());
        }
        if self.ts.is_none() && !self.extra.contains_key("ts") {
            self.ts = Some(utc_now_iso());
        }
        if self.text.is_none() && !self.extra.contains_key("text") {
            self.text = Some(self.resolved_text());
        }
        self
    }

    /// Single-line preview: newlines flattened, trimmed, cut to `max` chars.
    pub fn preview(&self, max: usize) -> String {
        preview(&self.resolved_text(), max)
    }

    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Flatten newlines, trim, and cut to `max` chars with a `...` suffix.
pub fn preview(text: &str, max: usize) -> String {
    let flat = text.replace('\n', " ");
    let flat = flat.trim();
    if flat.chars().count() > max {
        let head: String = flat.chars().take(max.saturating_sub(3)).collect();
        format!("{head}...")
    } else {
        flat.to_string()
    }
}

/// Parse repeatable `key=value` metadata flags. The value is split on the
/// first `=` and both sides are trimmed; a bare key maps to `true`.
pub fn parse_meta(items: &[String]) -> Map<String, Value> {
    let mut meta = Map::new();
    for item in items {
        match item.split_once('=') {
            Some((k, v)) => meta.insert(k.trim().to_string(), Value::String(v.trim().to_string())),
            None => meta.insert(item.trim().to_string(), Value::Bool(true)),
        };
    }
    meta
}

fn take_string(map: &mut Map<String, Value>, key: &str) -> Option<String> {
    match map.remove(key) {
        Some(Value::String(s)) => Some(s),
        Some(other) => {
            map.insert(key.to_string(), other);
            None
        }
        None => None,
    }
}
