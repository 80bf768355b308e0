//! Export the node store as JSONL, a pretty JSON array, or CSV.

use std::fs;
use std::path::Path;

use serde_json::Value;

use super::node::Node;
use super::{write_jsonl, NodeStore};
use crate::core::error::AppError;
use crate::core::json::to_spaced_string;

const CSV_HEADER: [&str; 6] = ["id", "ts", "kind", "text", "tags", "meta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Jsonl,
    Json,
    Csv,
}

impl ExportFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self, AppError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "jsonl" => Ok(Self::Jsonl),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(AppError::Usage(
                "unsupported export format (use .jsonl/.json/.csv)".into(),
            )),
        }
    }
}

impl NodeStore {
    /// Write every node to `out`; returns the number exported.
    pub fn export(&self, out: &Path) -> Result<usize, AppError> {
        let format = ExportFormat::from_path(out)?;
        let nodes = self.load()?;
        let count = nodes.len();
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        match format {
            ExportFormat::Jsonl => write_jsonl(out, nodes)?,
            ExportFormat::Json => fs::write(out, serde_json::to_string_pretty(&nodes)?)?,
            ExportFormat::Csv => fs::write(out, to_csv(&nodes)?)?,
        }
        Ok(count)
    }
}

fn to_csv(nodes: &[Node]) -> Result<String, AppError> {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADER.iter().map(|s| s.to_string()));
    for node in nodes {
        let tags = if node.extra.contains_key("tags") { String::new() } else { node.tags.join(",") };
        let meta = if node.extra.contains_key("meta") {
            String::new()
        } else {
            to_spaced_string(&Value::Object(node.meta.clone()))?
        };
        push_row(
            &mut out,
            [
                node.id.clone().unwrap_or_default(),
                node.ts().to_string(),
                node.kind().to_string(),
                node.resolved_text(),
                tags,
                meta,
            ]
            .into_iter(),
        );
    }
    Ok(out)
}

fn push_row(out: &mut String, fields: impl Iterator<Item = String>) {
    let cells: Vec<String> = fields.map(|f| quote_field(&f)).collect();
    out.push_str(&cells.join(","));
    out.push_str("\r\n");
}

/// RFC 4180 quoting: fields holding a comma, quote, or line break are
/// wrapped in quotes with inner quotes doubled.
fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn seeded(tmp: &TempDir) -> NodeStore {
        let store = NodeStore::new(tmp.path().join("nodes.jsonl"));
        let mut node = Node::new("gate", "say \"hi\", twice");
        node.tags = vec!["a".into(), "b".into()];
        node.meta.insert("k".into(), json!("v"));
        store.append(node).unwrap();
        store.append(Node::from_value(json!({"id": "x", "ts": "t", "content": "plain"}))).unwrap();
        store
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.JSONL")).unwrap(), ExportFormat::Jsonl);
        assert_eq!(ExportFormat::from_path(Path::new("a.json")).unwrap(), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a.csv")).unwrap(), ExportFormat::Csv);
        let err = ExportFormat::from_path(Path::new("a.txt")).unwrap_err();
        assert_eq!(err.to_string(), "unsupported export format (use .jsonl/.json/.csv)");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn csv_quotes_and_columns() {
        let tmp = TempDir::new().unwrap();
        let store = seeded(&tmp);
        let out = tmp.path().join("out").join("nodes.csv");
        assert_eq!(store.export(&out).unwrap(), 2);

        let csv = fs::read_to_string(&out).unwrap();
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], "id,ts,kind,text,tags,meta");
        assert!(lines[1].ends_with(r#",gate,"say ""hi"", twice","a,b","{""k"": ""v""}""#));
        assert!(lines[2].starts_with("x,t,node,plain,,{}"));
    }

    #[test]
    fn json_export_is_pretty_array() {
        let tmp = TempDir::new().unwrap();
        let store = seeded(&tmp);
        let out = tmp.path().join("nodes.json");
        store.export(&out).unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("[\n  {"));
        let back: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(back.len(), 2);
    }

    #[test]
    fn jsonl_export_round_trips_through_import() {
        let tmp = TempDir::new().unwrap();
        let store = seeded(&tmp);
        let out = tmp.path().join("copy.jsonl");
        store.export(&out).unwrap();
        let other = NodeStore::new(tmp.path().join("other.jsonl"));
        assert_eq!(other.import(&out, false).unwrap(), (2, 2));
        assert_eq!(other.load().unwrap(), store.load().unwrap());
    }
}
