//! Node store: append-only JSONL file of recorded nodes.
//!
//! The reader is lenient: a JSON array file is accepted, non-object values
//! are wrapped as text nodes and undecodable lines come back flagged with
//! `parse_error` instead of failing the whole load. Every write path takes
//! the advisory lock on `<store>.lock`.

pub mod export;
pub mod lock;
pub mod node;

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use regex::RegexBuilder;
use serde_json::Value;
use tracing::debug;

use crate::core::error::AppError;

pub use export::ExportFormat;
pub use lock::StoreLock;
pub use node::{parse_meta, preview, Node};

/// Preview width used by `list`.
pub const LIST_PREVIEW: usize = 120;
/// Preview width used by `search`.
pub const SEARCH_PREVIEW: usize = 140;

/// How `search` matches the query against node text.
#[derive(Debug, Clone, Copy)]
pub struct SearchMode {
    pub regex: bool,
    pub ignore_case: bool,
}

impl Default for SearchMode {
    fn default() -> Self {
        Self { regex: false, ignore_case: true }
    }
}

/// Outcome of [`NodeStore::repair`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepairReport {
    pub kept: usize,
    pub dropped: usize,
}

/// Basic file facts reported by `config` and `doctor`.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub exists: bool,
    pub size_bytes: u64,
    pub lines: usize,
}

#[derive(Debug, Clone)]
pub struct NodeStore {
    path: PathBuf,
}

impl NodeStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn info(&self) -> Result<StoreInfo, AppError> {
        if !self.path.exists() {
            return Ok(StoreInfo { exists: false, size_bytes: 0, lines: 0 });
        }
        let size_bytes = fs::metadata(&self.path)?.len();
        let data = self.read_raw()?;
        Ok(StoreInfo { exists: true, size_bytes, lines: data.lines().count() })
    }

    /// Read every node. A missing or blank file is an empty store.
    pub fn load(&self) -> Result<Vec<Node>, AppError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = self.read_raw()?;
        let Some(first) = data.chars().find(|c| !c.is_whitespace()) else {
            return Ok(Vec::new());
        };

        if first == '[' {
            let items: Vec<Value> = serde_json::from_str(&data).map_err(|e| {
                AppError::Store(format!("malformed JSON array {}: {e}", self.path.display()))
            })?;
            return Ok(items.into_iter().map(Node::from_value).collect());
        }

        let nodes = data
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(|line| match serde_json::from_str::<Value>(line) {
                Ok(v) => Node::from_value(v),
                Err(_) => Node::unparsed(line),
            })
            .collect();
        Ok(nodes)
    }

    /// Append one node, filling in any missing id, timestamp or text.
    pub fn append(&self, node: Node) -> Result<Node, AppError> {
        let node = node.normalized();
        let line = node.to_json_line()?;
        let _lock = StoreLock::acquire(&self.path)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| AppError::Store(format!("cannot open {}: {e}", self.path.display())))?;
        writeln!(file, "{line}")
            .map_err(|e| AppError::Store(format!("cannot append {}: {e}", self.path.display())))?;
        debug!(path = %self.path.display(), id = ?node.id, "node appended");
        Ok(node)
    }

    /// Rewrite the whole store as JSONL.
    pub fn write_all(&self, nodes: Vec<Node>) -> Result<(), AppError> {
        write_jsonl(&self.path, nodes)
    }

    /// Rewrite the store keeping only decodable records.
    pub fn repair(&self) -> Result<RepairReport, AppError> {
        if !self.path.exists() {
            return Ok(RepairReport { kept: 0, dropped: 0 });
        }
        let data = self.read_raw()?;
        let mut kept = Vec::new();
        let mut dropped = 0;

        if data.trim_start().starts_with('[') {
            let parsed: Value = serde_json::from_str(&data).map_err(|e| {
                AppError::Store(format!("malformed JSON array {}: {e}", self.path.display()))
            })?;
            match parsed {
                Value::Array(items) => kept.extend(items.into_iter().map(Node::from_value)),
                _ => dropped += 1,
            }
        } else {
            for line in data.lines().map(str::trim).filter(|l| !l.is_empty()) {
                match serde_json::from_str::<Value>(line) {
                    Ok(v) => kept.push(Node::from_value(v)),
                    Err(_) => dropped += 1,
                }
            }
        }

        let report = RepairReport { kept: kept.len(), dropped };
        self.write_all(kept)?;
        Ok(report)
    }

    pub fn clear(&self) -> Result<(), AppError> {
        self.write_all(Vec::new())
    }

    /// Pull nodes from `src` (JSONL or JSON array). `merge` appends them to
    /// the current store; otherwise they replace it. Returns
    /// `(imported, total)`.
    pub fn import(&self, src: &Path, merge: bool) -> Result<(usize, usize), AppError> {
        if !src.exists() {
            return Err(AppError::Usage(format!("source not found: {}", src.display())));
        }
        let incoming = NodeStore::new(src).load()?;
        let imported = incoming.len();
        let nodes = if merge {
            let mut current = self.load()?;
            current.extend(incoming);
            current
        } else {
            incoming
        };
        let total = nodes.len();
        self.write_all(nodes)?;
        Ok((imported, total))
    }

    /// Matching nodes, newest first, at most `limit`.
    pub fn search(&self, query: &str, mode: SearchMode, limit: usize) -> Result<Vec<Node>, AppError> {
        let nodes = self.load()?;
        search_nodes(nodes, query, mode, limit)
    }

    fn read_raw(&self) -> Result<String, AppError> {
        fs::read_to_string(&self.path)
            .map_err(|e| AppError::Store(format!("cannot read {}: {e}", self.path.display())))
    }
}

pub(crate) fn search_nodes(
    nodes: Vec<Node>,
    query: &str,
    mode: SearchMode,
    limit: usize,
) -> Result<Vec<Node>, AppError> {
    let matcher: Box<dyn Fn(&str) -> bool> = if mode.regex {
        let rx = RegexBuilder::new(query)
            .case_insensitive(mode.ignore_case)
            .build()
            .map_err(|e| AppError::Usage(format!("invalid regex: {e}")))?;
        Box::new(move |t: &str| rx.is_match(t))
    } else if mode.ignore_case {
        let needle = query.to_lowercase();
        Box::new(move |t: &str| t.to_lowercase().contains(&needle))
    } else {
        let needle = query.to_string();
        Box::new(move |t: &str| t.contains(&needle))
    };

    Ok(nodes
        .into_iter()
        .rev()
        .filter(|n| matcher(&n.resolved_text()))
        .take(limit)
        .collect())
}

/// Write nodes as JSONL to any path under that path's lock.
pub(crate) fn write_jsonl(path: &Path, nodes: Vec<Node>) -> Result<(), AppError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = String::new();
    for node in nodes {
        out.push_str(&node.normalized().to_json_line()?);
        out.push('\n');
    }
    let _lock = StoreLock::acquire(path)?;
    fs::write(path, out).map_err(|e| AppError::Store(format!("cannot write {}: {e}", path.display())))
}
