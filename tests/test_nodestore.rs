//! Integration tests for the node store: lenient reads, locking writes,
//! search, export/import and repair.

use std::fs;

use tempfile::TempDir;

use elyria_cp::subsystems::store::{Node, NodeStore, SearchMode, StoreLock};

// ── helpers ──────────────────────────────────────────────────────────────────

fn store() -> (TempDir, NodeStore) {
    let tmp = TempDir::new().expect("tempdir");
    let store = NodeStore::new(tmp.path().join("nodes.jsonl"));
    (tmp, store)
}

fn seeded(texts: &[&str]) -> (TempDir, NodeStore) {
    let (tmp, store) = store();
    for t in texts {
        store.append(Node::new("node", *t)).expect("append");
    }
    (tmp, store)
}

// ── reading ──────────────────────────────────────────────────────────────────

#[test]
fn missing_store_is_empty() {
    let (_tmp, store) = store();
    assert!(store.load().unwrap().is_empty());
    assert!(!store.info().unwrap().exists);
}

#[test]
fn mixed_lines_load_leniently() {
    let (_tmp, store) = store();
    fs::write(
        store.path(),
        "{\"text\":\"plain\"}\n\"just a string\"\nnot json at all\n\n{\"content\":\"aliased\"}\n",
    )
    .unwrap();

    let nodes = store.load().unwrap();
    assert_eq!(nodes.len(), 4);
    assert_eq!(nodes[0].resolved_text(), "plain");
    assert_eq!(nodes[1].resolved_text(), "just a string");
    assert!(nodes[2].is_parse_error());
    assert_eq!(nodes[3].resolved_text(), "aliased");
}

#[test]
fn json_array_file_is_accepted() {
    let (_tmp, store) = store();
    fs::write(store.path(), "[{\"text\":\"a\"}, 7]").unwrap();
    let nodes = store.load().unwrap();
    assert_eq!(nodes.len(), 2);
    assert_eq!(nodes[1].resolved_text(), "7");
}

// ── writing ──────────────────────────────────────────────────────────────────

#[test]
fn append_fills_identity_and_releases_lock() {
    let (tmp, store) = seeded(&["first"]);
    let nodes = store.load().unwrap();
    assert!(nodes[0].id.is_some());
    assert!(nodes[0].ts.is_some());
    assert_eq!(nodes[0].kind(), "node");
    assert!(tmp.path().join("nodes.jsonl.lock").exists());
    assert!(StoreLock::acquire(store.path()).is_ok());
}

#[test]
fn repair_drops_only_broken_lines() {
    let (_tmp, store) = seeded(&["keep me"]);
    let mut data = fs::read_to_string(store.path()).unwrap();
    data.push_str("{broken\n");
    fs::write(store.path(), data).unwrap();

    let report = store.repair().unwrap();
    assert_eq!((report.kept, report.dropped), (1, 1));
    assert_eq!(store.info().unwrap().lines, 1);
}

// ── search ───────────────────────────────────────────────────────────────────

#[test]
fn search_is_newest_first_and_limited() {
    let (_tmp, store) = seeded(&["Gate open", "unrelated", "gate closed", "GATE again"]);
    let hits = store.search("gate", SearchMode::default(), 2).unwrap();
    let texts: Vec<String> = hits.iter().map(Node::resolved_text).collect();
    assert_eq!(texts, ["GATE again", "gate closed"]);

    let exact = SearchMode { regex: false, ignore_case: false };
    assert_eq!(store.search("gate", exact, 10).unwrap().len(), 1);

    let rx = SearchMode { regex: true, ignore_case: true };
    assert_eq!(store.search("^gate (open|closed)$", rx, 10).unwrap().len(), 2);
    assert!(store.search("(", rx, 10).is_err());
}

// ── export / import ──────────────────────────────────────────────────────────

#[test]
fn export_then_import_merges() {
    let (tmp, store) = seeded(&["one", "two"]);
    let json = tmp.path().join("out/nodes.json");
    assert_eq!(store.export(&json).unwrap(), 2);
    assert!(fs::read_to_string(&json).unwrap().trim_start().starts_with('['));

    let (imported, total) = store.import(&json, true).unwrap();
    assert_eq!((imported, total), (2, 4));

    let (imported, total) = store.import(&json, false).unwrap();
    assert_eq!((imported, total), (2, 2));
}

#[test]
fn csv_export_has_header() {
    let (tmp, store) = seeded(&["with, comma"]);
    let csv = tmp.path().join("nodes.csv");
    store.export(&csv).unwrap();
    let data = fs::read_to_string(&csv).unwrap();
    assert!(data.starts_with("id,ts,kind,text,tags,meta"));
    assert!(data.contains("\"with, comma\""));
}

#[test]
fn unsupported_export_and_missing_import_fail() {
    let (tmp, store) = seeded(&["x"]);
    assert!(store.export(&tmp.path().join("nodes.txt")).is_err());
    assert!(store.import(&tmp.path().join("absent.jsonl"), true).is_err());
}

#[test]
fn import_keeps_non_string_ids_stable() {
    let (tmp, store) = store();
    let src = tmp.path().join("legacy.jsonl");
    fs::write(&src, "{\"id\": 5, \"text\": \"legacy\"}\n").unwrap();

    store.import(&src, true).unwrap();
    store.import(store.path(), false).unwrap();

    let line = fs::read_to_string(store.path()).unwrap();
    assert_eq!(line.matches("\"id\"").count(), 1);
    let nodes = store.load().unwrap();
    assert_eq!(nodes[0].extra["id"], 5);
    assert!(nodes[0].id.is_none());
}
