//! Node store commands: record, read, search, move and maintain nodes.

use std::io::{self, BufRead, Write};
use std::path::Path;

use tracing::info;

use crate::cli::{NewArgs, SearchArgs, StatsArgs};
use crate::core::config::ENV_NODESTORE;
use crate::core::error::AppError;
use crate::subsystems::instrumentation::Observation;
use crate::subsystems::store::{parse_meta, Node, SearchMode, LIST_PREVIEW, SEARCH_PREVIEW};
use crate::subsystems::themes::{self, StatsOptions};

use super::{text_or_prompt, Context};

const NO_NODES: &str = "no nodes recorded";

pub fn config<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let cfg = &ctx.config;
    let info = ctx.store.info();
    writeln!(out, "store_path: {}", ctx.store.path().display())?;
    writeln!(out, "store_source: {}", cfg.store.source)?;
    writeln!(out, "store_exists: {}", ctx.store.exists())?;
    match std::env::var(ENV_NODESTORE) {
        Ok(v) => writeln!(out, "env {ENV_NODESTORE}: {v:?}")?,
        Err(_) => writeln!(out, "env {ENV_NODESTORE}: (unset)")?,
    }
    match info {
        Ok(info) if info.exists => {
            writeln!(out, "store_size_bytes: {}", info.size_bytes)?;
            writeln!(out, "store_lines: {}", info.lines)?;
        }
        Ok(_) => {}
        Err(e) => writeln!(out, "store_read_error: {e}")?,
    }
    writeln!(out, "entropy_max: {} ({})", cfg.control.entropy_max, cfg.control.entropy_max_source)?;
    writeln!(out, "window_size: {}", cfg.control.window_size)?;
    writeln!(out, "work_dir: {}", cfg.work_dir.display())?;
    writeln!(out, "instrumentation_log: {}", cfg.logs.instrumentation.display())?;
    writeln!(out, "capture_log: {}", cfg.logs.capture.display())?;
    writeln!(out, "layer_state: {}", cfg.logs.layer_state.display())?;
    writeln!(out, "llm_provider: {}", cfg.llm.provider)?;
    Ok(0)
}

/// Record a node, then let the gate observe it.
pub fn new<W: Write>(ctx: &Context, args: NewArgs, out: &mut W) -> Result<i32, AppError> {
    let Some(text) = text_or_prompt(args.text, "→: ", out)? else {
        return Ok(1);
    };
    if text.trim().is_empty() {
        writeln!(out, "no text provided")?;
        return Ok(1);
    }

    let mut node = Node::new(args.kind, text.as_str());
    node.tags = args.tags;
    node.meta = parse_meta(&args.meta);
    let node = ctx.store.append(node)?;

    let outcome = ctx.seeded_gate()?.process(&text);
    ctx.log.append(&Observation::from_outcome(&outcome))?;
    info!(
        id = ?node.id,
        entropy = outcome.snapshot.entropy,
        mean_entropy = outcome.snapshot.mean_entropy,
        stabilizing = outcome.snapshot.is_stabilizing(),
        "node recorded"
    );

    writeln!(out, "✓ node recorded")?;
    if args.echo {
        writeln!(out, "{}", node.to_json_line()?)?;
    }
    Ok(0)
}

pub fn last<W: Write>(ctx: &Context, raw: bool, out: &mut W) -> Result<i32, AppError> {
    let nodes = ctx.store.load()?;
    let Some(node) = nodes.last() else {
        writeln!(out, "{NO_NODES}")?;
        return Ok(0);
    };
    if raw {
        writeln!(out, "{}", node.to_json_line()?)?;
    } else {
        writeln!(out, "{}", node.resolved_text())?;
    }
    Ok(0)
}

/// The last `n` items, or all of them when `n` is zero.
fn last_n<T>(items: &[T], n: usize) -> &[T] {
    if n == 0 { items } else { &items[items.len().saturating_sub(n)..] }
}

fn summary_line(node: &Node, max: usize) -> String {
    format!("{}  [{}]  {}", node.ts(), node.kind(), node.preview(max))
}

pub fn list<W: Write>(ctx: &Context, limit: usize, out: &mut W) -> Result<i32, AppError> {
    let nodes = ctx.store.load()?;
    if nodes.is_empty() {
        writeln!(out, "{NO_NODES}")?;
        return Ok(0);
    }
    for node in last_n(&nodes, limit) {
        writeln!(out, "{}", summary_line(node, LIST_PREVIEW))?;
    }
    Ok(0)
}

pub fn tail<W: Write>(ctx: &Context, lines: usize, out: &mut W) -> Result<i32, AppError> {
    let nodes = ctx.store.load()?;
    if nodes.is_empty() {
        writeln!(out, "{NO_NODES}")?;
        return Ok(0);
    }
    for node in last_n(&nodes, lines) {
        writeln!(out, "{}", node.resolved_text())?;
    }
    Ok(0)
}

pub fn search<W: Write>(ctx: &Context, args: SearchArgs, out: &mut W) -> Result<i32, AppError> {
    if ctx.store.load()?.is_empty() {
        writeln!(out, "{NO_NODES}")?;
        return Ok(0);
    }
    let mode = SearchMode { regex: args.regex, ignore_case: !args.case };
    let hits = ctx.store.search(&args.query, mode, args.limit)?;
    if hits.is_empty() {
        writeln!(out, "no matches")?;
    }
    for node in &hits {
        writeln!(out, "{}", summary_line(node, SEARCH_PREVIEW))?;
    }
    Ok(0)
}

pub fn export<W: Write>(ctx: &Context, path: &Path, out: &mut W) -> Result<i32, AppError> {
    let path = std::path::absolute(path)?;
    let count = ctx.store.export(&path)?;
    writeln!(out, "exported {count} nodes -> {}", path.display())?;
    Ok(0)
}

pub fn import<W: Write>(ctx: &Context, src: &Path, replace: bool, out: &mut W) -> Result<i32, AppError> {
    let (imported, total) = ctx.store.import(src, !replace)?;
    if replace {
        writeln!(out, "imported {imported} (replaced store)")?;
    } else {
        writeln!(out, "imported {imported} (merged) -> total {total}")?;
    }
    Ok(0)
}

pub fn doctor<W: Write>(ctx: &Context, repair: bool, out: &mut W) -> Result<i32, AppError> {
    writeln!(out, "store: {}", ctx.store.path().display())?;
    if !ctx.store.exists() {
        writeln!(out, "store missing: ok (no nodes yet)")?;
        return Ok(0);
    }
    let nodes = ctx.store.load()?;
    writeln!(out, "load_nodes: {} nodes", nodes.len())?;
    let parse_errors = nodes.iter().filter(|n| n.is_parse_error()).count();
    if parse_errors > 0 {
        writeln!(out, "parse_error nodes present: {parse_errors}")?;
    }
    if repair {
        let report = ctx.store.repair()?;
        writeln!(out, "repair rewrite: kept={} dropped={}", report.kept, report.dropped)?;
    }
    Ok(0)
}

pub fn clear<W: Write>(ctx: &Context, yes: bool, out: &mut W) -> Result<i32, AppError> {
    if !yes {
        write!(out, "Delete all nodes in {}? [y/N]: ", ctx.store.path().display())?;
        out.flush()?;
        let mut answer = String::new();
        io::stdin().lock().read_line(&mut answer)?;
        if !matches!(answer.trim().to_lowercase().as_str(), "y" | "yes") {
            writeln!(out, "cancelled")?;
            return Ok(0);
        }
    }
    ctx.store.clear()?;
    writeln!(out, "cleared")?;
    Ok(0)
}

pub fn stats<W: Write>(ctx: &Context, args: StatsArgs, out: &mut W) -> Result<i32, AppError> {
    let nodes = ctx.store.load()?;
    let opts = StatsOptions {
        top: args.top,
        hide_top: args.hide_top,
        min_len: args.min_len,
        presence: !args.frequency,
        days: args.days,
    };
    let report = themes::stats(&nodes, &opts);

    writeln!(out, "total nodes: {}", report.total)?;
    if !report.activity.is_empty() {
        writeln!(out, "activity (last {} days, UTC):", report.days)?;
        for (day, count) in &report.activity {
            writeln!(out, "  {day}: {count}")?;
        }
    }
    for (title, rows) in [
        ("top raw words:", &report.top_raw),
        ("top words:", &report.top_words),
        ("top phrases:", &report.top_phrases),
    ] {
        writeln!(out, "{title}")?;
        for (key, count) in rows {
            writeln!(out, "  {key}: {count}")?;
        }
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::TempDir;

    fn ctx(tmp: &TempDir) -> Context {
        Context::new(Config::test_default(tmp.path()))
    }

    fn output<F>(f: F) -> (i32, String)
    where
        F: FnOnce(&mut Vec<u8>) -> Result<i32, AppError>,
    {
        let mut buf = Vec::new();
        let code = f(&mut buf).unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    fn new_args(text: &str) -> NewArgs {
        NewArgs { text: Some(text.into()), tags: vec![], meta: vec![], kind: "node".into(), echo: false }
    }

    #[test]
    fn new_records_node_and_observation() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let mut args = new_args("gate open");
        args.tags = vec!["t1".into()];
        args.meta = vec!["mood = calm".into(), "flag".into()];
        args.echo = true;

        let (code, text) = output(|o| new(&ctx, args, o));
        assert_eq!(code, 0);
        assert!(text.starts_with("✓ node recorded\n"));
        assert!(text.contains("\"tags\":[\"t1\"]"));

        let nodes = ctx.store.load().unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].meta["mood"], "calm");
        assert_eq!(nodes[0].meta["flag"], true);
        assert_eq!(ctx.log.load().unwrap().len(), 1);
    }

    #[test]
    fn blank_text_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let (code, text) = output(|o| new(&ctx, new_args("   "), o));
        assert_eq!(code, 1);
        assert_eq!(text, "no text provided\n");
        assert!(!ctx.store.exists());
    }

    #[test]
    fn empty_store_messages() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        assert_eq!(output(|o| last(&ctx, false, o)).1, "no nodes recorded\n");
        assert_eq!(output(|o| list(&ctx, 10, o)).1, "no nodes recorded\n");
        assert_eq!(output(|o| tail(&ctx, 5, o)).1, "no nodes recorded\n");
    }

    #[test]
    fn list_tail_and_search() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        for t in ["alpha one", "beta two", "Alpha three"] {
            output(|o| new(&ctx, new_args(t), o));
        }

        let (_, listed) = output(|o| list(&ctx, 2, o));
        let lines: Vec<&str> = listed.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].ends_with("  [node]  Alpha three"));

        assert_eq!(output(|o| tail(&ctx, 0, o)).1.lines().count(), 3);
        assert_eq!(output(|o| last(&ctx, false, o)).1, "Alpha three\n");

        let args = SearchArgs { query: "alpha".into(), regex: false, case: false, limit: 20 };
        let (_, found) = output(|o| search(&ctx, args, o));
        assert_eq!(found.lines().count(), 2);
        assert!(found.lines().next().unwrap().ends_with("Alpha three"));

        let args = SearchArgs { query: "gamma".into(), regex: false, case: false, limit: 20 };
        assert_eq!(output(|o| search(&ctx, args, o)).1, "no matches\n");
    }

    #[test]
    fn invalid_regex_is_usage_error() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        output(|o| new(&ctx, new_args("x"), o));
        let args = SearchArgs { query: "(".into(), regex: true, case: false, limit: 20 };
        let err = search(&ctx, args, &mut Vec::new()).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn doctor_reports_and_repairs() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        let (_, missing) = output(|o| doctor(&ctx, true, o));
        assert!(missing.ends_with("store missing: ok (no nodes yet)\n"));

        std::fs::write(ctx.store.path(), "{\"text\":\"ok\"}\nnot json\n").unwrap();
        let (_, report) = output(|o| doctor(&ctx, true, o));
        assert!(report.contains("load_nodes: 2 nodes\n"));
        assert!(report.contains("parse_error nodes present: 1\n"));
        assert!(report.contains("repair rewrite: kept=1 dropped=1\n"));
    }

    #[test]
    fn export_import_and_clear() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        output(|o| new(&ctx, new_args("keep me"), o));

        let dest = tmp.path().join("out/nodes.json");
        let (_, exported) = output(|o| export(&ctx, &dest, o));
        assert!(exported.starts_with("exported 1 nodes -> "));

        let (_, merged) = output(|o| import(&ctx, &dest, false, o));
        assert_eq!(merged, "imported 1 (merged) -> total 2\n");
        let (_, replaced) = output(|o| import(&ctx, &dest, true, o));
        assert_eq!(replaced, "imported 1 (replaced store)\n");

        assert_eq!(output(|o| clear(&ctx, true, o)).1, "cleared\n");
        assert!(ctx.store.load().unwrap().is_empty());
    }

    #[test]
    fn stats_sections() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx(&tmp);
        for t in ["coherence gate holds", "coherence layer segments"] {
            output(|o| new(&ctx, new_args(t), o));
        }
        let args = StatsArgs { top: 8, hide_top: 0, min_len: 3, frequency: false, days: 14 };
        let (_, text) = output(|o| stats(&ctx, args, o));
        assert!(text.starts_with("total nodes: 2\nactivity (last 14 days, UTC):\n"));
        assert!(text.contains("top raw words:\n  coherence: 2\n"));
        assert!(text.contains("top phrases:\n"));
    }
}
