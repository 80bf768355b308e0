//! Stress harness, threshold calibration and Kₜ trace comparison.

use std::io::Write;
use std::path::Path;

use serde_json::json;

use crate::core::error::AppError;
use crate::subsystems::experiment::{self, load_kt, summarize_kt, CALIBRATION_THRESHOLDS};
use crate::subsystems::instrumentation::Observation;
use crate::subsystems::store::Node;

use super::Context;

/// Record every stress case as a node and let the gate observe it, the same
/// way `new` does.
pub fn stress<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    writeln!(out, "ELYRIA STRESS HARNESS")?;
    writeln!(out, "=====================")?;
    let mut gate = ctx.seeded_gate()?;
    for case in experiment::stress_cases() {
        writeln!(out, "\n--- case: {} ---", case.label)?;
        let mut node = Node::new("node", case.text.as_str());
        node.meta.insert("stress_case".into(), json!(case.label));
        ctx.store.append(node)?;

        let outcome = gate.process(&case.text);
        ctx.log.append(&Observation::from_outcome(&outcome))?;
        writeln!(out, "✓ node recorded")?;
        writeln!(
            out,
            "entropy {} mean {} dampening {}",
            outcome.snapshot.entropy, outcome.snapshot.mean_entropy, outcome.dampening
        )?;
    }
    writeln!(out, "\nStress run complete.")?;
    Ok(0)
}

pub fn calibrate<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    writeln!(out, "ELYRIA CALIBRATION")?;
    writeln!(out, "==================")?;
    writeln!(out, "threshold | obs | stab_rate | avg_entropy | avg_damp")?;
    writeln!(out, "----------+-----+-----------+-------------+----------")?;
    for row in experiment::calibrate(&CALIBRATION_THRESHOLDS, &ctx.config.control) {
        match row.summary {
            Some(m) => writeln!(
                out,
                "{:>9.2} | {:>3} | {:>9} | {:>11.4} | {:>8.3}",
                row.threshold,
                m.observations,
                format!("{:.2}%", m.stabilization_rate * 100.0),
                m.avg_entropy,
                m.avg_dampening
            )?,
            None => writeln!(out, "{:>9.2} | {:>3} | {:>9} | {:>11} | {:>8}", row.threshold, 0, "-", "-", "-")?,
        }
    }
    Ok(0)
}

pub fn compare<W: Write>(before: &Path, after: &Path, out: &mut W) -> Result<i32, AppError> {
    for (label, path) in [("BEFORE (unchecked recursion)", before), ("AFTER (control plane enforced)", after)] {
        let Some(s) = summarize_kt(&load_kt(path)?) else {
            writeln!(out, "{label}: no Kt data found")?;
            continue;
        };
        writeln!(out, "{label}")?;
        writeln!(out, "  steps: {}", s.steps)?;
        writeln!(out, "  start: {:.2}", s.start)?;
        writeln!(out, "  end:   {:.2}", s.end)?;
        writeln!(out, "  delta: {:.2}", s.delta)?;
        writeln!(out)?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use tempfile::TempDir;

    #[test]
    fn stress_records_every_case() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(Config::test_default(tmp.path()));
        let mut out = Vec::new();
        stress(&ctx, &mut out).unwrap();

        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.matches("--- case: ").count(), 5);
        assert!(printed.ends_with("Stress run complete.\n"));
        let nodes = ctx.store.load().unwrap();
        assert_eq!(nodes.len(), 5);
        assert_eq!(nodes[2].meta["stress_case"], "repetition");
        assert_eq!(ctx.log.load().unwrap().len(), 5);
    }

    #[test]
    fn calibration_table_has_a_row_per_threshold() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(Config::test_default(tmp.path()));
        let mut out = Vec::new();
        calibrate(&ctx, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.lines().count(), 4 + CALIBRATION_THRESHOLDS.len());
        assert!(printed.lines().nth(4).unwrap().starts_with("     0.20 |   5 |"));
        assert!(!ctx.config.logs.instrumentation.exists());
    }

    #[test]
    fn compare_summarizes_both_traces() {
        let tmp = TempDir::new().unwrap();
        let before = tmp.path().join("before.jsonl");
        let after = tmp.path().join("after.jsonl");
        std::fs::write(&before, "{\"t\":0,\"Kt\":0.9}\n{\"t\":1,\"Kt\":0.3}\n").unwrap();
        std::fs::write(&after, "{\"t\":0,\"note\":1}\n").unwrap();

        let mut out = Vec::new();
        compare(&before, &after, &mut out).unwrap();
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.starts_with("BEFORE (unchecked recursion)\n  steps: 2\n  start: 0.90\n"));
        assert!(printed.contains("  delta: -0.60\n"));
        assert!(printed.ends_with("AFTER (control plane enforced): no Kt data found\n"));
    }
}
