//! Read-only views over the instrumentation log.

use std::io::Write;

use crate::core::error::AppError;
use crate::subsystems::instrumentation::observability::{self, WINDOW};
use crate::subsystems::instrumentation::{invariants, metrics, InvariantStatus};
use crate::subsystems::policy::{self, simulate};

use super::Context;

pub fn metrics<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let events = ctx.log.load()?;
    let Some(m) = metrics::summarize(&events) else {
        writeln!(out, "no instrumentation data")?;
        return Ok(0);
    };
    writeln!(out, "ELYRIA METRICS")?;
    writeln!(out, "-------------------------")?;
    writeln!(out, "observations        : {}", m.observations)?;
    writeln!(out, "avg entropy         : {:.4}", m.avg_entropy)?;
    writeln!(out, "avg mean entropy    : {:.4}", m.avg_mean_entropy)?;
    writeln!(out, "stabilization rate  : {:.2}%", m.stabilization_rate * 100.0)?;
    writeln!(out, "avg dampening       : {:.3}", m.avg_dampening)?;
    Ok(0)
}

pub fn observe<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let recent = ctx.log.recent(WINDOW)?;
    let Some(v) = observability::summarize(&recent) else {
        writeln!(out, "no recent data")?;
        return Ok(0);
    };
    writeln!(out, "ELYRIA OBSERVABILITY (last {} events)", v.events)?;
    writeln!(out, "--------------------------------------")?;
    writeln!(out, "entropy trend        : {}", v.entropy_trend)?;
    writeln!(out, "mean entropy trend   : {}", v.mean_entropy_trend)?;
    writeln!(out, "dampening trend      : {}", v.dampening_trend)?;
    writeln!(out, "stabilizations       : {}", v.stabilizations)?;
    writeln!(out, "avg entropy          : {:.4}", v.avg_entropy)?;
    writeln!(out, "avg dampening        : {:.3}", v.avg_dampening)?;
    Ok(0)
}

/// Exit code follows the verdict: 0 clean, 1 no data, 2 violated.
pub fn invariants<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let report = invariants::verify(&ctx.log.load_raw()?);
    match report.status {
        InvariantStatus::NoData => writeln!(out, "NO DATA: invariants unverifiable")?,
        InvariantStatus::Violated => {
            writeln!(out, "INVARIANT VIOLATIONS DETECTED")?;
            writeln!(out, "============================")?;
            for v in &report.violations {
                writeln!(out, "- event {}: {}", v.event, v.invariant)?;
            }
        }
        InvariantStatus::Clean => {
            writeln!(out, "ELYRIA INVARIANTS VERIFIED")?;
            writeln!(out, "==========================")?;
            writeln!(out, "events checked : {}", report.events_checked)?;
            writeln!(out, "invariants     : {}", report.invariants)?;
            writeln!(out, "status         : {}", report.status)?;
        }
    }
    Ok(report.status.exit_code())
}

pub fn policy<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let report = policy::analyze(&ctx.log.load()?, &ctx.config.policy);
    writeln!(out, "ELYRIA POLICY ADVISORY")?;
    writeln!(out, "======================")?;
    for (key, value) in report.rows() {
        writeln!(out, "{key:22}: {value}")?;
    }
    Ok(0)
}

pub fn actuate<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let report = policy::analyze(&ctx.log.load()?, &ctx.config.policy);
    writeln!(out, "ELYRIA ACTUATION (DRY RUN)")?;
    writeln!(out, "=========================")?;
    let recs = report.recommendations();
    if recs.is_empty() {
        writeln!(out, "no recommendations")?;
    }
    for rec in recs {
        writeln!(out, "- {}", simulate(*rec))?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::subsystems::gate::EntropyGate;
    use crate::subsystems::instrumentation::Observation;
    use tempfile::TempDir;

    fn ctx_with(tmp: &TempDir, texts: &[&str]) -> Context {
        let ctx = Context::new(Config::test_default(tmp.path()));
        let mut gate = EntropyGate::new(&ctx.config.control);
        for t in texts {
            ctx.log.append(&Observation::from_outcome(&gate.process(t))).unwrap();
        }
        ctx
    }

    fn text<F: FnOnce(&mut Vec<u8>) -> Result<i32, AppError>>(f: F) -> (i32, String) {
        let mut out = Vec::new();
        let code = f(&mut out).unwrap();
        (code, String::from_utf8(out).unwrap())
    }

    #[test]
    fn empty_log_messages() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_with(&tmp, &[]);
        assert_eq!(text(|o| metrics(&ctx, o)).1, "no instrumentation data\n");
        assert_eq!(text(|o| observe(&ctx, o)).1, "no recent data\n");
        let (code, printed) = text(|o| invariants(&ctx, o));
        assert_eq!(code, 1);
        assert!(printed.starts_with("NO DATA"));
        let (_, printed) = text(|o| actuate(&ctx, o));
        assert!(printed.ends_with("- UNKNOWN RECOMMENDATION\n"));
    }

    #[test]
    fn recorded_log_views() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_with(&tmp, &["abcdefghij", "abcdefghij"]);

        let (_, m) = text(|o| metrics(&ctx, o));
        assert!(m.contains("observations        : 2\n"));
        assert!(m.contains("stabilization rate  : 100.00%\n"));

        let (_, v) = text(|o| observe(&ctx, o));
        assert!(v.starts_with("ELYRIA OBSERVABILITY (last 2 events)\n"));
        assert!(v.contains("stabilizations       : 2\n"));

        let (code, inv) = text(|o| invariants(&ctx, o));
        assert_eq!(code, 0);
        assert!(inv.contains("status         : CLEAN\n"));

        let (_, p) = text(|o| policy(&ctx, o));
        assert!(p.contains("observations          : 2\n"));
        assert!(p.contains("'consider lowering ENTROPY_MAX'"));

        let (_, a) = text(|o| actuate(&ctx, o));
        assert!(a.contains("- SIMULATE: would decrease ENTROPY_MAX by 0.05\n"));
    }

    #[test]
    fn violations_exit_two() {
        let tmp = TempDir::new().unwrap();
        let ctx = ctx_with(&tmp, &[]);
        std::fs::write(&ctx.config.logs.instrumentation, "{\"entropy\": 2.0}\n").unwrap();
        let (code, printed) = text(|o| invariants(&ctx, o));
        assert_eq!(code, 2);
        assert!(printed.contains("- event 0: entropy_bound\n"));
    }
}
