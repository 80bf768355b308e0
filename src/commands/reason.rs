//! Reasoning pipeline, orchestration, opt-in capture and the covenant.

use std::io::Write;

use crate::cli::{ReasonArgs, RouteArgs};
use crate::core::error::AppError;
use crate::subsystems::covenant::{self, COVENANT, NOTES};
use crate::subsystems::instrumentation::invariants;
use crate::subsystems::memory;
use crate::subsystems::reasoning::execution::ExecutionMode;
use crate::subsystems::reasoning::orchestrator::{self, RouteContext};
use crate::subsystems::reasoning::pipeline::{self, PipelineOptions};

use super::{text_or_prompt, write_json, Context};

/// Full pipeline trace as JSON. Confidence is drawn from the latest gate
/// observation and the current invariant verdict.
pub fn reason<W: Write>(ctx: &Context, args: ReasonArgs, out: &mut W) -> Result<i32, AppError> {
    let Some(text) = text_or_prompt(args.text, "reason → ", out)? else {
        return Ok(1);
    };
    let gate = ctx.log.recent(1)?.last().map(|o| o.snapshot());
    let verdict = invariants::verify(&ctx.log.load_raw()?).status;
    let opts = PipelineOptions {
        gate,
        invariants: Some(verdict),
        mode: if args.execute { ExecutionMode::Execute } else { ExecutionMode::DryRun },
        operator_ok: args.operator_ok,
        policy: ctx.config.policy.clone(),
    };
    write_json(out, &pipeline::run(&text, &opts))?;
    Ok(0)
}

pub fn route<W: Write>(args: RouteArgs, out: &mut W) -> Result<i32, AppError> {
    let Some(text) = text_or_prompt(args.text, "route → ", out)? else {
        return Ok(1);
    };
    let route_ctx = RouteContext { allow_summary: !args.no_summary, summary_words: args.summary_words };
    writeln!(out, "[ORCHESTRATION OUTPUT]")?;
    write_json(out, &orchestrator::route(&text, route_ctx))?;
    Ok(0)
}

pub fn capture<W: Write>(ctx: &Context, text: Option<String>, out: &mut W) -> Result<i32, AppError> {
    let Some(text) = text_or_prompt(text, "snapshot → ", out)? else {
        return Ok(1);
    };
    let outcome = memory::capture(&ctx.config.logs.capture, &text)?;
    writeln!(out, "{}", outcome.message())?;
    Ok(0)
}

pub fn covenant<W: Write>(out: &mut W) -> Result<i32, AppError> {
    writeln!(out, "ELYRIA COVENANT")?;
    writeln!(out, "===============")?;
    for (clause, holds) in COVENANT {
        writeln!(out, "{clause:28}: {holds}")?;
    }
    writeln!(out, "{:28}: {}", "covenant_holds", covenant::holds())?;
    writeln!(out)?;
    for (key, note) in NOTES {
        writeln!(out, "{key:28}: {note}")?;
    }
    Ok(0)
}
