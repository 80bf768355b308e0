//! `session` and `refine`: the two loops that drive the control plane.

use std::io::Write;

use tokio::io::BufReader;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cli::RefineArgs;
use crate::core::error::AppError;
use crate::llm::providers;
use crate::subsystems::control::{self, ControlPlane, RefineOptions, SessionSinks};
use crate::subsystems::layer::{CoherenceLayer, LayerState};

use super::Context;

/// Interactive session over stdin. The gate window and layer state carry
/// over from earlier invocations; the layer state is saved on exit.
pub async fn session<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let cfg = &ctx.config;
    let state = LayerState::load(&cfg.logs.layer_state, &cfg.layer)?;
    let mut plane = ControlPlane::from_parts(ctx.seeded_gate()?, CoherenceLayer::with_state(cfg.layer.clone(), state));
    let sinks = SessionSinks { store: ctx.store.clone(), log: ctx.log.clone() };

    // Ctrl-C ends the session cleanly.
    let shutdown = CancellationToken::new();
    let ctrlc_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("ctrl-c received, ending session");
            ctrlc_token.cancel();
        }
    });

    writeln!(out, "session started: one turn per line, Ctrl-D to end")?;
    let summary = control::run_session(&mut plane, BufReader::new(tokio::io::stdin()), out, &sinks, shutdown).await?;
    plane.layer_state().save(&cfg.logs.layer_state)?;

    writeln!(
        out,
        "session ended: {} turns, {} stabilizations, {} segments, {} seeds held",
        summary.turns, summary.stabilizations, summary.segments, summary.seeds_held
    )?;
    Ok(0)
}

/// One refinement run on a fresh plane, so enforced and unchecked runs
/// start from the same place.
pub async fn refine<W: Write>(ctx: &Context, args: RefineArgs, out: &mut W) -> Result<i32, AppError> {
    let cfg = &ctx.config;
    let provider = providers::build(&cfg.llm, cfg.llm_api_key.clone())?;
    let mut plane = ControlPlane::new(&cfg.control, cfg.layer.clone());
    let opts = RefineOptions { prompt: args.prompt, iterations: args.iterations, enforce: !args.unchecked };

    info!(provider = provider.name(), iterations = opts.iterations, enforce = opts.enforce, "refinement started");
    let trace = control::refine(&provider, &mut plane, &opts).await?;

    for p in &trace {
        writeln!(out, "t={} K={:.3} R={:.3} -> {}", p.t, p.k_t, p.r_t, p.action)?;
    }
    if let Some(path) = args.out {
        control::write_trace(&path, &trace)?;
        writeln!(out, "trace written -> {}", path.display())?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::subsystems::experiment::load_kt;
    use tempfile::TempDir;

    #[tokio::test]
    async fn refine_with_dummy_writes_trace() {
        let tmp = TempDir::new().unwrap();
        let ctx = Context::new(Config::test_default(tmp.path()));
        let path = tmp.path().join("after.jsonl");
        let args = RefineArgs { prompt: "Outline the gate.".into(), iterations: 3, unchecked: false, out: Some(path.clone()) };

        let mut out = Vec::new();
        assert_eq!(refine(&ctx, args, &mut out).await.unwrap(), 0);
        let printed = String::from_utf8(out).unwrap();
        assert_eq!(printed.lines().filter(|l| l.starts_with("t=")).count(), 3);
        assert_eq!(load_kt(&path).unwrap().len(), 3);
        assert!(!ctx.store.exists());
    }

    #[tokio::test]
    async fn unknown_provider_fails() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::test_default(tmp.path());
        config.llm.provider = "nope".into();
        let ctx = Context::new(config);
        let args = RefineArgs { prompt: "x".into(), iterations: 1, unchecked: true, out: None };
        let err = refine(&ctx, args, &mut Vec::new()).await.unwrap_err();
        assert!(err.to_string().contains("unknown provider: nope"));
    }
}
