//! Command handlers. Each writes its human-readable output to `out` and
//! returns the process exit code; failures propagate as `AppError`.

pub mod control;
pub mod experiment;
pub mod lair;
pub mod nodes;
pub mod observe;
pub mod reason;

use std::io::{self, BufRead, Write};

use tracing::debug;

use crate::cli::Command;
use crate::core::config::Config;
use crate::core::error::AppError;
use crate::subsystems::gate::EntropyGate;
use crate::subsystems::instrumentation::ObservationLog;
use crate::subsystems::store::NodeStore;

/// Everything a command needs, resolved once from the config.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub store: NodeStore,
    pub log: ObservationLog,
}

impl Context {
    pub fn new(config: Config) -> Self {
        let store = NodeStore::new(config.store.path.clone());
        let log = ObservationLog::new(config.logs.instrumentation.clone());
        Self { config, store, log }
    }

    /// A gate whose window continues from the most recent observations.
    pub fn seeded_gate(&self) -> Result<EntropyGate, AppError> {
        let cfg = &self.config.control;
        let history = self.log.recent(cfg.window_size)?;
        debug!(seeded = history.len(), "gate window restored");
        Ok(EntropyGate::new(cfg).with_history(history.iter().map(|o| o.entropy)))
    }
}

pub async fn dispatch<W: Write>(command: Command, ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    match command {
        Command::Config => nodes::config(ctx, out),
        Command::New(args) => nodes::new(ctx, args, out),
        Command::Last { raw } => nodes::last(ctx, raw, out),
        Command::List { limit } => nodes::list(ctx, limit, out),
        Command::Tail { lines } => nodes::tail(ctx, lines, out),
        Command::Search(args) => nodes::search(ctx, args, out),
        Command::Export { out: path } => nodes::export(ctx, &path, out),
        Command::Import { src, replace } => nodes::import(ctx, &src, replace, out),
        Command::Doctor { no_repair } => nodes::doctor(ctx, !no_repair, out),
        Command::Clear { yes } => nodes::clear(ctx, yes, out),
        Command::Stats(args) => nodes::stats(ctx, args, out),
        Command::Lair { action } => lair::run(ctx, action, out),
        Command::Metrics => observe::metrics(ctx, out),
        Command::Observe => observe::observe(ctx, out),
        Command::Invariants => observe::invariants(ctx, out),
        Command::Policy => observe::policy(ctx, out),
        Command::Actuate => observe::actuate(ctx, out),
        Command::Reason(args) => reason::reason(ctx, args, out),
        Command::Route(args) => reason::route(args, out),
        Command::Capture { text } => reason::capture(ctx, text, out),
        Command::Covenant => reason::covenant(out),
        Command::Stress => experiment::stress(ctx, out),
        Command::Calibrate => experiment::calibrate(ctx, out),
        Command::Compare { before, after } => experiment::compare(&before, &after, out),
        Command::Session => control::session(ctx, out).await,
        Command::Refine(args) => control::refine(ctx, args, out).await,
    }
}

/// The given text, or one line read from stdin after printing `label`.
/// `None` means stdin closed before a line arrived.
pub(crate) fn text_or_prompt<W: Write>(
    text: Option<String>,
    label: &str,
    out: &mut W,
) -> Result<Option<String>, AppError> {
    if let Some(text) = text {
        return Ok(Some(text));
    }
    write!(out, "{label}")?;
    out.flush()?;
    let mut line = String::new();
    if io::stdin().lock().read_line(&mut line)? == 0 {
        writeln!(out, "\n(cancelled)")?;
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

pub(crate) fn write_json<W: Write, T: serde::Serialize>(out: &mut W, value: &T) -> Result<(), AppError> {
    writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
    Ok(())
}
