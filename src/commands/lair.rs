//! `lair`: drive the gate and the layer by hand and inspect what they hold.

use std::io::Write;

use serde_json::{json, Value};

use crate::cli::{LairCommand, LairRunArgs};
use crate::core::error::AppError;
use crate::subsystems::instrumentation::Observation;
use crate::subsystems::layer::{CoherenceLayer, LayerState};
use crate::subsystems::store::Node;
use crate::subsystems::themes;

use super::{text_or_prompt, write_json, Context};

pub fn run<W: Write>(ctx: &Context, action: LairCommand, out: &mut W) -> Result<i32, AppError> {
    match action {
        LairCommand::Status => status(ctx, out),
        LairCommand::Gate(args) => prompted(ctx, args, "→ gate: ", out, gate),
        LairCommand::Layer(args) => prompted(ctx, args, "→ layer: ", out, layer),
        LairCommand::Replay { n, no_gate, layer: with_layer } => replay(ctx, n, !no_gate, with_layer, out),
    }
}

type Step<W> = fn(&Context, &str, bool, &mut W) -> Result<(), AppError>;

fn prompted<W: Write>(
    ctx: &Context,
    args: LairRunArgs,
    label: &str,
    out: &mut W,
    step: Step<W>,
) -> Result<i32, AppError> {
    let Some(text) = text_or_prompt(args.text, label, out)? else {
        return Ok(1);
    };
    step(ctx, &text, !args.no_record, out)?;
    Ok(0)
}

fn status<W: Write>(ctx: &Context, out: &mut W) -> Result<i32, AppError> {
    let cfg = &ctx.config;
    let recent = ctx.log.recent(cfg.control.window_size)?;
    let state = LayerState::load(&cfg.logs.layer_state, &cfg.layer)?;
    let texts: Vec<String> = ctx.store.load()?.iter().map(Node::resolved_text).collect();

    writeln!(out, "INTELLIGENCE LAIR STATUS")?;
    writeln!(out, "  store: {}", ctx.store.path().display())?;
    writeln!(
        out,
        "  gate:  entropy_max {} ({}), window {}/{}",
        cfg.control.entropy_max,
        cfg.control.entropy_max_source,
        recent.len(),
        cfg.control.window_size
    )?;
    if let Some(last) = recent.last() {
        writeln!(out, "  gate last: mean_entropy {} dampening {}", last.mean_entropy, last.dampening)?;
    }
    writeln!(out, "  layer: {}", cfg.logs.layer_state.display())?;
    writeln!(
        out,
        "  layer turn {}: K_t {:.3} R_t {:.3} cooldown {}",
        state.turn_index,
        state.k_t,
        state.r_t,
        if state.cooldown_active { "on" } else { "off" }
    )?;
    writeln!(out, "  insight: {}", themes::insight(&texts))?;
    writeln!(out)?;
    writeln!(out, "Tip:")?;
    writeln!(out, "  elyria-cp lair gate \"elyria rise\"")?;
    writeln!(out, "  elyria-cp lair layer \"gate open\"")?;
    writeln!(out, "  elyria-cp lair replay -n 5 --layer")?;
    Ok(0)
}

fn record<W: Write>(ctx: &Context, kind: &str, text: &str, result: Value, out: &mut W) -> Result<(), AppError> {
    let mut node = Node::new(kind, text);
    node.extra.insert(kind.to_string(), result);
    ctx.store.append(node)?;
    writeln!(out, "✓ recorded {kind} result")?;
    Ok(())
}

/// One gate pass. The observation is always logged; the node only on `record`.
fn gate<W: Write>(ctx: &Context, text: &str, record_node: bool, out: &mut W) -> Result<(), AppError> {
    let outcome = ctx.seeded_gate()?.process(text);
    ctx.log.append(&Observation::from_outcome(&outcome))?;
    write_json(out, &outcome)?;
    if record_node {
        record(ctx, "gate", text, serde_json::to_value(&outcome)?, out)?;
    }
    Ok(())
}

/// One layer pass against the persisted state. The text's own lines are the
/// buffer a segment draws invariants from.
fn layer<W: Write>(ctx: &Context, text: &str, record_node: bool, out: &mut W) -> Result<(), AppError> {
    let cfg = &ctx.config;
    let state = LayerState::load(&cfg.logs.layer_state, &cfg.layer)?;
    let mut layer = CoherenceLayer::with_state(cfg.layer.clone(), state);

    let metrics = layer.update(text);
    let seed = if layer.should_segment() {
        let buffer: Vec<String> = text.lines().map(str::to_string).collect();
        Some(layer.segment(&buffer))
    } else {
        None
    };
    layer.into_state().save(&cfg.logs.layer_state)?;

    let result = json!({ "metrics": metrics, "segment": seed });
    write_json(out, &result)?;
    if record_node {
        record(ctx, "layer", text, result, out)?;
    }
    Ok(())
}

fn replay<W: Write>(ctx: &Context, n: usize, with_gate: bool, with_layer: bool, out: &mut W) -> Result<i32, AppError> {
    let nodes = ctx.store.load()?;
    if nodes.is_empty() {
        writeln!(out, "no nodes recorded")?;
        return Ok(0);
    }
    let texts: Vec<String> = nodes[nodes.len().saturating_sub(n)..].iter().map(Node::resolved_text).collect();
    for text in &texts {
        if with_gate {
            writeln!(out, "\n--- gate ---")?;
            gate(ctx, text, true, out)?;
        }
        if with_layer {
            writeln!(out, "\n--- layer ---")?;
            layer(ctx, text, true, out)?;
        }
    }
    Ok(0)
}
