//! Recursive self-refinement under the control plane.
//!
//! Each answer is fed back as the next prompt. With enforcement on, a
//! segment cuts the chain and restarts from the original prompt plus the
//! invariants the layer kept. Without it the loop runs unchecked, which is
//! the baseline the Kₜ trace comparison is made against.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::error::AppError;
use crate::llm::LlmProvider;
use crate::subsystems::layer::SeedPack;

use super::plane::{ControlAction, ControlPlane};

pub const REFINE_PREFIX: &str = "Refine your previous answer:\n";
const SYSTEM_PROMPT: &str = "Improve the answer you are given. Keep structure lines that start with '-' or '#'.";

#[derive(Debug, Clone)]
pub struct RefineOptions {
    pub prompt: String,
    pub iterations: usize,
    pub enforce: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePoint {
    pub t: usize,
    #[serde(rename = "K_t")]
    pub k_t: f64,
    #[serde(rename = "R_t")]
    pub r_t: f64,
    pub action: String,
}

pub async fn refine(
    provider: &LlmProvider,
    plane: &mut ControlPlane,
    opts: &RefineOptions,
) -> Result<Vec<TracePoint>, AppError> {
    let mut trace = Vec::with_capacity(opts.iterations);
    let mut next = opts.prompt.clone();

    for t in 0..opts.iterations {
        let reply = provider.complete(&next, Some(SYSTEM_PROMPT)).await?;
        if let Some(usage) = reply.usage {
            debug!(t, input = usage.input_tokens, output = usage.output_tokens, "refinement usage");
        }
        let report = plane.observe(&reply.text)?;
        trace.push(TracePoint {
            t,
            k_t: report.metrics.k_t,
            r_t: report.metrics.r_t,
            action: report.action.label().to_string(),
        });

        next = match &report.action {
            ControlAction::Segment(seed) if opts.enforce => {
                info!(t, "segment enforced, restarting from seed");
                reseed_prompt(&opts.prompt, seed)
            }
            _ => format!("{REFINE_PREFIX}{}", reply.text),
        };
    }
    Ok(trace)
}

/// Original prompt followed by the kept invariant lines, if any.
pub fn reseed_prompt(prompt: &str, seed: &SeedPack) -> String {
    let kept = &seed.invariants.constraints;
    if kept.is_empty() {
        return prompt.to_string();
    }
    format!("{prompt}\n\nKeep these constraints:\n{}", kept.join("\n"))
}

pub fn write_trace(path: &Path, trace: &[TracePoint]) -> Result<(), AppError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = fs::File::create(path)
        .map_err(|e| AppError::Store(format!("cannot write {}: {e}", path.display())))?;
    for point in trace {
        writeln!(file, "{}", serde_json::to_string(point)?)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{ControlConfig, LayerConfig};
    use crate::llm::providers::dummy::DummyProvider;
    use crate::subsystems::experiment::load_kt;
    use crate::subsystems::layer::{Invariants, SEGMENT_REASON};
    use tempfile::TempDir;

    fn seed(lines: &[&str]) -> SeedPack {
        SeedPack {
            reason: SEGMENT_REASON.into(),
            turn: 3,
            k_t: 0.1,
            r_t: 0.9,
            kt_slope_2: -0.2,
            invariants: Invariants { constraints: lines.iter().map(|l| l.to_string()).collect() },
            trace_hash: "0123456789abcdef".into(),
        }
    }

    #[test]
    fn reseed_appends_invariants() {
        let p = reseed_prompt("write a plan", &seed(&["- short", "# Plan"]));
        assert_eq!(p, "write a plan\n\nKeep these constraints:\n- short\n# Plan");
        assert_eq!(reseed_prompt("write a plan", &seed(&[])), "write a plan");
    }

    #[tokio::test]
    async fn dummy_refinement_traces_every_turn() {
        let provider = LlmProvider::Dummy(DummyProvider);
        let mut plane = ControlPlane::new(&ControlConfig::default(), LayerConfig::default());
        let opts = RefineOptions { prompt: "Describe the gate.".into(), iterations: 4, enforce: true };

        let trace = refine(&provider, &mut plane, &opts).await.unwrap();
        assert_eq!(trace.len(), 4);
        assert_eq!(trace.iter().map(|p| p.t).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        assert_eq!(plane.layer_state().turn_index, 4);
        assert!(plane.buffer().any(|l| l.starts_with("[echo] Refine your previous answer:")));
    }

    #[tokio::test]
    async fn trace_is_readable_by_comparison() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/trace.jsonl");
        let provider = LlmProvider::Dummy(DummyProvider);
        let mut plane = ControlPlane::new(&ControlConfig::default(), LayerConfig::default());
        let opts = RefineOptions { prompt: "hello.".into(), iterations: 3, enforce: false };

        let trace = refine(&provider, &mut plane, &opts).await.unwrap();
        write_trace(&path, &trace).unwrap();
        let kt = load_kt(&path).unwrap();
        assert_eq!(kt, trace.iter().map(|p| p.k_t).collect::<Vec<_>>());
    }
}
