//! Full bounded reasoning pass, stage by stage.

use serde::Serialize;

use super::bindings::{allowed_capabilities, Binding};
use super::confidence;
use super::dispatch::{dispatch, DispatchResult};
use super::execution::{execute, may_execute, ExecutionMode, ExecutionOutcome};
use super::orchestrator::{route, RouteContext, RouteResult};
use super::reflection::{reflect, Reflection};
use super::{reason, Reasoning};
use crate::core::config::PolicyConfig;
use crate::subsystems::gate::GateSnapshot;
use crate::subsystems::instrumentation::InvariantStatus;
use crate::subsystems::policy::{may_act, Decision};

#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Latest recorded gate snapshot, if any.
    pub gate: Option<GateSnapshot>,
    /// Result of invariant verification. `NoData` counts as clean here.
    pub invariants: Option<InvariantStatus>,
    pub mode: ExecutionMode,
    pub operator_ok: bool,
    pub policy: PolicyConfig,
}

#[derive(Debug, Clone, Serialize)]
pub struct PipelineTrace {
    pub result: Reasoning,
    pub confidence: f64,
    pub actuation: Decision,
    pub orchestration: RouteResult,
    pub bindings: Binding,
    pub dispatch: DispatchResult,
    pub execution_binding: Decision,
    pub execution: ExecutionOutcome,
    pub reflection: Reflection,
}

pub fn run(text: &str, opts: &PipelineOptions) -> PipelineTrace {
    let invariants = match opts.invariants {
        Some(InvariantStatus::NoData) | None => InvariantStatus::Clean,
        Some(status) => status,
    };

    let result = reason(text);
    let confidence = confidence::compute(opts.gate.as_ref(), Some(invariants));
    let actuation = may_act(confidence, invariants, None, opts.policy.confidence_threshold);

    let orchestration = route(text, RouteContext::default());
    let intent = orchestration.intent.map_or("", |i| i.as_str());
    let bindings =
        allowed_capabilities(intent, confidence, invariants, opts.policy.binding_min_confidence);

    let dispatch = dispatch(&bindings.allowed, text);
    let execution_binding = may_execute(&bindings.allowed, opts.mode, opts.operator_ok);
    let execution = match bindings.allowed.first() {
        Some(cap) if execution_binding.is_allowed() => execute(cap, text),
        _ => ExecutionOutcome::Skipped { reason: execution_binding.reason },
    };

    let reflection = reflect(text, &orchestration, confidence);

    PipelineTrace {
        result,
        confidence,
        actuation,
        orchestration,
        bindings,
        dispatch,
        execution_binding,
        execution,
        reflection,
    }
}
