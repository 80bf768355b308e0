//! One control step per turn: gate, score, decide.

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::core::config::{ControlConfig, LayerConfig};
use crate::core::error::AppError;
use crate::subsystems::gate::{EntropyGate, GateOutcome, GateSnapshot};
use crate::subsystems::instrumentation::Observation;
use crate::subsystems::layer::{CoherenceLayer, LayerState, SeedPack, TurnMetrics};
use crate::subsystems::memory::TtlMemory;

/// Lines of recent turn text kept for invariant extraction.
pub const BUFFER_CAP: usize = 32;
pub const SEED_REASON: &str = "segment seed";
const SEED_TTL_MINUTES: i64 = 30;

/// What the plane decided for a turn. A segment outranks stabilization.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ControlAction {
    Continue,
    Stabilize { dampening: f64 },
    Segment(SeedPack),
}

impl ControlAction {
    pub fn label(&self) -> &'static str {
        match self {
            ControlAction::Continue => "continue",
            ControlAction::Stabilize { .. } => "stabilize",
            ControlAction::Segment(_) => "segment",
        }
    }

    pub fn seed(&self) -> Option<&SeedPack> {
        match self {
            ControlAction::Segment(seed) => Some(seed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    pub gate: GateSnapshot,
    pub dampening: f64,
    pub metrics: TurnMetrics,
    pub action: ControlAction,
}

impl TurnReport {
    /// The gate half of the report, as the instrumentation log records it.
    pub fn observation(&self) -> Observation {
        Observation::from_outcome(&GateOutcome { snapshot: self.gate.clone(), dampening: self.dampening })
    }

    pub fn status_line(&self) -> String {
        let m = &self.metrics;
        let mut line = format!(
            "t={} K={:.3} R={:.3} H={:.3} -> {}",
            m.turn,
            m.k_t,
            m.r_t,
            self.gate.mean_entropy,
            self.action.label()
        );
        match &self.action {
            ControlAction::Stabilize { dampening } => line.push_str(&format!(" (dampening {dampening})")),
            ControlAction::Segment(seed) => {
                line.push_str(&format!(" ({} invariants kept)", seed.invariants.constraints.len()))
            }
            ControlAction::Continue => {}
        }
        if m.cooldown {
            line.push_str(" [cooldown]");
        }
        line
    }
}

#[derive(Debug)]
pub struct ControlPlane {
    gate: EntropyGate,
    layer: CoherenceLayer,
    buffer: VecDeque<String>,
    memory: TtlMemory,
}

impl ControlPlane {
    pub fn new(control: &ControlConfig, layer: LayerConfig) -> Self {
        Self::from_parts(EntropyGate::new(control), CoherenceLayer::new(layer))
    }

    /// Resume from a seeded gate and a restored layer.
    pub fn from_parts(gate: EntropyGate, layer: CoherenceLayer) -> Self {
        Self { gate, layer, buffer: VecDeque::with_capacity(BUFFER_CAP), memory: TtlMemory::new() }
    }

    pub fn layer_state(&self) -> &LayerState {
        self.layer.state()
    }

    pub fn buffer(&self) -> impl Iterator<Item = &str> {
        self.buffer.iter().map(String::as_str)
    }

    pub fn observe(&mut self, text: &str) -> Result<TurnReport, AppError> {
        self.observe_at(text, Utc::now())
    }

    /// `observe` against an explicit clock. Expired seeds are purged first.
    pub fn observe_at(&mut self, text: &str, now: DateTime<Utc>) -> Result<TurnReport, AppError> {
        self.memory.purge_at(now);
        let outcome = self.gate.process(text);
        let metrics = self.layer.update(text);
        for line in text.lines() {
            if self.buffer.len() == BUFFER_CAP {
                self.buffer.pop_front();
            }
            self.buffer.push_back(line.to_string());
        }

        let action = if self.layer.should_segment() {
            let lines: Vec<String> = self.buffer.iter().cloned().collect();
            let seed = self.layer.segment(&lines);
            self.reset_to(&seed);
            self.memory.write_at(
                serde_json::to_string(&seed)?,
                SEED_REASON,
                Duration::minutes(SEED_TTL_MINUTES),
                now,
            )?;
            ControlAction::Segment(seed)
        } else if outcome.snapshot.is_stabilizing() {
            ControlAction::Stabilize { dampening: outcome.dampening }
        } else {
            ControlAction::Continue
        };
        debug!(turn = metrics.turn, action = action.label(), "turn observed");

        Ok(TurnReport { gate: outcome.snapshot, dampening: outcome.dampening, metrics, action })
    }

    /// Seeds still held in memory, newest last.
    pub fn remembered_seeds(&mut self) -> Vec<SeedPack> {
        self.memory
            .read()
            .into_iter()
            .filter(|m| m.reason == SEED_REASON)
            .filter_map(|m| serde_json::from_str(&m.content).ok())
            .collect()
    }

    fn reset_to(&mut self, seed: &SeedPack) {
        self.buffer.clear();
        self.buffer.extend(seed.invariants.constraints.iter().cloned());
        info!(turn = seed.turn, kept = self.buffer.len(), "turn buffer reset to invariants");
    }
}
