//! Public configuration types.
//!
//! These are the resolved, ready-to-use structs that subsystems consume.
//! Raw TOML deserialization types live in `raw.rs`.

use std::fmt;
use std::path::PathBuf;

/// Where a resolved value came from. Reported by `elyria-cp config`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueSource {
    Default,
    File,
    Env,
}

impl fmt::Display for ValueSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ValueSource::Default => "default",
            ValueSource::File => "config file",
            ValueSource::Env => "env",
        };
        f.write_str(s)
    }
}

// ── Store ───────────────────────────────────────────────────────────────────

/// Node store location.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Resolved JSONL file (absolute when derived from an absolute work dir).
    pub path: PathBuf,
    pub source: ValueSource,
}

// ── Control ─────────────────────────────────────────────────────────────────

/// Entropy gate configuration.
#[derive(Debug, Clone)]
pub struct ControlConfig {
    /// Mean-entropy ceiling above which the gate activates `stabilize`.
    pub entropy_max: f64,
    pub entropy_max_source: ValueSource,
    /// Rolling window length for the mean entropy.
    pub window_size: usize,
    /// Dampening factor reported while stabilizing.
    pub stabilize_dampening: f64,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            entropy_max: super::DEFAULT_ENTROPY_MAX,
            entropy_max_source: ValueSource::Default,
            window_size: 10,
            stabilize_dampening: 0.7,
        }
    }
}

// ── Layer ───────────────────────────────────────────────────────────────────

/// Kₜ/Rₜ layer thresholds. Defaults mirror the stable v1 heuristics.
#[derive(Debug, Clone)]
pub struct LayerConfig {
    /// Number of Kₜ/Rₜ samples retained.
    pub history_len: usize,
    /// Kₜ two-step slope below which coherence is collapsing.
    pub collapse_slope: f64,
    /// Stricter slope required to re-segment during cooldown.
    pub cooldown_collapse_slope: f64,
    /// Rₜ above which recursion counts as saturated.
    pub recursion_high: f64,
    /// Kₜ below which the interaction sits in a bad basin.
    pub coherence_low: f64,
    /// Turns of cooldown entered after a segment.
    pub cooldown_turns: i64,
    /// Kₜ required to leave cooldown.
    pub cooldown_exit_k: f64,
    /// Minimum turns served before cooldown can end.
    pub cooldown_min_turns: i64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            history_len: 6,
            collapse_slope: -0.15,
            cooldown_collapse_slope: -0.30,
            recursion_high: 0.80,
            coherence_low: 0.45,
            cooldown_turns: 2,
            cooldown_exit_k: 0.90,
            cooldown_min_turns: 2,
        }
    }
}

// ── Policy ──────────────────────────────────────────────────────────────────

/// Advisory targets and actuation thresholds. None of these are enforced
/// automatically; they only shape recommendations and decisions.
#[derive(Debug, Clone)]
pub struct PolicyConfig {
    pub entropy_target: f64,
    pub stabilization_target: f64,
    pub dampening_target: f64,
    /// Minimum confidence for an ALLOW actuation decision.
    pub confidence_threshold: f64,
    /// Minimum confidence for any capability binding.
    pub binding_min_confidence: f64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            entropy_target: 0.35,
            stabilization_target: 0.60,
            dampening_target: 0.80,
            confidence_threshold: 0.75,
            binding_min_confidence: 0.5,
        }
    }
}

// ── Logs ────────────────────────────────────────────────────────────────────

/// Side files written next to the node store.
#[derive(Debug, Clone)]
pub struct LogPaths {
    /// Gate observations (JSONL).
    pub instrumentation: PathBuf,
    /// Opt-in snapshots (JSONL).
    pub capture: PathBuf,
    /// Persisted Kₜ/Rₜ layer state (JSON).
    pub layer_state: PathBuf,
}

// ── LLM ─────────────────────────────────────────────────────────────────────

/// OpenAI / OpenAI-compatible provider configuration.
/// Populated from `[llm.openai]` in the TOML.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    /// Model name passed in the request body.
    pub model: String,
    /// Sampling temperature (ignored for models that forbid it).
    pub temperature: f32,
    /// Per-request HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

/// LLM configuration used by `elyria-cp refine`.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"` or `"openai"`).
    pub provider: String,
    pub openai: OpenAiConfig,
}

// ── Root ────────────────────────────────────────────────────────────────────

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Working directory for all persistent data (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    pub store: StoreConfig,
    pub control: ControlConfig,
    pub layer: LayerConfig,
    pub policy: PolicyConfig,
    pub logs: LogPaths,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var; `None` for keyless local models.
    /// Never sourced from TOML.
    pub llm_api_key: Option<String>,
}
