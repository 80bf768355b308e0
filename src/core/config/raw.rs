//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape. Every section and key is
//! optional; the `load` module fills gaps from the `types` defaults.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape, the serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub general: RawGeneral,
    #[serde(default)]
    pub store: RawStore,
    #[serde(default)]
    pub control: RawControl,
    #[serde(default)]
    pub layer: RawLayer,
    #[serde(default)]
    pub policy: RawPolicy,
    #[serde(default)]
    pub logs: RawLogs,
    #[serde(default)]
    pub llm: RawLlm,
}

#[derive(Deserialize, Default)]
pub(super) struct RawGeneral {
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
}

#[derive(Deserialize, Default)]
pub(super) struct RawStore {
    /// Same semantics as `ELYRIA_CP_NODESTORE` (directory or file).
    pub path: Option<String>,
}

// ── Control / layer / policy ─────────────────────────────────────────────────

#[derive(Deserialize, Default)]
pub(super) struct RawControl {
    pub entropy_max: Option<f64>,
    pub window_size: Option<usize>,
    pub stabilize_dampening: Option<f64>,
}

#[derive(Deserialize, Default)]
pub(super) struct RawLayer {
    pub history_len: Option<usize>,
    pub collapse_slope: Option<f64>,
    pub cooldown_collapse_slope: Option<f64>,
    pub recursion_high: Option<f64>,
    pub coherence_low: Option<f64>,
    pub cooldown_turns: Option<i64>,
    pub cooldown_exit_k: Option<f64>,
    pub cooldown_min_turns: Option<i64>,
}

#[derive(Deserialize, Default)]
pub(super) struct RawPolicy {
    pub entropy_target: Option<f64>,
    pub stabilization_target: Option<f64>,
    pub dampening_target: Option<f64>,
    pub confidence_threshold: Option<f64>,
    pub binding_min_confidence: Option<f64>,
}

#[derive(Deserialize, Default)]
pub(super) struct RawLogs {
    pub instrumentation: Option<String>,
    pub capture: Option<String>,
    pub layer_state: Option<String>,
}

// ── LLM ──────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self { provider: default_llm_provider(), openai: RawOpenAiConfig::default() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_model")]
    pub model: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_openai_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            model: default_openai_model(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_openai_timeout_seconds(),
        }
    }
}

pub(super) fn default_llm_provider() -> String { "dummy".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_model() -> String { "gpt-4o-mini".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_openai_timeout_seconds() -> u64 { 60 }
