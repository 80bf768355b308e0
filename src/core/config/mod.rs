//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory (or
//! the file passed with `--config`), then applies the `ELYRIA_*` env overrides.
//!
//! # Module layout
//!
//! - **types**: Public configuration structs consumed by subsystems
//!   (`Config`, `ControlConfig`, `LayerConfig`, etc.).
//! - **raw**: Raw TOML deserialization types. Kept private.
//! - **load**: Loading logic: `load`, `load_from`, `resolve_entropy_max`,
//!   `resolve_store_path`, `expand_home`.

mod load;
mod raw;
mod types;

use std::ops::RangeInclusive;

pub use load::{
    expand_home, load, load_from, resolve_entropy_max, resolve_store_path, EnvOverrides,
    ENV_ENTROPY_MAX, ENV_LLM_API_KEY, ENV_LOG_LEVEL, ENV_NODESTORE, ENV_WORK_DIR,
};
pub use types::*;

/// Entropy ceiling used when neither env nor config file sets one.
pub const DEFAULT_ENTROPY_MAX: f64 = 0.30;

/// Operating band that calibration runs have found stable.
pub const RECOMMENDED_ENTROPY_RANGE: RangeInclusive<f64> = 0.25..=0.40;

impl Config {
    /// Safe `Config` for tests. Everything lives under `work_dir`, dummy LLM,
    /// no API keys, no external calls.
    pub fn test_default(work_dir: &std::path::Path) -> Self {
        Self {
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            store: StoreConfig {
                path: work_dir.join("nodes.jsonl"),
                source: ValueSource::Default,
            },
            control: ControlConfig::default(),
            layer: LayerConfig::default(),
            policy: PolicyConfig::default(),
            logs: LogPaths {
                instrumentation: work_dir.join("instrumentation.jsonl"),
                capture: work_dir.join("capture.jsonl"),
                layer_state: work_dir.join("layer_state.json"),
            },
            llm: LlmConfig {
                provider: raw::default_llm_provider(),
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    model: "test-model".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}
