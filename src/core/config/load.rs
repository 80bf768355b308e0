//! Configuration loading with env-var overrides.
//!
//! Reads an optional TOML file and applies `ELYRIA_*` env overrides on top.
//! Precedence for every overridable value: env > file > built-in default.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::warn;

use crate::core::error::AppError;

use super::raw::RawConfig;
use super::types::*;
use super::{DEFAULT_ENTROPY_MAX, RECOMMENDED_ENTROPY_RANGE};

pub const ENV_ENTROPY_MAX: &str = "ELYRIA_ENTROPY_MAX";
pub const ENV_NODESTORE: &str = "ELYRIA_CP_NODESTORE";
pub const ENV_WORK_DIR: &str = "ELYRIA_WORK_DIR";
pub const ENV_LOG_LEVEL: &str = "ELYRIA_LOG_LEVEL";
pub const ENV_LLM_API_KEY: &str = "LLM_API_KEY";

const DEFAULT_WORK_DIR: &str = "~/.elyria";
const DEFAULT_LOG_LEVEL: &str = "warn";
const STORE_FILENAME: &str = "nodes.jsonl";

/// Environment values that override the config file.
///
/// Captured once at process start; tests build this directly instead of
/// mutating the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvOverrides {
    pub entropy_max: Option<String>,
    pub nodestore: Option<String>,
    pub work_dir: Option<String>,
    pub log_level: Option<String>,
    pub llm_api_key: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            entropy_max: env::var(ENV_ENTROPY_MAX).ok(),
            nodestore: env::var(ENV_NODESTORE).ok(),
            work_dir: env::var(ENV_WORK_DIR).ok(),
            log_level: env::var(ENV_LOG_LEVEL).ok(),
            llm_api_key: env::var(ENV_LLM_API_KEY).ok(),
        }
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let overrides = EnvOverrides::from_env();

    if let Some(path) = config_path {
        return load_from(Some(Path::new(path)), &overrides);
    }

    let default_path = Path::new("config/default.toml");
    if default_path.exists() {
        load_from(Some(default_path), &overrides)
    } else {
        load_from(None, &overrides)
    }
}

/// Internal loader. Accepts an explicit path (or none) and explicit overrides.
pub fn load_from(path: Option<&Path>, overrides: &EnvOverrides) -> Result<Config, AppError> {
    let parsed = match path {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;
            toml::from_str::<RawConfig>(&raw)
                .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?
        }
        None => RawConfig::default(),
    };

    let work_dir_str = overrides
        .work_dir
        .as_deref()
        .or(parsed.general.work_dir.as_deref())
        .unwrap_or(DEFAULT_WORK_DIR);
    let work_dir = expand_home(work_dir_str);

    let log_level = overrides
        .log_level
        .clone()
        .or(parsed.general.log_level)
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

    let (store_path, store_source) = match (&overrides.nodestore, &parsed.store.path) {
        (Some(env_value), _) => (resolve_store_path(env_value), ValueSource::Env),
        (None, Some(file_value)) => (resolve_store_path(file_value), ValueSource::File),
        (None, None) => (absolutize(work_dir.join(STORE_FILENAME)), ValueSource::Default),
    };

    let (entropy_max, entropy_max_source) =
        resolve_entropy_max(overrides.entropy_max.as_deref(), parsed.control.entropy_max)?;

    let control_defaults = ControlConfig::default();
    let window_size = parsed.control.window_size.unwrap_or(control_defaults.window_size);
    if window_size == 0 {
        return Err(AppError::Config("control.window_size must be at least 1".into()));
    }
    let control = ControlConfig {
        entropy_max,
        entropy_max_source,
        window_size,
        stabilize_dampening: parsed
            .control
            .stabilize_dampening
            .unwrap_or(control_defaults.stabilize_dampening),
    };

    let l = LayerConfig::default();
    let rl = parsed.layer;
    let layer = LayerConfig {
        history_len: rl.history_len.unwrap_or(l.history_len).max(3),
        collapse_slope: rl.collapse_slope.unwrap_or(l.collapse_slope),
        cooldown_collapse_slope: rl.cooldown_collapse_slope.unwrap_or(l.cooldown_collapse_slope),
        recursion_high: rl.recursion_high.unwrap_or(l.recursion_high),
        coherence_low: rl.coherence_low.unwrap_or(l.coherence_low),
        cooldown_turns: rl.cooldown_turns.unwrap_or(l.cooldown_turns),
        cooldown_exit_k: rl.cooldown_exit_k.unwrap_or(l.cooldown_exit_k),
        cooldown_min_turns: rl.cooldown_min_turns.unwrap_or(l.cooldown_min_turns),
    };

    let p = PolicyConfig::default();
    let rp = parsed.policy;
    let policy = PolicyConfig {
        entropy_target: rp.entropy_target.unwrap_or(p.entropy_target),
        stabilization_target: rp.stabilization_target.unwrap_or(p.stabilization_target),
        dampening_target: rp.dampening_target.unwrap_or(p.dampening_target),
        confidence_threshold: rp.confidence_threshold.unwrap_or(p.confidence_threshold),
        binding_min_confidence: rp.binding_min_confidence.unwrap_or(p.binding_min_confidence),
    };

    let side_file = |value: Option<String>, default_name: &str| match value {
        Some(v) => absolutize(expand_home(&v)),
        None => absolutize(work_dir.join(default_name)),
    };
    let logs = LogPaths {
        instrumentation: side_file(parsed.logs.instrumentation, "instrumentation.jsonl"),
        capture: side_file(parsed.logs.capture, "capture.jsonl"),
        layer_state: side_file(parsed.logs.layer_state, "layer_state.json"),
    };

    Ok(Config {
        work_dir,
        log_level,
        store: StoreConfig { path: store_path, source: store_source },
        control,
        layer,
        policy,
        logs,
        llm: LlmConfig {
            provider: parsed.llm.provider,
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                model: parsed.llm.openai.model,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: overrides.llm_api_key.clone(),
    })
}

/// Resolve the effective entropy ceiling.
///
/// The env value wins over the file value, which wins over `0.30`. A value
/// outside the recommended `0.25–0.40` band is accepted with a warning; a
/// value that is not a finite float in `(0.0, 1.0]` is rejected, since the
/// gate's entropy measure never leaves that interval.
pub fn resolve_entropy_max(
    env_value: Option<&str>,
    file_value: Option<f64>,
) -> Result<(f64, ValueSource), AppError> {
    let (value, source) = match (env_value, file_value) {
        (Some(raw), _) => {
            let parsed = raw.trim().parse::<f64>().map_err(|e| {
                AppError::Config(format!("{ENV_ENTROPY_MAX}={raw:?} is not a float: {e}"))
            })?;
            (parsed, ValueSource::Env)
        }
        (None, Some(v)) => (v, ValueSource::File),
        (None, None) => return Ok((DEFAULT_ENTROPY_MAX, ValueSource::Default)),
    };

    if !value.is_finite() || value <= 0.0 || value > 1.0 {
        return Err(AppError::Config(format!(
            "entropy_max ({source}) must be in (0.0, 1.0], got {value}"
        )));
    }
    if !RECOMMENDED_ENTROPY_RANGE.contains(&value) {
        warn!(
            entropy_max = value,
            %source,
            "entropy_max outside the recommended 0.25–0.40 operating range"
        );
    }
    Ok((value, source))
}

/// Resolve a node store location.
///
/// A value naming an existing directory, or ending in a path separator, maps
/// to `<dir>/nodes.jsonl`; anything else is taken as the file itself.
pub fn resolve_store_path(value: &str) -> PathBuf {
    let path = absolutize(expand_home(value));
    if path.is_dir() || value.ends_with('/') || value.ends_with('\\') {
        path.join(STORE_FILENAME)
    } else {
        path
    }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}

fn absolutize(path: PathBuf) -> PathBuf {
    std::path::absolute(&path).unwrap_or(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    const MINIMAL_TOML: &str = r#"
[general]
work_dir = "~/.elyria-test"
log_level = "info"
"#;

    fn write_toml(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    #[test]
    fn entropy_max_defaults_to_point_three() {
        let (v, src) = resolve_entropy_max(None, None).unwrap();
        assert_eq!(v, 0.30);
        assert_eq!(src, ValueSource::Default);
    }

    #[test]
    fn entropy_max_env_value_used_verbatim() {
        let (v, src) = resolve_entropy_max(Some("0.35"), None).unwrap();
        assert_eq!(v, 0.35);
        assert_eq!(src, ValueSource::Env);
    }

    #[test]
    fn entropy_max_env_beats_file() {
        let (v, src) = resolve_entropy_max(Some("0.27"), Some(0.40)).unwrap();
        assert_eq!(v, 0.27);
        assert_eq!(src, ValueSource::Env);

        let (v, src) = resolve_entropy_max(None, Some(0.40)).unwrap();
        assert_eq!(v, 0.40);
        assert_eq!(src, ValueSource::File);
    }

    #[test]
    fn entropy_max_outside_recommended_band_still_accepted() {
        let (v, _) = resolve_entropy_max(Some("0.2"), None).unwrap();
        assert_eq!(v, 0.2);
    }

    #[test]
    fn entropy_max_rejects_garbage() {
        for bad in ["abc", "", "nan", "inf", "0", "-0.1", "1.5"] {
            let err = resolve_entropy_max(Some(bad), None);
            assert!(err.is_err(), "expected {bad:?} to be rejected");
        }
        assert!(resolve_entropy_max(None, Some(2.0)).is_err());
    }

    #[test]
    fn no_file_uses_builtin_defaults() {
        let cfg = load_from(None, &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.control.entropy_max, 0.30);
        assert_eq!(cfg.control.window_size, 10);
        assert_eq!(cfg.log_level, "warn");
        assert_eq!(cfg.llm.provider, "dummy");
        assert!(cfg.store.path.ends_with("nodes.jsonl"));
        assert_eq!(cfg.store.source, ValueSource::Default);
    }

    #[test]
    fn parse_basic_config() {
        let f = write_toml(MINIMAL_TOML);
        let cfg = load_from(Some(f.path()), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.log_level, "info");
        assert!(cfg.work_dir.ends_with(".elyria-test"));
        assert!(cfg.logs.instrumentation.ends_with("instrumentation.jsonl"));
    }

    #[test]
    fn file_sections_override_defaults() {
        let f = write_toml(
            r#"
[control]
entropy_max = 0.33
window_size = 4

[policy]
confidence_threshold = 0.9

[layer]
coherence_low = 0.5
"#,
        );
        let cfg = load_from(Some(f.path()), &EnvOverrides::default()).unwrap();
        assert_eq!(cfg.control.entropy_max, 0.33);
        assert_eq!(cfg.control.entropy_max_source, ValueSource::File);
        assert_eq!(cfg.control.window_size, 4);
        assert_eq!(cfg.policy.confidence_threshold, 0.9);
        assert_eq!(cfg.policy.entropy_target, 0.35);
        assert_eq!(cfg.layer.coherence_low, 0.5);
        assert_eq!(cfg.layer.recursion_high, 0.80);
    }

    #[test]
    fn zero_window_rejected() {
        let f = write_toml("[control]\nwindow_size = 0\n");
        assert!(load_from(Some(f.path()), &EnvOverrides::default()).is_err());
    }

    #[test]
    fn env_overrides_win() {
        let f = write_toml(MINIMAL_TOML);
        let overrides = EnvOverrides {
            entropy_max: Some("0.25".into()),
            work_dir: Some("/tmp/elyria-override".into()),
            log_level: Some("debug".into()),
            ..Default::default()
        };
        let cfg = load_from(Some(f.path()), &overrides).unwrap();
        assert_eq!(cfg.control.entropy_max, 0.25);
        assert_eq!(cfg.work_dir, PathBuf::from("/tmp/elyria-override"));
        assert_eq!(cfg.log_level, "debug");
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/elyria-override/nodes.jsonl"));
    }

    #[test]
    fn missing_file_errors() {
        let result = load_from(Some(Path::new("/nonexistent/config.toml")), &EnvOverrides::default());
        let msg = result.unwrap_err().to_string();
        assert!(msg.contains("config error"));
    }

    #[test]
    fn store_path_directory_resolution() {
        let dir = TempDir::new().unwrap();
        let existing = resolve_store_path(dir.path().to_str().unwrap());
        assert_eq!(existing, dir.path().join("nodes.jsonl"));

        let trailing = resolve_store_path("/tmp/not-yet-created-elyria/");
        assert_eq!(trailing, PathBuf::from("/tmp/not-yet-created-elyria/nodes.jsonl"));

        let file = resolve_store_path("/tmp/custom-store.jsonl");
        assert_eq!(file, PathBuf::from("/tmp/custom-store.jsonl"));
    }

    #[test]
    fn nodestore_env_marks_source() {
        let overrides = EnvOverrides {
            nodestore: Some("/tmp/elyria-env-store.jsonl".into()),
            ..Default::default()
        };
        let cfg = load_from(None, &overrides).unwrap();
        assert_eq!(cfg.store.path, PathBuf::from("/tmp/elyria-env-store.jsonl"));
        assert_eq!(cfg.store.source, ValueSource::Env);
    }

    #[test]
    fn tilde_expands_to_home() {
        let home = dirs::home_dir().expect("home dir must exist in test env");
        let expanded = expand_home("~/.elyria");
        assert!(expanded.starts_with(&home));
        assert!(expanded.ends_with(".elyria"));
    }

    #[test]
    fn relative_path_unchanged() {
        assert_eq!(expand_home("relative/path"), PathBuf::from("relative/path"));
    }
}
