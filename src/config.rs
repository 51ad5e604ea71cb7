//! Planner configuration loading.
//!
//! Reads `tripplanner.yaml` and resolves environment variables. Every
//! section and field has a built-in default, so a missing file or a partial
//! file is fine.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// File searched for when `TRIPPLANNER_CONFIG` is not set.
pub const CONFIG_FILE_NAME: &str = "tripplanner.yaml";

/// Env var pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "TRIPPLANNER_CONFIG";

// ─── Errors ──────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("failed to parse config: {reason}")]
    Parse { reason: String },
}

// ─── Public Types ────────────────────────────────────────────────────────────

/// Top-level configuration (mirrors `tripplanner.yaml`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub generation: GenerationConfig,
    pub retrieval: RetrievalConfig,
    pub dialogue: DialogueConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// Env vars checked for the API key, in order. The first non-empty wins.
    pub api_key_env: Vec<String>,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://models.inference.ai.azure.com".into(),
            model: "gpt-4o".into(),
            api_key_env: vec!["GITHUB_TOKEN".into(), "OPENAI_API_KEY".into()],
            temperature: 0.7,
            max_tokens: 2000,
            request_timeout_secs: 60,
        }
    }
}

impl GenerationConfig {
    /// Apply `OPENAI_BASE_URL` / `OPENAI_MODEL` on top of the file values.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("OPENAI_BASE_URL").filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(model) = lookup("OPENAI_MODEL").filter(|v| !v.is_empty()) {
            self.model = model;
        }
    }

    /// First non-empty API key among `api_key_env`.
    pub fn resolve_api_key(&self, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
        self.api_key_env
            .iter()
            .filter_map(|name| lookup(name))
            .map(|v| v.trim().to_string())
            .find(|v| !v.is_empty())
    }
}

/// Retrieval endpoint and per-category deadlines.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Base URL of the retrieval service. Absent means fallback data only.
    pub endpoint: Option<String>,
    pub user_agent: String,
    pub flights_timeout_secs: u64,
    pub hotels_timeout_secs: u64,
    pub restaurants_timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            user_agent: "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                .into(),
            flights_timeout_secs: 20,
            hotels_timeout_secs: 20,
            restaurants_timeout_secs: 30,
        }
    }
}

/// Dialogue policy thresholds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DialogueConfig {
    /// Questions are only asked while the user turn count is below this.
    pub max_question_turns: usize,
    /// With destination and dates known, generation is forced at this turn.
    pub forced_generation_turns: usize,
    /// Number of recent turns replayed into generation requests.
    pub history_window: usize,
}

impl Default for DialogueConfig {
    fn default() -> Self {
        Self {
            max_question_turns: 5,
            forced_generation_turns: 6,
            history_window: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence.
    pub filter: String,
    pub json: bool,
    /// Log file, appended to. `None` logs to stderr only.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "tripplanner=info,warn".into(),
            json: false,
            file: Some(crate::data_dir().join("planner.log")),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub ttl_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self { ttl_secs: 3600 }
    }
}

// ─── Loading ─────────────────────────────────────────────────────────────────

/// Locate the config file.
///
/// `TRIPPLANNER_CONFIG` wins when it names an existing file; otherwise
/// searches upward from `start` for `tripplanner.yaml`.
pub fn find_config_path(start: &Path) -> Option<PathBuf> {
    if let Ok(explicit) = std::env::var(CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(expand_tilde(&explicit));
        if candidate.is_file() {
            return Some(candidate);
        }
        tracing::warn!(path = %candidate.display(), "{CONFIG_ENV_VAR} does not name a file, searching instead");
    }

    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Load and parse a config file.
///
/// Performs environment-variable interpolation on `${VAR_NAME}` and
/// `${VAR_NAME:-default}` before parsing.
pub fn load_config(path: &Path) -> Result<PlannerConfig, ConfigError> {
    let raw = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    parse_config(&raw)
}

/// Parse config text. Empty text yields the defaults.
pub fn parse_config(raw: &str) -> Result<PlannerConfig, ConfigError> {
    let interpolated = interpolate_env_vars(raw);
    if interpolated.trim().is_empty() {
        return Ok(PlannerConfig::default());
    }
    serde_yaml::from_str(&interpolated).map_err(|e| ConfigError::Parse {
        reason: e.to_string(),
    })
}

impl PlannerConfig {
    /// Find and load the config, falling back to defaults when no file
    /// exists, then apply `OPENAI_*` overrides.
    pub fn load_or_default(start: &Path) -> Result<Self, ConfigError> {
        let mut config = match find_config_path(start) {
            Some(path) => {
                tracing::info!(path = %path.display(), "loading config");
                load_config(&path)?
            }
            None => PlannerConfig::default(),
        };
        config
            .generation
            .apply_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }
}

/// Replace `${VAR}` and `${VAR:-default}` with environment values.
fn interpolate_env_vars(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && chars.peek() == Some(&'{') {
            chars.next();
            let mut var_expr = String::new();
            for c in chars.by_ref() {
                if c == '}' {
                    break;
                }
                var_expr.push(c);
            }
            result.push_str(&resolve_var_expr(&var_expr));
        } else {
            result.push(ch);
        }
    }

    result
}

fn resolve_var_expr(expr: &str) -> String {
    if let Some(idx) = expr.find(":-") {
        let var_name = &expr[..idx];
        let default = &expr[idx + 2..];
        std::env::var(var_name).unwrap_or_else(|_| expand_tilde(default))
    } else {
        std::env::var(expr).unwrap_or_default()
    }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix('~') {
        if let Some(home) = dirs::home_dir() {
            return format!("{}{rest}", home.display());
        }
    }
    path.to_string()
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = PlannerConfig::default();
        assert_eq!(config.generation.model, "gpt-4o");
        assert_eq!(config.generation.max_tokens, 2000);
        assert_eq!(config.dialogue.max_question_turns, 5);
        assert_eq!(config.dialogue.forced_generation_turns, 6);
        assert_eq!(config.retrieval.restaurants_timeout_secs, 30);
        assert!(config.retrieval.endpoint.is_none());
        assert_eq!(config.session.ttl_secs, 3600);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            dialogue:
              max_question_turns: 3
            retrieval:
              endpoint: "http://localhost:8088"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialogue.max_question_turns, 3);
        assert_eq!(config.dialogue.history_window, 10);
        assert_eq!(config.retrieval.endpoint.as_deref(), Some("http://localhost:8088"));
        assert_eq!(config.retrieval.flights_timeout_secs, 20);
        assert_eq!(config.generation.base_url, "https://models.inference.ai.azure.com");
    }

    #[test]
    fn test_empty_file_is_default() {
        let config = parse_config("").unwrap();
        assert_eq!(config.generation.model, "gpt-4o");
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("dialogue: [unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_read_error() {
        let err = load_config(Path::new("/definitely/not/here/tripplanner.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_find_config_searches_upward() {
        let root = tempfile::tempdir().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join(CONFIG_FILE_NAME), "session:\n  ttl_secs: 60\n").unwrap();

        let found = find_config_path(&nested).unwrap();
        assert_eq!(found, root.path().join(CONFIG_FILE_NAME));
        assert_eq!(load_config(&found).unwrap().session.ttl_secs, 60);
    }

    #[test]
    fn test_interpolate_env_vars_with_default() {
        std::env::remove_var("__TRIPPLANNER_TEST_MISSING__");
        let result = interpolate_env_vars("${__TRIPPLANNER_TEST_MISSING__:-gpt-4o-mini}");
        assert_eq!(result, "gpt-4o-mini");
    }

    #[test]
    fn test_interpolate_env_vars_with_value() {
        std::env::set_var("__TRIPPLANNER_TEST_MODEL__", "llama3");
        let result = interpolate_env_vars("model: ${__TRIPPLANNER_TEST_MODEL__:-gpt-4o}");
        assert_eq!(result, "model: llama3");
        std::env::remove_var("__TRIPPLANNER_TEST_MODEL__");
    }

    #[test]
    fn test_interpolate_no_vars() {
        let input = "plain text with $ but no braces";
        assert_eq!(interpolate_env_vars(input), input);
    }

    #[test]
    fn test_env_overrides() {
        let mut generation = GenerationConfig::default();
        generation.apply_overrides(env(&[
            ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
            ("OPENAI_MODEL", ""),
        ]));
        assert_eq!(generation.base_url, "http://localhost:11434/v1");
        assert_eq!(generation.model, "gpt-4o");
    }

    #[test]
    fn test_api_key_first_non_empty_wins() {
        let generation = GenerationConfig::default();
        let key = generation.resolve_api_key(env(&[("GITHUB_TOKEN", "  "), ("OPENAI_API_KEY", "sk-1")]));
        assert_eq!(key.as_deref(), Some("sk-1"));
        assert!(generation.resolve_api_key(env(&[])).is_none());
    }
}
