//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` (or an explicit `-f` path) relative to the
//! current working directory, then applies `NOVEL_AGENT_WORK_DIR` and
//! `NOVEL_AGENT_LOG_LEVEL` env overrides. When no file is given and the
//! default file is absent, built-in defaults are used.

pub mod settings;
mod raw;

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::AppError;

use raw::RawConfig;
use settings::{SettingValue, Settings};

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Ollama `/api/generate` provider configuration (`[llm.ollama]`).
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    pub api_base_url: String,
    /// Left to the server default when unset.
    pub temperature: Option<f32>,
    pub timeout_seconds: u64,
}

/// OpenAI / OpenAI-compatible provider configuration (`[llm.openai]`).
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// Full chat completions endpoint URL.
    pub api_base_url: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

/// LLM configuration. The model name itself is the `common_model` setting.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Which provider is active (`"dummy"`, `"ollama"`, `"openai"`).
    pub provider: String,
    pub ollama: OllamaConfig,
    pub openai: OpenAiConfig,
}

/// Local retriever configuration (`[retrieval]`).
#[derive(Debug, Clone)]
pub struct RetrievalConfig {
    /// Maximum characters per chunk.
    pub chunk_chars: usize,
}

/// Fully-resolved configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub name: String,
    /// Working directory for run output (already expanded, no `~`).
    pub work_dir: PathBuf,
    pub log_level: String,
    /// Root under which each run gets its own history folder.
    pub logs_dir: PathBuf,
    /// Ask the seed questions before reading user input.
    pub cold_start: bool,
    /// Prompt template overrides; built-in templates are used when unset.
    pub prompts_dir: Option<PathBuf>,
    pub settings: Settings,
    pub retrieval: RetrievalConfig,
    pub llm: LlmConfig,
    /// API key from `LLM_API_KEY` env var. Never sourced from TOML.
    pub llm_api_key: Option<String>,
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
pub fn load(config_path: Option<&Path>) -> Result<Config, AppError> {
    let work_dir_override = env::var("NOVEL_AGENT_WORK_DIR").ok();
    let log_level_override = env::var("NOVEL_AGENT_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(path, work_dir_override.as_deref(), log_level_override.as_deref());
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(default_path, work_dir_override.as_deref(), log_level_override.as_deref())
    } else {
        resolve(
            RawConfig::default(),
            work_dir_override.as_deref(),
            log_level_override.as_deref(),
        )
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
pub fn load_from(
    path: &Path,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let text = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let parsed: RawConfig = toml::from_str(&text)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    resolve(parsed, work_dir_override, log_level_override)
}

fn resolve(
    parsed: RawConfig,
    work_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let a = parsed.agent;

    let work_dir = expand_home(work_dir_override.unwrap_or(&a.work_dir));
    let log_level = log_level_override.unwrap_or(&a.log_level).to_string();
    let logs_dir = {
        let p = expand_home(&a.logs_dir);
        if p.is_absolute() { p } else { work_dir.join(p) }
    };

    let mut file_overrides = BTreeMap::new();
    for (name, value) in &parsed.settings {
        file_overrides.insert(name.clone(), SettingValue::from_toml(name, value)?);
    }
    let mut settings = Settings::default();
    settings.update(&file_overrides)?;

    if parsed.retrieval.chunk_chars == 0 {
        return Err(AppError::Config("retrieval.chunk_chars must be > 0".into()));
    }

    Ok(Config {
        name: a.name,
        work_dir,
        log_level,
        logs_dir,
        cold_start: a.cold_start,
        prompts_dir: a.prompts_dir.as_deref().map(expand_home),
        settings,
        retrieval: RetrievalConfig {
            chunk_chars: parsed.retrieval.chunk_chars,
        },
        llm: LlmConfig {
            provider: parsed.llm.provider,
            ollama: OllamaConfig {
                api_base_url: parsed.llm.ollama.api_base_url,
                temperature: parsed.llm.ollama.temperature,
                timeout_seconds: parsed.llm.ollama.timeout_seconds,
            },
            openai: OpenAiConfig {
                api_base_url: parsed.llm.openai.api_base_url,
                temperature: parsed.llm.openai.temperature,
                timeout_seconds: parsed.llm.openai.timeout_seconds,
            },
        },
        llm_api_key: env::var("LLM_API_KEY").ok(),
    })
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

// ── test helpers ──────────────────────────────────────────────────────────────

/// Safe `Config` for unit tests — dummy LLM, no API keys, no external calls.
#[cfg(test)]
impl Config {
    pub fn test_default(work_dir: &Path) -> Self {
        Self {
            name: "test".into(),
            work_dir: work_dir.to_path_buf(),
            log_level: "info".into(),
            logs_dir: work_dir.join("logs"),
            cold_start: true,
            prompts_dir: None,
            settings: Settings::default(),
            retrieval: RetrievalConfig { chunk_chars: 200 },
            llm: LlmConfig {
                provider: "dummy".into(),
                ollama: OllamaConfig {
                    api_base_url: "http://localhost:0/api/generate".into(),
                    temperature: None,
                    timeout_seconds: 1,
                },
                openai: OpenAiConfig {
                    api_base_url: "http://localhost:0/v1/chat/completions".into(),
                    temperature: 0.0,
                    timeout_seconds: 1,
                },
            },
            llm_api_key: None,
        }
    }
}
