//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! [`super::load_from`] converts them into the public [`super::Config`].

use serde::Deserialize;

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub agent: RawAgent,
    /// Named run settings; validated by `Settings::update`, so unknown keys
    /// are rejected there rather than silently ignored by serde.
    #[serde(default)]
    pub settings: toml::Table,
    #[serde(default)]
    pub retrieval: RawRetrieval,
    #[serde(default)]
    pub llm: RawLlm,
}

#[derive(Deserialize)]
pub(super) struct RawAgent {
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default = "default_work_dir")]
    pub work_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Relative to `work_dir` unless absolute.
    #[serde(default = "default_logs_dir")]
    pub logs_dir: String,
    #[serde(default = "default_true")]
    pub cold_start: bool,
    /// Directory holding prompt template overrides.
    #[serde(default)]
    pub prompts_dir: Option<String>,
}

impl Default for RawAgent {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            work_dir: default_work_dir(),
            log_level: default_log_level(),
            logs_dir: default_logs_dir(),
            cold_start: true,
            prompts_dir: None,
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawRetrieval {
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
}

impl Default for RawRetrieval {
    fn default() -> Self {
        Self { chunk_chars: default_chunk_chars() }
    }
}

// ── LLM ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawLlm {
    /// Maps to `default = "..."` in `[llm]`.
    #[serde(rename = "default", default = "default_llm_provider")]
    pub provider: String,
    #[serde(default)]
    pub ollama: RawOllamaConfig,
    #[serde(default)]
    pub openai: RawOpenAiConfig,
}

impl Default for RawLlm {
    fn default() -> Self {
        Self {
            provider: default_llm_provider(),
            ollama: RawOllamaConfig::default(),
            openai: RawOpenAiConfig::default(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOllamaConfig {
    #[serde(default = "default_ollama_api_base_url")]
    pub api_base_url: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOllamaConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_ollama_api_base_url(),
            temperature: None,
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Deserialize)]
pub(super) struct RawOpenAiConfig {
    #[serde(default = "default_openai_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_openai_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for RawOpenAiConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_openai_api_base_url(),
            temperature: default_openai_temperature(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

fn default_agent_name() -> String { "novel-agent".to_string() }
fn default_work_dir() -> String { ".".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_logs_dir() -> String { "DEMO_LOG".to_string() }
fn default_chunk_chars() -> usize { 1200 }
fn default_llm_provider() -> String { "ollama".to_string() }
fn default_ollama_api_base_url() -> String { "http://localhost:11434/api/generate".to_string() }
fn default_openai_api_base_url() -> String { "https://api.openai.com/v1/chat/completions".to_string() }
fn default_openai_temperature() -> f32 { 0.2 }
fn default_timeout_seconds() -> u64 { 300 }

fn default_true() -> bool {
    true
}
