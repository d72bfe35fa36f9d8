//! LLM provider implementations.
//!
//! `build(config, settings, api_key)` is the factory — called at startup.
//! Adding a new backend = new module + new match arm.

pub mod dummy;
pub mod ollama;
pub mod openai_compatible;

use serde::Deserialize;
use tracing::error;

use crate::config::LlmConfig;
use crate::config::settings::Settings;
use crate::llm::{LlmProvider, ProviderError};

/// Construct a `LlmProvider` from config, run settings and an optional API key.
///
/// The model name and context window come from `settings` so CLI overrides
/// of `common_model` / `num_ctx` reach the backend. `api_key` is sourced from
/// `LLM_API_KEY` env (never TOML) and is `None` for keyless local models.
pub fn build(
    config: &LlmConfig,
    settings: &Settings,
    api_key: Option<String>,
) -> Result<LlmProvider, ProviderError> {
    match config.provider.as_str() {
        "dummy" => Ok(LlmProvider::Dummy(dummy::DummyProvider)),
        "ollama" => {
            let o = &config.ollama;
            let p = ollama::OllamaProvider::new(
                o.api_base_url.clone(),
                settings.common_model().to_string(),
                settings.num_ctx(),
                o.temperature,
                o.timeout_seconds,
            )?;
            Ok(LlmProvider::Ollama(p))
        }
        "openai" | "openai-compatible" => {
            let oai = &config.openai;
            let p = openai_compatible::OpenAiCompatibleProvider::new(
                oai.api_base_url.clone(),
                settings.common_model().to_string(),
                oai.temperature,
                oai.timeout_seconds,
                api_key,
            )?;
            Ok(LlmProvider::OpenAiCompatible(p))
        }
        _ => Err(ProviderError::UnknownProvider(config.provider.clone())),
    }
}

// Error envelope used by OpenAI-compatible APIs; Ollama uses a bare string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ErrorEnvelope {
    Structured { error: ErrorBody },
    Plain { error: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// Consume the response and return it if successful, or a structured error.
pub(super) async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<failed to read error body>".to_string());

    let message = describe_error(status, &body);
    error!(%status, %message, "LLM request returned HTTP error");
    Err(ProviderError::Request(message))
}

fn describe_error(status: reqwest::StatusCode, body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope::Structured { error }) => {
            let code = error
                .code
                .map(|v| match v {
                    serde_json::Value::String(s) => format!(" [code={s}]"),
                    other => format!(" [code={other}]"),
                })
                .unwrap_or_default();
            format!("HTTP {status}{code}: {}", error.message)
        }
        Ok(ErrorEnvelope::Plain { error }) => format!("HTTP {status}: {error}"),
        Err(_) => format!("HTTP {status}: {body}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use reqwest::StatusCode;

    #[test]
    fn builds_dummy() {
        let cfg = Config::test_default(std::path::Path::new("/tmp"));
        let p = build(&cfg.llm, &cfg.settings, None).unwrap();
        assert_eq!(p.kind(), "dummy");
    }

    #[test]
    fn builds_ollama_and_openai() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp"));
        cfg.llm.provider = "ollama".into();
        assert_eq!(build(&cfg.llm, &cfg.settings, None).unwrap().kind(), "ollama");
        cfg.llm.provider = "openai-compatible".into();
        assert_eq!(build(&cfg.llm, &cfg.settings, None).unwrap().kind(), "openai");
    }

    #[test]
    fn unknown_provider_errors() {
        let mut cfg = Config::test_default(std::path::Path::new("/tmp"));
        cfg.llm.provider = "gemini".into();
        assert!(matches!(
            build(&cfg.llm, &cfg.settings, None),
            Err(ProviderError::UnknownProvider(name)) if name == "gemini"
        ));
    }

    #[test]
    fn describes_openai_envelope() {
        let msg = describe_error(
            StatusCode::UNAUTHORIZED,
            r#"{"error":{"message":"bad key","code":"invalid_api_key"}}"#,
        );
        assert!(msg.contains("401"));
        assert!(msg.contains("[code=invalid_api_key]"));
        assert!(msg.contains("bad key"));
    }

    #[test]
    fn describes_ollama_envelope() {
        let msg = describe_error(StatusCode::NOT_FOUND, r#"{"error":"model not found"}"#);
        assert_eq!(msg, "HTTP 404 Not Found: model not found");
    }

    #[test]
    fn falls_back_to_raw_body() {
        let msg = describe_error(StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.ends_with("upstream down"));
    }
}
