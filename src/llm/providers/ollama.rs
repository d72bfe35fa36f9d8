//! Ollama `/api/generate` provider.
//!
//! Non-streaming completion against a local Ollama server. The context window
//! (`num_ctx`) is passed per request because Ollama otherwise truncates long
//! retrieval prompts to its small built-in default.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, trace};

use crate::llm::{LlmResponse, LlmUsage, ProviderError};

use super::check_status;

#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    api_base_url: String,
    model: String,
    num_ctx: usize,
    temperature: Option<f32>,
}

impl OllamaProvider {
    pub fn new(
        api_base_url: String,
        model: String,
        num_ctx: usize,
        temperature: Option<f32>,
        timeout_seconds: u64,
    ) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| ProviderError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, api_base_url, model, num_ctx, temperature })
    }

    pub async fn complete(&self, content: &str) -> Result<LlmResponse, ProviderError> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt: content,
            stream: false,
            options: GenerateOptions {
                num_ctx: self.num_ctx,
                temperature: self.temperature,
            },
        };

        debug!(
            model = %self.model,
            num_ctx = self.num_ctx,
            content_len = content.len(),
            "sending ollama request"
        );
        if tracing::enabled!(tracing::Level::TRACE) {
            trace!(prompt = %content, "full ollama prompt");
        }

        let response = self
            .client
            .post(&self.api_base_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                error!(url = %self.api_base_url, error = %e, "ollama request failed (transport)");
                ProviderError::Request(e.to_string())
            })?;

        let response = check_status(response).await?;

        let parsed = response.json::<GenerateResponse>().await.map_err(|e| {
            error!(error = %e, "failed to deserialize ollama response");
            ProviderError::Request(format!("failed to parse response body: {e}"))
        })?;

        into_response(parsed)
    }
}

fn into_response(parsed: GenerateResponse) -> Result<LlmResponse, ProviderError> {
    if let Some(err) = parsed.error {
        return Err(ProviderError::Request(err));
    }

    let text = parsed
        .response
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ProviderError::Request("empty or missing response text".into()))?;

    let usage = match (parsed.prompt_eval_count, parsed.eval_count) {
        (None, None) => None,
        (input, output) => Some(LlmUsage {
            input_tokens: input.unwrap_or(0),
            output_tokens: output.unwrap_or(0),
        }),
    };

    Ok(LlmResponse { text, usage })
}

// ── Private wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_ctx: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    prompt_eval_count: Option<u64>,
    #[serde(default)]
    eval_count: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_carries_num_ctx() {
        let payload = GenerateRequest {
            model: "llama3.1:latest",
            prompt: "hi",
            stream: false,
            options: GenerateOptions { num_ctx: 21145, temperature: None },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["options"]["num_ctx"], 21145);
        assert_eq!(json["stream"], false);
        assert!(json["options"].get("temperature").is_none());
    }

    #[test]
    fn response_text_is_trimmed() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"model":"m","response":"  The creature.  ","done":true,"prompt_eval_count":12,"eval_count":3}"#,
        )
        .unwrap();
        let resp = into_response(parsed).unwrap();
        assert_eq!(resp.text, "The creature.");
        assert_eq!(resp.usage, Some(LlmUsage { input_tokens: 12, output_tokens: 3 }));
    }

    #[test]
    fn error_field_becomes_request_error() {
        let parsed: GenerateResponse =
            serde_json::from_str(r#"{"error":"model 'x' not found"}"#).unwrap();
        let err = into_response(parsed).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn empty_response_rejected() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"response":"   "}"#).unwrap();
        assert!(into_response(parsed).is_err());
    }
}
