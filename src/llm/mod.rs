//! LLM provider abstraction.
//!
//! `LlmProvider` is an enum over concrete provider implementations.
//! Add a new variant + module in `providers/` for each additional backend.
//!
//! Provider instances are shared immutable capabilities — clone them freely.
//! The session loop does not name `LlmProvider` directly; it is generic over
//! [`Generator`], which the enum implements.

pub mod providers;

use std::future::Future;

use thiserror::Error;
use tracing::debug;

// ── Error ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("provider request failed: {0}")]
    Request(String),
}

// ── Response ──────────────────────────────────────────────────────────────────

/// Token counts reported by the backend, when it reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LlmUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub text: String,
    pub usage: Option<LlmUsage>,
}

// ── Generation seam ───────────────────────────────────────────────────────────

/// Prompt in, text out. Used for both grounded answers and keyword extraction.
pub trait Generator {
    fn generate(&self, prompt: &str) -> impl Future<Output = Result<String, ProviderError>> + Send;
}

// ── Provider enum ─────────────────────────────────────────────────────────────

/// All available provider backends.
///
/// Enum dispatch avoids `dyn` trait objects and the `async-trait` dependency.
/// Adding a backend = new module + new variant + new `complete` arm.
#[derive(Debug, Clone)]
pub enum LlmProvider {
    Dummy(providers::dummy::DummyProvider),
    Ollama(providers::ollama::OllamaProvider),
    OpenAiCompatible(providers::openai_compatible::OpenAiCompatibleProvider),
}

impl LlmProvider {
    /// Send `content` to the provider and return its reply.
    pub async fn complete(&self, content: &str) -> Result<LlmResponse, ProviderError> {
        match self {
            LlmProvider::Dummy(p) => p.complete(content).await,
            LlmProvider::Ollama(p) => p.complete(content).await,
            LlmProvider::OpenAiCompatible(p) => p.complete(content).await,
        }
    }

    /// Short backend name for banners and log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            LlmProvider::Dummy(_) => "dummy",
            LlmProvider::Ollama(_) => "ollama",
            LlmProvider::OpenAiCompatible(_) => "openai",
        }
    }
}

impl Generator for LlmProvider {
    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let resp = self.complete(prompt).await?;
        if let Some(u) = &resp.usage {
            debug!(
                provider = self.kind(),
                input_tokens = u.input_tokens,
                output_tokens = u.output_tokens,
                "llm usage"
            );
        }
        Ok(resp.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn dummy_generates_through_enum() {
        let p = LlmProvider::Dummy(providers::dummy::DummyProvider);
        assert_eq!(p.kind(), "dummy");
        assert_eq!(p.generate("hi").await.unwrap(), "[echo] hi");
    }
}
