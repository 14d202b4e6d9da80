//! LLM abstraction and the OpenAI-compatible chat-completions client.
//!
//! The responder only needs one capability: complete a single prompt (plus an optional
//! system instruction) within a time budget. Everything the provider can do wrong is
//! folded into [`LlmError`].

mod openai;

pub use openai::OpenAiClient;

use async_trait::async_trait;
use std::time::Duration;

/// One completion request: a single user prompt, optionally preceded by a system instruction.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub model: &'a str,
    pub prompt: &'a str,
    pub system: Option<&'a str>,
}

/// Generated text plus the provider's completion reason (e.g. "stop", "length").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub finish_reason: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("llm call timed out after {0:?}")]
    Timeout(Duration),
    #[error("llm request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("llm api error: {0}")]
    Api(String),
    #[error("llm returned an empty completion")]
    EmptyCompletion,
    #[error("llm response malformed: {0}")]
    Malformed(String),
}

/// Text-completion backend. Implementations must honor `timeout` themselves; callers may
/// also enforce it from outside.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
        timeout: Duration,
    ) -> Result<Completion, LlmError>;
}
