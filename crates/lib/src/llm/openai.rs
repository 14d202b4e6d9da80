//! OpenAI-compatible chat-completions client (POST {base_url}/chat/completions).
//!
//! Non-streaming only: the reply has to be complete before the skill server's deadline anyway.

use crate::llm::{Completion, CompletionRequest, LlmBackend, LlmError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Client for an OpenAI-compatible API. Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct OpenAiClient {
    base_url: String,
    api_key: String,
    max_tokens: Option<u32>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl OpenAiClient {
    pub fn new(base_url: Option<String>, api_key: String) -> Self {
        let base_url = base_url
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self {
            base_url,
            api_key,
            max_tokens: None,
            client: reqwest::Client::new(),
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST /chat/completions — non-streaming chat.
    async fn chat(
        &self,
        request: CompletionRequest<'_>,
        timeout: Duration,
    ) -> Result<Completion, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatRequest {
            model: request.model,
            messages: build_messages(request.system, request.prompt),
            max_tokens: self.max_tokens,
        };
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| request_error(e, timeout))?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{} {}", status, body)));
        }
        let data: ChatResponse = res.json().await.map_err(|e| {
            if e.is_timeout() {
                LlmError::Timeout(timeout)
            } else {
                LlmError::Malformed(e.to_string())
            }
        })?;
        response_to_completion(data)
    }
}

#[async_trait]
impl LlmBackend for OpenAiClient {
    async fn complete(
        &self,
        request: CompletionRequest<'_>,
        timeout: Duration,
    ) -> Result<Completion, LlmError> {
        self.chat(request, timeout).await
    }
}

fn request_error(e: reqwest::Error, timeout: Duration) -> LlmError {
    if e.is_timeout() {
        LlmError::Timeout(timeout)
    } else {
        LlmError::Request(e)
    }
}

/// System instruction (when present and non-blank) followed by the single user message.
fn build_messages<'a>(system: Option<&'a str>, prompt: &'a str) -> Vec<ChatMessage<'a>> {
    let mut out = Vec::with_capacity(2);
    if let Some(s) = system.filter(|s| !s.trim().is_empty()) {
        out.push(ChatMessage::System { content: s });
    }
    out.push(ChatMessage::User { content: prompt });
    out
}

fn response_to_completion(data: ChatResponse) -> Result<Completion, LlmError> {
    if let Some(err) = data.error {
        return Err(LlmError::Api(err.message.unwrap_or_else(|| "unknown error".to_string())));
    }
    let choice = data
        .choices
        .and_then(|c| c.into_iter().next())
        .ok_or_else(|| LlmError::Malformed("no choices in response".to_string()))?;
    let text = choice
        .message
        .and_then(|m| m.content)
        .map(|c| c.trim().to_string())
        .unwrap_or_default();
    if choice.finish_reason.as_deref() == Some("content_filter") {
        log::warn!("openai: completion stopped by provider content filter");
    }
    if text.is_empty() {
        return Err(LlmError::EmptyCompletion);
    }
    Ok(Completion {
        text,
        finish_reason: choice.finish_reason,
    })
}

// --- wire types ---

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "role", rename_all = "snake_case")]
enum ChatMessage<'a> {
    System { content: &'a str },
    User { content: &'a str },
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(v: serde_json::Value) -> Result<Completion, LlmError> {
        response_to_completion(serde_json::from_value(v).unwrap())
    }

    #[test]
    fn request_body_with_system() {
        let body = ChatRequest {
            model: "gpt-4o",
            messages: build_messages(Some("be kind"), "hi"),
            max_tokens: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "gpt-4o",
                "messages": [
                    { "role": "system", "content": "be kind" },
                    { "role": "user", "content": "hi" }
                ]
            })
        );
    }

    #[test]
    fn blank_system_is_omitted() {
        let body = ChatRequest {
            model: "m",
            messages: build_messages(Some("  "), "hi"),
            max_tokens: Some(256),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "model": "m",
                "messages": [ { "role": "user", "content": "hi" } ],
                "max_tokens": 256
            })
        );
    }

    #[test]
    fn parses_first_choice() {
        let c = parse(json!({
            "choices": [
                { "message": { "role": "assistant", "content": "  hello  " }, "finish_reason": "stop" },
                { "message": { "role": "assistant", "content": "other" } }
            ]
        }))
        .unwrap();
        assert_eq!(c.text, "hello");
        assert_eq!(c.finish_reason.as_deref(), Some("stop"));
    }

    #[test]
    fn empty_and_malformed() {
        assert!(matches!(
            parse(json!({ "choices": [ { "message": { "content": "   " } } ] })),
            Err(LlmError::EmptyCompletion)
        ));
        assert!(matches!(
            parse(json!({ "choices": [ { "message": { "content": null } } ] })),
            Err(LlmError::EmptyCompletion)
        ));
        assert!(matches!(
            parse(json!({ "choices": [] })),
            Err(LlmError::Malformed(_))
        ));
        assert!(matches!(parse(json!({})), Err(LlmError::Malformed(_))));
    }

    #[test]
    fn error_body() {
        assert!(matches!(
            parse(json!({ "error": { "message": "quota exceeded" } })),
            Err(LlmError::Api(m)) if m == "quota exceeded"
        ));
    }

    #[test]
    fn base_url_trailing_slash() {
        let c = OpenAiClient::new(Some("http://localhost:1234/v1/".to_string()), "k".into());
        assert_eq!(c.base_url(), "http://localhost:1234/v1");
        let c = OpenAiClient::new(None, "k".into());
        assert_eq!(c.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn debug_hides_key() {
        let c = OpenAiClient::new(None, "sk-secret".into());
        assert!(!format!("{:?}", c).contains("sk-secret"));
    }
}
