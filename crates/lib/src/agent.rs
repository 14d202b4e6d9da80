//! One webhook turn: normalize the utterance, run the danger filter, call the LLM, shape the reply.
//!
//! Paths are checked in a fixed order (empty, danger, LLM) and exactly one produces the reply.
//! Nothing here returns an error to the caller; LLM failures become [`ReplyOutcome::Fallback`].

use crate::config::{Config, PLATFORM_TIMEOUT_MS};
use crate::llm::{CompletionRequest, LlmBackend, LlmError};
use crate::reply::{
    normalize_utterance, truncate_reply, CRISIS_REPLY, EMPTY_MESSAGE_REPLY, FALLBACK_REPLY,
};
use crate::safety::DangerFilter;
use std::sync::Arc;
use std::time::Duration;

/// Persona used when `llm.systemPrompt` is not configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "당신은 '챗버디'라는 이름의 정서 지원 대화 상대입니다. \
사용자의 감정을 먼저 공감하고 따뜻하게 받아 주세요. 판단하거나 지시하지 말고, \
사용자가 스스로 생각을 정리할 수 있도록 부드럽게 질문해 주세요. \
의학적 진단이나 처방은 하지 마세요. 답변은 한국어로, 세 문장에서 다섯 문장 정도로 짧게 해 주세요.";

/// Which path produced the reply.
#[derive(Debug)]
pub enum ReplyOutcome {
    Empty,
    Crisis,
    Generated { text: String, truncated: bool },
    Fallback { reason: LlmError },
}

impl ReplyOutcome {
    /// Text to put in the simpleText envelope.
    pub fn text(&self) -> &str {
        match self {
            ReplyOutcome::Empty => EMPTY_MESSAGE_REPLY,
            ReplyOutcome::Crisis => CRISIS_REPLY,
            ReplyOutcome::Generated { text, .. } => text.as_str(),
            ReplyOutcome::Fallback { .. } => FALLBACK_REPLY,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ReplyOutcome::Empty => "empty",
            ReplyOutcome::Crisis => "crisis",
            ReplyOutcome::Generated { .. } => "generated",
            ReplyOutcome::Fallback { .. } => "fallback",
        }
    }
}

/// Settings the responder reads on every turn.
#[derive(Debug, Clone)]
pub struct ResponderSettings {
    pub model: String,
    /// `None` or blank sends no system message.
    pub system_prompt: Option<String>,
    pub timeout: Duration,
    pub max_reply_chars: usize,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ResponderSettings {
    pub fn from_config(config: &Config) -> Self {
        let system_prompt = match &config.llm.system_prompt {
            Some(p) if p.trim().is_empty() => None,
            Some(p) => Some(p.clone()),
            None => Some(DEFAULT_SYSTEM_PROMPT.to_string()),
        };
        Self {
            model: config.llm.model.clone(),
            system_prompt,
            timeout: config.llm.timeout(),
            max_reply_chars: config.reply.max_chars,
        }
    }
}

/// Immutable per-process handler: backend, compiled filter, settings. Shared across requests.
pub struct Responder {
    backend: Arc<dyn LlmBackend>,
    filter: DangerFilter,
    settings: ResponderSettings,
}

impl Responder {
    pub fn new(
        backend: Arc<dyn LlmBackend>,
        filter: DangerFilter,
        settings: ResponderSettings,
    ) -> Self {
        if settings.timeout >= Duration::from_millis(PLATFORM_TIMEOUT_MS) {
            log::warn!(
                "responder: llm timeout {:?} is not below the platform deadline",
                settings.timeout
            );
        }
        Self {
            backend,
            filter,
            settings,
        }
    }

    /// Produce the reply for one utterance. `user_id` only tags log lines.
    pub async fn respond(&self, raw_utterance: &str, user_id: Option<&str>) -> ReplyOutcome {
        let user = user_id.unwrap_or("-");
        let utterance = normalize_utterance(raw_utterance);
        if utterance.is_empty() {
            log::debug!("responder: empty utterance from user {}", user);
            return ReplyOutcome::Empty;
        }
        if self.filter.is_dangerous(&utterance) {
            log::warn!("responder: danger keywords matched for user {}, sending crisis reply", user);
            return ReplyOutcome::Crisis;
        }
        match self.generate(&utterance).await {
            Ok(text) => {
                let (text, truncated) = truncate_reply(&text, self.settings.max_reply_chars);
                if truncated {
                    log::info!(
                        "responder: reply for user {} truncated to {} chars",
                        user,
                        self.settings.max_reply_chars
                    );
                }
                ReplyOutcome::Generated { text, truncated }
            }
            Err(reason) => {
                log::error!("responder: llm call failed for user {}: {}", user, reason);
                ReplyOutcome::Fallback { reason }
            }
        }
    }

    /// Single LLM attempt, bounded by the configured timeout even if the backend ignores it.
    async fn generate(&self, utterance: &str) -> Result<String, LlmError> {
        let timeout = self.settings.timeout;
        let request = CompletionRequest {
            model: &self.settings.model,
            prompt: utterance,
            system: self.settings.system_prompt.as_deref(),
        };
        let completion = tokio::time::timeout(timeout, self.backend.complete(request, timeout))
            .await
            .map_err(|_| LlmError::Timeout(timeout))??;
        log::debug!(
            "responder: completion finished ({})",
            completion.finish_reason.as_deref().unwrap_or("unknown")
        );
        let text = completion.text.trim();
        if text.is_empty() {
            return Err(LlmError::EmptyCompletion);
        }
        Ok(text.to_string())
    }
}
