//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.chatbuddy/config.json`) and environment.
//! Everything is read once at startup and is immutable afterwards.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// The skill server gives up after 5 seconds; the LLM budget must stay below it.
pub const PLATFORM_TIMEOUT_MS: u64 = 5000;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// HTTP server settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// LLM provider settings (OpenAI-compatible chat completions).
    #[serde(default)]
    pub llm: LlmConfig,

    /// Reply shaping.
    #[serde(default)]
    pub reply: ReplyConfig,

    /// Danger-keyword filter.
    #[serde(default)]
    pub safety: SafetyConfig,
}

/// Gateway bind and port.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayConfig {
    /// Port for HTTP (default 5000). Overridden by PORT env.
    #[serde(default = "default_gateway_port")]
    pub port: u16,

    /// Bind address (default "0.0.0.0"; the skill server calls in from outside).
    #[serde(default = "default_gateway_bind")]
    pub bind: String,
}

fn default_gateway_port() -> u16 {
    5000
}

fn default_gateway_bind() -> String {
    "0.0.0.0".to_string()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_gateway_port(),
            bind: default_gateway_bind(),
        }
    }
}

/// LLM provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    /// API key. Overridden by OPENAI_API_KEY env.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions API, without the `/chat/completions` suffix.
    /// Overridden by OPENAI_BASE_URL env.
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Per-request budget in milliseconds. Must be below PLATFORM_TIMEOUT_MS.
    #[serde(default = "default_llm_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Persona instruction sent as the system message. `None` uses the built-in persona;
    /// an empty string sends no system message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

fn default_llm_timeout_ms() -> u64 {
    4500
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            timeout_ms: default_llm_timeout_ms(),
            max_tokens: None,
            system_prompt: None,
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Reply shaping: simpleText is cut off by the platform at roughly 1000 characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyConfig {
    #[serde(default = "default_max_reply_chars")]
    pub max_chars: usize,
}

fn default_max_reply_chars() -> usize {
    900
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            max_chars: default_max_reply_chars(),
        }
    }
}

/// Danger-keyword patterns (regex fragments, matched case-insensitively).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SafetyConfig {
    /// Replaces the built-in pattern list when non-empty.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<String>,

    /// Appended to whichever list is active.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_patterns: Vec<String>,
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|s| {
        let t = s.trim();
        if t.is_empty() {
            None
        } else {
            Some(t.to_string())
        }
    })
}

/// Resolve the LLM API key: env OPENAI_API_KEY overrides config.
pub fn resolve_api_key(config: &Config) -> Option<String> {
    non_empty_env("OPENAI_API_KEY").or_else(|| {
        config
            .llm
            .api_key
            .as_ref()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// Resolve the LLM base URL: env OPENAI_BASE_URL overrides config.
pub fn resolve_base_url(config: &Config) -> String {
    non_empty_env("OPENAI_BASE_URL")
        .unwrap_or_else(|| config.llm.base_url.clone())
        .trim_end_matches('/')
        .to_string()
}

/// Resolve the listen port: env PORT overrides config. An unparsable PORT is an error.
pub fn resolve_port(config: &Config) -> Result<u16> {
    match non_empty_env("PORT") {
        Some(p) => p
            .parse()
            .with_context(|| format!("PORT is not a valid port number: {}", p)),
        None => Ok(config.gateway.port),
    }
}

/// Checks that cannot be expressed with serde defaults.
pub fn validate(config: &Config) -> Result<()> {
    if config.llm.timeout_ms == 0 || config.llm.timeout_ms >= PLATFORM_TIMEOUT_MS {
        anyhow::bail!(
            "llm.timeoutMs must be between 1 and {} (got {})",
            PLATFORM_TIMEOUT_MS - 1,
            config.llm.timeout_ms
        );
    }
    if config.reply.max_chars == 0 {
        anyhow::bail!("reply.maxChars must be greater than 0");
    }
    Ok(())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("CHATBUDDY_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".chatbuddy").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path (or the default). Missing file => default config.
/// Returns the config and the path that was used.
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}
