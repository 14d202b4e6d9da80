//! Danger-keyword filter: detects self-harm and suicidal phrasing in an utterance.
//!
//! A match short-circuits the LLM and the user gets the fixed crisis-resource reply.
//! The pattern list is a heuristic; it is data (config), not logic, and will have misses.

use crate::config::SafetyConfig;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// Built-in fragments. Korean phrasing first, then common English phrasing.
pub const DEFAULT_DANGER_PATTERNS: &[&str] = &[
    r"죽고\s*싶",
    r"죽어\s*버리",
    r"자살",
    r"자해",
    r"극단\s*적\s*(인\s*)?선택",
    r"살기\s*싫",
    r"살고\s*싶지\s*않",
    r"사라지고\s*싶",
    r"없어지고\s*싶",
    r"목숨\s*을?\s*끊",
    r"손목\s*을?\s*긋",
    r"뛰어\s*내리",
    r"세상\s*을?\s*떠나고\s*싶",
    r"suicid",
    r"kill\s+myself",
    r"end\s+my\s+life",
    r"want\s+to\s+die",
    r"self[\s-]?harm",
];

/// Compiled case-insensitive alternation of all active fragments.
#[derive(Debug, Clone)]
pub struct DangerFilter {
    pattern: Option<Regex>,
}

impl DangerFilter {
    /// Filter that never matches.
    pub fn disabled() -> Self {
        Self { pattern: None }
    }

    /// Compile the given fragments. Each fragment is checked on its own first so that an
    /// error names the offending pattern instead of the joined alternation.
    pub fn from_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let fragments: Vec<&str> = patterns
            .iter()
            .map(|p| p.as_ref().trim())
            .filter(|p| !p.is_empty())
            .collect();
        if fragments.is_empty() {
            return Ok(Self::disabled());
        }
        for f in &fragments {
            Regex::new(f).with_context(|| format!("invalid danger pattern: {}", f))?;
        }
        let joined = fragments
            .iter()
            .map(|f| format!("(?:{})", f))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = RegexBuilder::new(&joined)
            .case_insensitive(true)
            .build()
            .context("compiling danger patterns")?;
        Ok(Self {
            pattern: Some(pattern),
        })
    }

    /// Built-in list, replaced by `patterns` when non-empty, then extended by `extra_patterns`.
    pub fn from_config(config: &SafetyConfig) -> Result<Self> {
        let mut list: Vec<String> = if config.patterns.is_empty() {
            DEFAULT_DANGER_PATTERNS.iter().map(|s| s.to_string()).collect()
        } else {
            config.patterns.clone()
        };
        list.extend(config.extra_patterns.iter().cloned());
        Self::from_patterns(&list)
    }

    pub fn is_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    pub fn is_dangerous(&self, text: &str) -> bool {
        self.pattern.as_ref().is_some_and(|p| p.is_match(text))
    }
}

impl Default for DangerFilter {
    fn default() -> Self {
        Self::from_config(&SafetyConfig::default()).unwrap_or_else(|e| {
            log::error!("built-in danger patterns failed to compile: {:#}", e);
            Self::disabled()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_patterns_compile() {
        assert!(DangerFilter::from_config(&SafetyConfig::default())
            .unwrap()
            .is_enabled());
    }

    #[test]
    fn matches_korean_phrasing() {
        let f = DangerFilter::default();
        for text in [
            "요즘 너무 힘들어서 죽고 싶어",
            "죽고싶다",
            "자살하는 방법",
            "자해를 했어요",
            "극단적인 선택을 할까",
            "그냥 사라지고 싶어요",
            "더 이상 살기 싫어",
        ] {
            assert!(f.is_dangerous(text), "expected match: {}", text);
        }
    }

    #[test]
    fn matches_english_case_insensitively() {
        let f = DangerFilter::default();
        assert!(f.is_dangerous("I want to KILL MYSELF"));
        assert!(f.is_dangerous("thinking about Suicide"));
        assert!(f.is_dangerous("self-harm again"));
    }

    #[test]
    fn ordinary_messages_pass() {
        let f = DangerFilter::default();
        for text in ["오늘 날씨 좋다", "회사에서 스트레스 받았어", "hello world", "배고파 죽겠다"] {
            assert!(!f.is_dangerous(text), "unexpected match: {}", text);
        }
    }

    #[test]
    fn replace_and_extend() {
        let f = DangerFilter::from_config(&SafetyConfig {
            patterns: vec!["banana".to_string()],
            extra_patterns: vec![r"cherry\s+pie".to_string()],
        })
        .unwrap();
        assert!(f.is_dangerous("BANANA"));
        assert!(f.is_dangerous("cherry   pie"));
        assert!(!f.is_dangerous("죽고 싶어"));
    }

    #[test]
    fn invalid_pattern_is_named() {
        let err = DangerFilter::from_patterns(&["ok", "(unclosed"]).unwrap_err();
        assert!(format!("{:#}", err).contains("(unclosed"));
    }

    #[test]
    fn empty_list_disables() {
        let f = DangerFilter::from_patterns::<&str>(&[]).unwrap();
        assert!(!f.is_enabled());
        assert!(!f.is_dangerous("죽고 싶어"));
        let f = DangerFilter::from_patterns(&["  "]).unwrap();
        assert!(!f.is_enabled());
    }
}
