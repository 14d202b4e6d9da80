//! Initialize the configuration directory: create `~/.chatbuddy` and a default `config.json`.
//!
//! The written file spells out every default (persona and danger patterns included) so operators
//! can edit them in place. The API key is never written; it comes from OPENAI_API_KEY.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::agent::DEFAULT_SYSTEM_PROMPT;
use crate::config::Config;
use crate::safety::DEFAULT_DANGER_PATTERNS;

/// Default config with the built-in persona and pattern list filled in.
pub fn default_config_document() -> Config {
    let mut config = Config::default();
    config.llm.system_prompt = Some(DEFAULT_SYSTEM_PROMPT.to_string());
    config.safety.patterns = DEFAULT_DANGER_PATTERNS.iter().map(|s| s.to_string()).collect();
    config
}

/// Create the config directory and write the default config if it does not exist.
/// Returns the config directory. An existing config file is left untouched.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        let doc = serde_json::to_string_pretty(&default_config_document())
            .context("serializing default config")?;
        std::fs::write(config_path, doc)
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    } else {
        log::debug!("config already exists at {}, skipping", config_path.display());
    }

    Ok(config_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("chatbuddy-init-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn writes_loadable_default_config() {
        let dir = temp_dir();
        let path = dir.join("nested").join("config.json");
        let out = init_config_dir(&path).unwrap();
        assert_eq!(out, dir.join("nested"));
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.gateway.port, 5000);
        assert_eq!(config.llm.system_prompt.as_deref(), Some(DEFAULT_SYSTEM_PROMPT));
        assert_eq!(config.safety.patterns.len(), DEFAULT_DANGER_PATTERNS.len());
        assert!(config.llm.api_key.is_none());
        let _ = std::fs::remove_dir_all(dir);
    }

    #[test]
    fn keeps_existing_config() {
        let dir = temp_dir();
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"gateway":{"port":8080}}"#).unwrap();
        init_config_dir(&path).unwrap();
        let (config, _) = load_config(Some(path)).unwrap();
        assert_eq!(config.gateway.port, 8080);
        let _ = std::fs::remove_dir_all(dir);
    }
}
