use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{DocentError, Result};

/// Top-level configuration for the Docent application.
///
/// Loaded from `~/.docent/config.toml` by default. Each section corresponds
/// to a bounded context. The retrieval and chat sections carry the policy
/// knobs of answer quality vs. prompt size; the defaults documented on each
/// field are the tuned values, not derived quantities.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocentConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for DocentConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            retrieval: RetrievalConfig::default(),
            chat: ChatConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl DocentConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: DocentConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| DocentError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Data directory for the SQLite database.
    pub data_dir: String,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: "~/.docent/data".to_string(),
            log_level: "info".to_string(),
        }
    }
}

/// Retrieval and context-curation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Passages fetched from the retrieval interface per question.
    pub fetch_k: usize,
    /// Maximum labelled passages included in a prompt.
    pub max_passages: usize,
    /// Passages with less trimmed content than this are discarded.
    pub min_passage_chars: usize,
    /// Curated passages shorter than this after cleanup are skipped.
    pub min_curated_chars: usize,
    /// Discard a passage once the navigation marker occurs more than this
    /// many times.
    pub max_nav_markers: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            fetch_k: 10,
            max_passages: 5,
            min_passage_chars: 100,
            min_curated_chars: 50,
            max_nav_markers: 2,
        }
    }
}

/// Conversation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Prior turns included in a prompt; earlier turns are dropped entirely.
    pub history_turns: usize,
    /// Character cap when deriving a conversation title from the first
    /// user message.
    pub title_max_chars: usize,
    /// Default bound when listing a user's conversations.
    pub list_limit: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_turns: 3,
            title_max_chars: 50,
            list_limit: 20,
        }
    }
}

/// Generation backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible chat-completions API.
    pub base_url: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never lives in the config file.
    pub api_key_env: String,
    /// Sampling temperature; low by default for factual answers.
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            temperature: 0.1,
        }
    }
}
