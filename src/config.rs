//! Configuration management for curiobot.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub llm: LlmConfig,
    #[serde(default)]
    pub news: NewsConfig,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub api_base: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_max_tokens() -> u32 {
    // Plans are one-line JSON objects; this leaves generous headroom.
    512
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_news_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_freshness_days")]
    pub freshness_days: i64,
}

fn default_news_key_env() -> String {
    "NEWSAPI_KEY".to_string()
}

fn default_freshness_days() -> i64 {
    3
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_key_env: default_news_key_env(),
            freshness_days: default_freshness_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,
}

fn default_max_depth() -> u32 {
    1
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig {
                provider: "openai_compatible".to_string(),
                model: "gpt-4.1-mini".to_string(),
                api_base: Some("https://api.openai.com/v1".to_string()),
                api_key: None,
                api_key_env: default_api_key_env(),
                max_tokens: default_max_tokens(),
            },
            news: NewsConfig::default(),
            router: RouterConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".curiobot").join("config.toml"))
    }

    /// Load from an explicit path (errors if it does not exist) or from the
    /// default location (falls back to defaults if absent), then apply
    /// environment overrides.
    pub fn load_with(explicit_path: Option<&Path>) -> Result<Self> {
        let mut config = match explicit_path {
            Some(path) => {
                if !path.exists() {
                    anyhow::bail!("Config file not found: {}", path.display());
                }
                Self::load_from(path)?
            }
            None => Self::load_from(&Self::config_path()?)?,
        };

        if let Ok(provider) = std::env::var("CURIOBOT_PROVIDER") {
            config.llm.provider = provider;
        }
        if let Ok(model) = std::env::var("CURIOBOT_MODEL") {
            config.llm.model = model;
        }
        if let Ok(api_base) = std::env::var("CURIOBOT_API_BASE") {
            config.llm.api_base = Some(api_base);
        }
        if let Ok(bind) = std::env::var("CURIOBOT_BIND") {
            config.server.bind = bind;
        }

        Ok(config)
    }

    fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path).with_context(|| {
                format!("Failed to read config file: {}", config_path.display())
            })?;
            toml::from_str(&content).with_context(|| {
                format!("Failed to parse config file: {}", config_path.display())
            })
        } else {
            Ok(Self::default())
        }
    }

    /// The LLM key is required; resolution prefers the config file over the
    /// environment.
    pub fn api_key(&self) -> Result<String> {
        if let Some(key) = &self.llm.api_key {
            if !key.is_empty() {
                return Ok(key.clone());
            }
        }
        std::env::var(&self.llm.api_key_env).with_context(|| {
            format!(
                "API key not found. Either:\n  \
                 1. Set llm.api_key in config file: {}\n  \
                 2. Set environment variable: export {}=your-key",
                Self::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_default(),
                self.llm.api_key_env
            )
        })
    }

    /// The news key is optional; without one, news lookups fail softly with
    /// a coded envelope instead of stopping startup.
    pub fn news_api_key(&self) -> Option<String> {
        if let Some(key) = &self.news.api_key {
            if !key.is_empty() {
                return Some(key.clone());
            }
        }
        std::env::var(&self.news.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    pub fn save_default() -> Result<PathBuf> {
        let config_path = Self::config_path()?;
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let default = Self::default();
        let content = toml::to_string_pretty(&default).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
        Ok(config_path)
    }
}
