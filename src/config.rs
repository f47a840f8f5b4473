use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    pub youtube_api_key: Option<String>,

    /// Keyword guaranteed to exist in the rotation; re-seeded on every tick.
    #[serde(default = "default_seed_keyword")]
    pub seed_keyword: String,

    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Pages fetched per due entity per tick. None follows continuation
    /// tokens until the API stops returning them.
    #[serde(default = "default_max_pages")]
    pub max_pages: Option<u32>,

    /// Delay between successive page requests, to stay inside API quota.
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    #[serde(default)]
    pub ai_enabled: bool,

    #[serde(default = "default_ai_base_url")]
    pub ai_base_url: String,

    pub ai_api_key: Option<String>,

    #[serde(default = "default_ai_model")]
    pub ai_model: String,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tubewatch");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("videos.db").to_string_lossy().to_string()
}

fn default_seed_keyword() -> String {
    "it".to_string()
}

fn default_page_size() -> u32 {
    25
}

fn default_max_pages() -> Option<u32> {
    Some(2)
}

fn default_page_delay_ms() -> u64 {
    1500
}

fn default_ai_base_url() -> String {
    "https://models.github.ai/inference".to_string()
}

fn default_ai_model() -> String {
    "openai/o4-mini".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            youtube_api_key: None,
            seed_keyword: default_seed_keyword(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            page_delay_ms: default_page_delay_ms(),
            ai_enabled: false,
            ai_base_url: default_ai_base_url(),
            ai_api_key: None,
            ai_model: default_ai_model(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tubewatch")
            .join("config.toml")
    }
}
