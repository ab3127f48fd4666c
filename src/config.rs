use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use anyhow::{Result, anyhow};

use crate::language::Language;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub gemini_api_key: Option<String>,
    /// Stored as the display name so the file stays hand-editable;
    /// parsed back with `Language::from_str` on startup.
    pub default_language: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            gemini_api_key: None,
            default_language: None,
        }
    }

    pub fn load() -> Result<Self> {
        let config_path = Self::get_config_path()?;

        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(&config_path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::get_config_path()?;

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(&config_path, config_content)?;
        Ok(())
    }

    pub fn save_api_key(key: &str) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.gemini_api_key = Some(key.to_string());
        config.save()
    }

    pub fn save_default_language(language: Language) -> Result<()> {
        let mut config = Self::load().unwrap_or_else(|_| Self::new());
        config.default_language = Some(language.as_str().to_string());
        config.save()
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("triadhub").join("config.json"))
    }
}
