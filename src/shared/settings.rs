use serde::{Deserialize, Serialize};
use tokio::fs;
use std::path::{Path, PathBuf};
use directories::ProjectDirs;

use super::error::{AppError, AppResult};

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_PROVIDER_URL: &str = "https://api.cerebras.ai/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "llama-3.3-70b";
pub const DEFAULT_DEBOUNCE_MS: u64 = 600;

const API_KEY_VAR: &str = "CEREBRAS_API_KEY";

pub fn project_dirs() -> AppResult<ProjectDirs> {
    ProjectDirs::from("com", "antigravity", "polycode")
        .ok_or_else(|| AppError::Config("Failed to determine project directories".to_string()))
}

/// Backend configuration, read from the environment at startup
#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub port: u16,
    pub provider_url: String,
    pub model: String,
    pub api_key: String,
}

impl ServerSettings {
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable lookup; the API key is mandatory
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Config(format!("{} is not set", API_KEY_VAR)))?;

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .map_err(|e| AppError::Config(format!("Invalid PORT '{}': {}", raw, e)))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            port,
            provider_url: lookup("POLYCODE_PROVIDER_URL")
                .unwrap_or_else(|| DEFAULT_PROVIDER_URL.to_string()),
            model: lookup("POLYCODE_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key,
        })
    }
}

/// Client-side preferences, persisted as JSON in the config directory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientSettings {
    pub backend_url: String,
    pub debounce_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            backend_url: format!("http://localhost:{}", DEFAULT_PORT),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl ClientSettings {
    pub fn get_settings_path() -> AppResult<PathBuf> {
        Ok(project_dirs()?.config_dir().join("settings.json"))
    }

    /// Load settings, writing defaults on first run; `POLYCODE_BACKEND_URL` wins over the file
    pub async fn load() -> AppResult<Self> {
        let mut settings = Self::load_from(&Self::get_settings_path()?).await?;
        if let Ok(url) = std::env::var("POLYCODE_BACKEND_URL") {
            if !url.trim().is_empty() {
                settings.backend_url = url;
            }
        }
        Ok(settings)
    }

    pub async fn load_from(path: &Path) -> AppResult<Self> {
        if !fs::try_exists(path).await.unwrap_or(false) {
            let settings = Self::default();
            settings.save_to(path).await?;
            return Ok(settings);
        }

        let content = fs::read_to_string(path)
            .await
            .map_err(|e| AppError::Io(format!("Failed to read settings file: {}", e)))?;

        serde_json::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse settings: {}", e)))
    }

    pub async fn save_to(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Io(format!("Failed to create config directory: {}", e)))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to serialize settings: {}", e)))?;

        fs::write(path, content)
            .await
            .map_err(|e| AppError::Io(format!("Failed to write settings file: {}", e)))
    }
}
