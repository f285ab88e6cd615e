use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables checked for the provider credential, in order
pub const API_KEY_ENV_VARS: [&str; 2] = ["API_KEY", "GEMINI_API_KEY"];

/// Main configuration structure
///
/// Loaded from the config file, then env vars and CLI flags layered on top.
/// Priority: CLI > Env > File > Defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub advisory: AdvisoryConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
    #[serde(default)]
    pub ui: UiConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Load config from default location, defaults if it doesn't exist
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::from_toml(&contents)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to parse config: {}", e)))
    }

    /// Save config to disk
    pub fn save(&self) -> crate::Result<PathBuf> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&config_path, self.to_toml()?)?;
        Ok(config_path)
    }

    pub fn to_toml(&self) -> crate::Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| crate::Error::ConfigError(format!("Failed to serialize config: {}", e)))
    }

    /// Copy safe to print: the API key is masked
    pub fn redacted(&self) -> Self {
        let mut config = self.clone();
        if let Some(key) = config.advisory.api_key.as_mut() {
            *key = "********".to_string();
        }
        config
    }

    /// XDG config dir on Linux, Application Support on macOS, AppData on Windows
    pub fn config_path() -> crate::Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find config directory".into()))?
            .join("fleettrack");

        Ok(config_dir.join("config.toml"))
    }

    /// Where the TUI writes its log file
    pub fn log_path() -> crate::Result<PathBuf> {
        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| crate::Error::ConfigError("Could not find data directory".into()))?
            .join("fleettrack");

        Ok(data_dir.join("fleettrack.log"))
    }

    /// Provider credential: environment first, then the config file
    pub fn resolve_api_key(&self) -> Option<String> {
        Self::api_key_from(|name| std::env::var(name).ok()).or_else(|| {
            self.advisory
                .api_key
                .clone()
                .filter(|key| !key.trim().is_empty())
        })
    }

    fn api_key_from<F>(lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| lookup(name))
            .find(|value| !value.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryConfig {
    /// Gemini API key. `API_KEY` / `GEMINI_API_KEY` take precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Base URL of the generative language API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Language the analysis is written in
    #[serde(default = "default_response_language")]
    pub response_language: String,
}

fn default_model() -> String {
    fleettrack_api::DEFAULT_MODEL.to_string()
}

fn default_api_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_response_language() -> String {
    "English".to_string()
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            api_url: default_api_url(),
            response_language: default_response_language(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FleetConfig {
    /// JSON fleet file to seed from instead of the built-in fleet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    /// Deadlines this many days out (or fewer) are flagged as due soon
    #[serde(default = "default_due_soon_days")]
    pub due_soon_days: i64,

    /// Enable mouse support in TUI
    #[serde(default = "default_mouse")]
    pub mouse_enabled: bool,
}

fn default_due_soon_days() -> i64 {
    crate::due::DEFAULT_DUE_SOON_DAYS
}

fn default_mouse() -> bool {
    true
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            due_soon_days: default_due_soon_days(),
            mouse_enabled: default_mouse(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExportConfig {
    /// Directory the TUI writes exports into (current directory when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,
}

impl ExportConfig {
    pub fn csv_path(&self) -> PathBuf {
        let file = crate::export::EXPORT_FILE_NAME;
        match &self.directory {
            Some(dir) => dir.join(file),
            None => PathBuf::from(file),
        }
    }
}
