//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `STYLESYNC_{PROVIDER}_API_KEY`, then `GEMINI_API_KEY`
//! 2. Project-local: `.stylesync/config.toml`
//! 3. Global: `~/.stylesync/config.toml`
//!
//! The API key is the one value written back: `save_api_key` stores it in
//! the global file so later sessions pick it up.

use crate::params::{GenerationParams, Resolution};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stylesync_core::{Result, StyleSyncError};

/// Project directory holding the library and local config
pub const PROJECT_DIR: &str = ".stylesync";

/// Provider-specific configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_url: Option<String>,
    /// Unset means enabled; only an explicit value overrides a lower layer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// Generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Model alias or id (`flash`, `pro`, or a full model id)
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub resolution: Option<Resolution>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            resolution: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "flash".to_string()
}
fn default_request_timeout_secs() -> u64 {
    120
}

/// Top-level config file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StyleSyncConfigFile {
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, Default)]
pub struct StyleSyncConfig {
    pub providers: HashMap<String, ProviderConfig>,
    pub generation: GenerationConfig,
}

impl StyleSyncConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = StyleSyncConfigFile::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        let local_path = Path::new(PROJECT_DIR).join("config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        Self::apply_env_overrides(&mut config);

        Ok(StyleSyncConfig {
            providers: config.providers,
            generation: config.generation,
        })
    }

    /// Load config from a specific file path only (for testing)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        Self::apply_env_overrides(&mut config);
        Ok(StyleSyncConfig {
            providers: config.providers,
            generation: config.generation,
        })
    }

    /// Get API key for a provider
    pub fn api_key(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_key.as_deref())
            .filter(|k| !k.trim().is_empty())
    }

    /// Get API URL for a provider (or its default)
    pub fn api_url(&self, provider_name: &str) -> Option<&str> {
        self.providers
            .get(provider_name)
            .and_then(|p| p.api_url.as_deref())
    }

    /// Check if a provider is enabled
    pub fn is_enabled(&self, provider_name: &str) -> bool {
        self.providers
            .get(provider_name)
            .and_then(|p| p.enabled)
            .unwrap_or(true)
    }

    pub fn default_provider(&self) -> &str {
        &self.generation.provider
    }

    /// Default generation params, validated
    pub fn default_params(&self) -> Result<GenerationParams> {
        GenerationParams::from_parts(&self.generation.model, self.generation.resolution)
    }

    /// Timeout applied to every outgoing HTTP request
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.request_timeout_secs.max(1))
    }

    /// Persist an API key in the global config file
    pub fn save_api_key(provider_name: &str, key: &str) -> Result<PathBuf> {
        let path = Self::global_config_path().ok_or_else(|| {
            StyleSyncError::ConfigError("could not determine home directory".to_string())
        })?;
        Self::save_api_key_to(&path, provider_name, key)?;
        Ok(path)
    }

    /// Persist an API key into a specific config file, keeping its other settings
    pub fn save_api_key_to(path: &Path, provider_name: &str, key: &str) -> Result<()> {
        let mut file = if path.exists() {
            Self::load_file(path)?
        } else {
            StyleSyncConfigFile::default()
        };

        file.providers
            .entry(provider_name.to_string())
            .or_default()
            .api_key = Some(key.trim().to_string());

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&file)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(PROJECT_DIR).join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<StyleSyncConfigFile> {
        let content = std::fs::read_to_string(path)?;
        let config: StyleSyncConfigFile = toml::from_str(&content).map_err(|e| {
            StyleSyncError::ConfigError(format!("Failed to parse config {}: {}", path.display(), e))
        })?;
        Ok(config)
    }

    fn merge_into(base: &mut StyleSyncConfigFile, overlay: StyleSyncConfigFile) {
        for (name, provider) in overlay.providers {
            let entry = base.providers.entry(name).or_default();
            if provider.api_key.is_some() {
                entry.api_key = provider.api_key;
            }
            if provider.api_url.is_some() {
                entry.api_url = provider.api_url;
            }
            if provider.enabled.is_some() {
                entry.enabled = provider.enabled;
            }
        }

        let defaults = GenerationConfig::default();
        if overlay.generation.provider != defaults.provider {
            base.generation.provider = overlay.generation.provider;
        }
        if overlay.generation.model != defaults.model {
            base.generation.model = overlay.generation.model;
        }
        if overlay.generation.resolution.is_some() {
            base.generation.resolution = overlay.generation.resolution;
        }
        if overlay.generation.request_timeout_secs != defaults.request_timeout_secs {
            base.generation.request_timeout_secs = overlay.generation.request_timeout_secs;
        }
    }

    fn apply_env_overrides(config: &mut StyleSyncConfigFile) {
        let provider_names = ["gemini"];
        for name in &provider_names {
            let env_key = format!("STYLESYNC_{}_API_KEY", name.to_uppercase());
            if let Ok(key) = std::env::var(&env_key) {
                let entry = config.providers.entry(name.to_string()).or_default();
                entry.api_key = Some(key);
            }
        }

        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            let entry = config.providers.entry("gemini".to_string()).or_default();
            if entry.api_key.is_none() {
                entry.api_key = Some(key);
            }
        }
    }
}
