//! Provider registry
//!
//! Maps provider names to concrete implementations.

pub mod gemini;
pub mod mock;

use crate::config::StyleSyncConfig;
use crate::provider::ImageGenerator;
use stylesync_core::{Result, StyleSyncError};

/// Create a provider by name with configuration
pub fn create_provider(name: &str, config: &StyleSyncConfig) -> Result<Box<dyn ImageGenerator>> {
    if !config.is_enabled(name) {
        return Err(StyleSyncError::ConfigError(format!(
            "Provider '{}' is disabled in config",
            name
        )));
    }

    match name {
        "mock" => Ok(Box::new(mock::MockProvider::new())),
        "gemini" => Ok(Box::new(gemini::GeminiProvider::from_config(config))),
        _ => Err(StyleSyncError::GenerationError(format!(
            "Unknown provider '{}'. Available: {}",
            name,
            available_providers().join(", ")
        ))),
    }
}

/// List all available provider names
pub fn available_providers() -> Vec<&'static str> {
    vec!["mock", "gemini"]
}
