//! Error types for StyleSync

use thiserror::Error;

/// The main error type for StyleSync operations
#[derive(Debug, Error)]
pub enum StyleSyncError {
    #[error("Item not found: {0}")]
    ItemNotFound(String),

    #[error("Outfit not found: {0}")]
    OutfitNotFound(String),

    #[error("Duplicate id: {0}")]
    DuplicateId(String),

    #[error("Item {id} is a {got}, expected a {expected}")]
    InvalidItemKind {
        id: String,
        expected: String,
        got: String,
    },

    #[error("No person selected; add a person profile to the wardrobe first")]
    NoPersonSelected,

    #[error("No API key configured for provider '{0}'")]
    MissingCredential(String),

    #[error("Outfit {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: String,
        to: String,
    },

    #[error("Invalid generation parameters: {0}")]
    InvalidParams(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Library error: {0}")]
    LibraryError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    #[error("Generation error: {0}")]
    GenerationError(String),

    #[error("Studio worker stopped")]
    WorkerStopped,
}

/// Result type alias for StyleSync operations
pub type Result<T> = std::result::Result<T, StyleSyncError>;

impl From<toml::de::Error> for StyleSyncError {
    fn from(err: toml::de::Error) -> Self {
        StyleSyncError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for StyleSyncError {
    fn from(err: toml::ser::Error) -> Self {
        StyleSyncError::TomlSerError(err.to_string())
    }
}

impl From<serde_json::Error> for StyleSyncError {
    fn from(err: serde_json::Error) -> Self {
        StyleSyncError::JsonError(err.to_string())
    }
}
