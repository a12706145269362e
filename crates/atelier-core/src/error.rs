//! Error types for Atelier

use thiserror::Error;

/// The main error type for Atelier operations
#[derive(Debug, Error)]
pub enum AtelierError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Expansion error: {0}")]
    ExpansionError(String),

    #[error("Service error ({capability}): {message}")]
    ServiceError { capability: String, message: String },

    #[error("Unknown capability: {0}")]
    UnknownCapability(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Journal error: {0}")]
    JournalError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(String),

    #[error("TOML serialization error: {0}")]
    TomlSerError(String),
}

/// Result type alias for Atelier operations
pub type Result<T> = std::result::Result<T, AtelierError>;

impl AtelierError {
    /// Build a service error for a named capability
    pub fn service(capability: impl Into<String>, message: impl Into<String>) -> Self {
        AtelierError::ServiceError {
            capability: capability.into(),
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for AtelierError {
    fn from(err: toml::de::Error) -> Self {
        AtelierError::TomlParseError(err.to_string())
    }
}

impl From<toml::ser::Error> for AtelierError {
    fn from(err: toml::ser::Error) -> Self {
        AtelierError::TomlSerError(err.to_string())
    }
}
