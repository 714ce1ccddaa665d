use thiserror::Error;

/// Top-level error type for the Docent system.
///
/// Each variant wraps a subsystem-specific failure. Subsystem crates define
/// their own error types where the caller needs finer distinctions (the chat
/// crate in particular) and convert into this type at crate boundaries so
/// the `?` operator composes across the workspace.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DocentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for DocentError {
    fn from(err: toml::de::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for DocentError {
    fn from(err: toml::ser::Error) -> Self {
        DocentError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for DocentError {
    fn from(err: serde_json::Error) -> Self {
        DocentError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Docent operations.
pub type Result<T> = std::result::Result<T, DocentError>;
