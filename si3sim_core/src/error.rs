//! Error types for the si3sim_core library.

use std::io;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for si3sim_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed timestamp, clock time, decimal, recurrence or weekday
    #[error("Parse error: {0}")]
    Parse(String),

    /// Schedule failed its pre-flight checks
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Internal invariant violated; indicates a bug rather than bad input
    #[error("Logic error: {0}")]
    Logic(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Tool settings error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    pub(crate) fn parse(msg: impl Into<String>) -> Self {
        Error::Parse(msg.into())
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// True for anything raised while reading text input, including
    /// malformed JSON documents.
    pub fn is_parse(&self) -> bool {
        matches!(self, Error::Parse(_) | Error::Json(_) | Error::Toml(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
