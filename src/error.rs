//! Error types for lyrics-rnn-rs.

use crate::validation::ValidationError;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Candle tensor/model error.
    #[error("candle: {0}")]
    Candle(#[from] candle_core::Error),

    /// Malformed corpus input (e.g. a delimited row missing its text column).
    #[error("catalog: {0}")]
    Catalog(String),

    /// The corpus produced no n-gram training pairs.
    #[error("corpus yields no training pairs: {0}")]
    EmptyCorpus(String),

    /// Model weight or metadata loading error.
    #[error("weight loading: {0}")]
    WeightLoad(String),

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),

    /// A generation request failed validation.
    #[error("validation: {0}")]
    Validation(#[from] ValidationError),

    /// I/O error.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// True for per-request failures that should be reported to the caller
    /// as a bad request rather than an internal fault.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}
