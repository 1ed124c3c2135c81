//! Error types for byline.

use thiserror::Error;

/// Result type for byline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for byline operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Search index query failed (connectivity, bad status, malformed body).
    #[error("Index error: {0}")]
    Index(String),

    /// Training dataset loading/parsing error.
    #[error("Dataset error: {0}")]
    Dataset(String),

    /// Model artifact missing, incompatible, or otherwise unusable.
    #[error("Model error: {0}")]
    Model(String),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an index error.
    pub fn index(msg: impl Into<String>) -> Self {
        Error::Index(msg.into())
    }

    /// Create a dataset error.
    pub fn dataset(msg: impl Into<String>) -> Self {
        Error::Dataset(msg.into())
    }

    /// Create a model error.
    pub fn model(msg: impl Into<String>) -> Self {
        Error::Model(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Error::InvalidInput(msg.into())
    }
}
