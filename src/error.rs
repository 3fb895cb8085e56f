//! Error types for deck store operations.

use thiserror::Error;

/// Errors raised by the deck store, the import parsers and storage.
///
/// Operations that reference a missing deck or card do not error; they
/// report the miss through their return value and leave state untouched.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A required field was empty or a name collided. Nothing was mutated.
    #[error("{0}")]
    Validation(String),

    /// An import file had the wrong shape. No decks were added.
    #[error("{0}")]
    Format(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl StoreError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
