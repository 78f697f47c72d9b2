//! Error types for the core library

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or malformed input, rejected before anything is persisted
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A mutation targeted an id that matched no row
    #[error("Task not found: {0}")]
    NotFound(String),

    /// The backing store failed; carries driver detail for logging only
    #[error("Storage error: {0}")]
    Storage(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}
