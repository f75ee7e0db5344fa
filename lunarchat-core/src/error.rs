//! Error types for lunarchat

use thiserror::Error;

/// The main error type for lunarchat operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A session id that does not exist in the store
    #[error("Session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// An action requested while the session state does not permit it
    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// A local image rejected before any network call
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// A mutating action attempted without an authenticated identity
    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for lunarchat operations
pub type Result<T> = std::result::Result<T, Error>;

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}
