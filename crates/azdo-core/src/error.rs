//! Error types for azdo-bridge.

use thiserror::Error;

/// Main error type for bridge operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Caller input rejected before any remote call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP request failed (connection, DNS, TLS)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Remote service answered with a non-2xx status
    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    /// Response body could not be decoded
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A looked-up relation, attachment or wiki does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Build an API error from a status code and the remote message.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a remote rejection, if this is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result type alias for bridge operations.
pub type Result<T> = std::result::Result<T, Error>;
