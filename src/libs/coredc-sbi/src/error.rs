//! SBI Error Types
//!
//! Transport errors for the HTTP server and the upstream client

use thiserror::Error;

/// SBI Error type
#[derive(Error, Debug)]
pub enum SbiError {
    /// Upstream could not be reached (refused, unresolvable, reset on connect)
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Deadline elapsed before the exchange completed
    #[error("Request timeout")]
    Timeout,

    /// Invalid URI
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Invalid method
    #[error("Invalid HTTP method: {0}")]
    InvalidMethod(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Hyper error
    #[error("Hyper error: {0}")]
    HyperError(String),

    /// Invalid response
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl SbiError {
    /// Check if the upstream was never reached
    pub fn is_connect_failure(&self) -> bool {
        matches!(self, Self::ConnectionError(_))
    }

    /// Check if this is a deadline expiry
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}

impl From<hyper::Error> for SbiError {
    fn from(e: hyper::Error) -> Self {
        Self::HyperError(e.to_string())
    }
}

/// Result type for SBI operations
pub type SbiResult<T> = Result<T, SbiError>;
