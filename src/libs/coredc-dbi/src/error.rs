//! Database Interface Error Types

use coredc_model::ValidationError;
use thiserror::Error;

/// Database interface error types
#[derive(Error, Debug)]
pub enum DbiError {
    #[error("MongoDB error: {0}")]
    MongoDb(#[from] mongodb::error::Error),
    #[error("BSON encode error: {0}")]
    BsonEncode(#[from] mongodb::bson::ser::Error),
    #[error("BSON decode error: {0}")]
    BsonDecode(#[from] mongodb::bson::de::Error),
    #[error("Subscriber with IMSI {0} already exists")]
    Conflict(String),
    #[error("Subscriber with IMSI {0} not found")]
    NotFound(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl DbiError {
    /// HTTP status code clients should see for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Conflict(_) => 409,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 422,
            _ => 500,
        }
    }
}

/// Result type for database operations
pub type DbiResult<T> = Result<T, DbiError>;
