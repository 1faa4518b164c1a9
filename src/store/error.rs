use thiserror::Error;

use crate::model::{ResourceType, entity::FieldError};

pub type StoreResult<T> = std::result::Result<T, StoreError>;
pub type PersistenceResult<T> = std::result::Result<T, PersistenceError>;
pub type CacheResult<T> = std::result::Result<T, CacheError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation error: {0}")]
    Validation(#[from] FieldError),
    #[error("{resource_type:?} `{id}` not found")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },
    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("server unavailable: {0}")]
    ServerUnavailable(PersistenceError),
    #[error("local cache error: {0}")]
    Cache(#[from] CacheError),
}

impl StoreError {
    pub fn not_found(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }
}

/// Failure talking to the remote API.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("http error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("unexpected status {status}: {message}")]
    UnexpectedStatus { status: u16, message: String },
}

/// Failure reading or writing the local cache file.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("invalid cached course: {0}")]
    InvalidData(#[from] FieldError),
}
