use thiserror::Error;

use crate::model::{ResourceType, entity::FieldError};

pub type DatabaseResult<T> = std::result::Result<T, DatabaseError>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("json error: {0}")]
    SerdeError(#[from] serde_json::Error),
    #[error("{resource_type:?} `{id}` already exists")]
    Conflict {
        resource_type: ResourceType,
        id: String,
    },
    #[error("{resource_type:?} `{id}` not found")]
    NotFound {
        resource_type: ResourceType,
        id: String,
    },
    #[error("invalid input: {0}")]
    InvalidField(#[from] FieldError),
}

impl DatabaseError {
    pub fn conflict(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::Conflict {
            resource_type,
            id: id.into(),
        }
    }

    pub fn not_found(resource_type: ResourceType, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type,
            id: id.into(),
        }
    }
}
