use thiserror::Error;

use crate::forms::errors::FieldErrors;
use crate::repository::RepositoryError;

pub mod products;

/// Result type returned by service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors surfaced to the presentation layer.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Submitted input violated one or more field rules; nothing was written.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),
    #[error("product not found")]
    NotFound,
    /// The store rejected a write that passed validation, e.g. a racing duplicate name.
    #[error("conflicting product data: {0}")]
    Conflict(String),
    #[error(transparent)]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::NotFound => ServiceError::NotFound,
            RepositoryError::ConstraintViolation(message) => ServiceError::Conflict(message),
            other => ServiceError::Repository(other),
        }
    }
}
