use diesel::r2d2::PoolError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Result type returned by repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Failures surfaced by the product store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The targeted record does not exist.
    #[error("record not found")]
    NotFound,
    /// A store-level constraint (unique name, non-negative values) rejected the write.
    #[error("constraint violation: {0}")]
    ConstraintViolation(String),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
}

impl From<DieselError> for RepositoryError {
    fn from(value: DieselError) -> Self {
        match value {
            DieselError::NotFound => RepositoryError::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation
                | DatabaseErrorKind::CheckViolation
                | DatabaseErrorKind::NotNullViolation,
                info,
            ) => RepositoryError::ConstraintViolation(info.message().to_string()),
            other => RepositoryError::Database(other),
        }
    }
}
