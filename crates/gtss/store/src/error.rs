use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Store-layer errors.
///
/// Every variant is a distinct kind the caller can branch on; the store never
/// folds one into another.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A write would break name uniqueness.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("record not found: {0}")]
    NotFound(String),

    /// Malformed input that slipped past the request boundary.
    #[error("validation gap: {0}")]
    ValidationGap(String),

    /// Backend I/O or constraint fault. The transaction has been rolled back.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl StoreError {
    pub fn not_found(name: &str) -> Self {
        Self::NotFound(format!("entity `{name}` not found"))
    }

    pub fn duplicate(name: &str) -> Self {
        Self::Conflict(format!("entity `{name}` already exists"))
    }
}

/// Backend errors are storage failures. Name clashes are recognised at the
/// insert and rename call sites, where the offending name is known.
#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::StorageFailure(err.to_string())
    }
}
