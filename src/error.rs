//! Error taxonomy for the store.
//!
//! Logical absence is never an error: reads return `Option`, mutations that
//! find nothing to act on return `false`. Errors are reserved for backend
//! faults and for the handful of inputs the core refuses outright.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The persistence backend could not complete the operation.
    #[error("storage unavailable during {operation}: {source}")]
    StorageUnavailable {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Malformed key, empty locale code, bad delimiter and the like.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl StoreError {
    pub fn unavailable(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::StorageUnavailable {
            operation,
            source: source.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    /// True for backend faults, false for rejected input.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable { .. })
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        Self::unavailable("database query", err)
    }
}

/// Reject empty locale codes before they reach a backend.
pub(crate) fn require_locale(code: &str) -> Result<()> {
    if code.trim().is_empty() {
        return Err(StoreError::invalid("locale code must not be empty"));
    }
    Ok(())
}

/// Reject empty keys and keys with empty dot segments.
pub(crate) fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::invalid("translation key must not be empty"));
    }
    if key.split('.').any(str::is_empty) {
        return Err(StoreError::invalid(format!(
            "translation key '{}' contains an empty segment",
            key
        )));
    }
    Ok(())
}
