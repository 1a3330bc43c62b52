//! Request store error types.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from the request store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No document for the given token.
    #[error("no scheduling request for token {token:?}")]
    NotFound { token: String },

    /// Conditional replace failed: the document changed since it was read.
    #[error("scheduling request {token:?} changed since read")]
    Conflict { token: String },

    /// Document (de)serialization failed.
    #[error("request document serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Backend fault (connectivity, quota, ...).
    #[error("store backend error: {message}")]
    Backend { message: String },
}

impl StoreError {
    /// Creates a not-found error.
    pub fn not_found(token: impl Into<String>) -> Self {
        Self::NotFound {
            token: token.into(),
        }
    }

    /// Creates a conflict error.
    pub fn conflict(token: impl Into<String>) -> Self {
        Self::Conflict {
            token: token.into(),
        }
    }

    /// Creates a backend error.
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Returns `true` for optimistic-concurrency collisions, which callers
    /// resolve by re-reading and retrying the mutation.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_classification() {
        assert!(StoreError::conflict("tok").is_conflict());
        assert!(!StoreError::not_found("tok").is_conflict());
        assert!(!StoreError::backend("down").is_conflict());
    }

    #[test]
    fn display_includes_token() {
        let err = StoreError::not_found("tok-123");
        assert!(err.to_string().contains("tok-123"));
    }
}
