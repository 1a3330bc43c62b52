//! Service-level error taxonomy.
//!
//! Everything the orchestration layer can fail with, collapsed into a small
//! set of kinds a caller can map onto a response policy: validation failures
//! are never retried, conflicts are transient, the rest wrap their upstream
//! source.

use slotmatch_core::candidate::CandidateParseError;
use slotmatch_core::timeconv::TimeError;
use slotmatch_providers::{ProviderError, ProviderErrorCode};
use slotmatch_store::StoreError;
use thiserror::Error;

/// An error from a scheduling operation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request itself is malformed; retrying without changes cannot
    /// succeed.
    #[error("invalid request: {message}")]
    Validation { message: String },

    /// No scheduling request exists under the token.
    #[error("scheduling request not found: {token}")]
    NotFound { token: String },

    /// The identity service rejected us, even after retries.
    #[error("authentication with the identity service failed")]
    Auth(#[source] ProviderError),

    /// The calendar or mail upstream failed, even after retries.
    #[error("upstream calendar request failed")]
    Calendar(#[source] ProviderError),

    /// A store write kept conflicting after the bounded retries.
    #[error("storage conflict persisted after retries")]
    Conflict(#[source] StoreError),

    /// The store failed for a reason other than conflict or absence.
    #[error("storage backend failure")]
    Store(#[source] StoreError),
}

impl ServiceError {
    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { token } => Self::NotFound { token },
            err @ StoreError::Conflict { .. } => Self::Conflict(err),
            other => Self::Store(other),
        }
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        match err.code() {
            ProviderErrorCode::AuthenticationFailed | ProviderErrorCode::AuthorizationFailed => {
                Self::Auth(err)
            }
            ProviderErrorCode::ConfigurationError => Self::Validation {
                message: err.to_string(),
            },
            _ => Self::Calendar(err),
        }
    }
}

impl From<TimeError> for ServiceError {
    fn from(err: TimeError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

impl From<CandidateParseError> for ServiceError {
    fn from(err: CandidateParseError) -> Self {
        Self::Validation {
            message: err.to_string(),
        }
    }
}

/// A specialized Result type for scheduling operations.
pub type ServiceResult<T> = Result<T, ServiceError>;
