//! Error types for upstream gateway operations.
//!
//! Everything the service asks of the outside world (token acquisition,
//! free/busy queries, event writes, mail delivery) reports failures through
//! [`ProviderError`] so retry logic and HTTP mapping stay uniform.

use std::fmt;
use thiserror::Error;

/// The category of a gateway error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorCode {
    /// Authentication failed or credentials are invalid/expired.
    AuthenticationFailed,
    /// Authorization failed - the application lacks permission.
    AuthorizationFailed,
    /// Network error - connection failed, timeout, DNS resolution, etc.
    NetworkError,
    /// Rate limit exceeded - too many requests.
    RateLimited,
    /// Server returned an error (5xx status codes).
    ServerError,
    /// Invalid response from the server - parse error, unexpected format.
    InvalidResponse,
    /// Resource not found (404).
    NotFound,
    /// Request was invalid (400) - bad parameters, malformed request.
    BadRequest,
    /// Configuration error - missing or invalid config.
    ConfigurationError,
}

impl ProviderErrorCode {
    /// Returns true if this error is transient and the operation may be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NetworkError | Self::RateLimited | Self::ServerError
        )
    }

    /// Returns a human-readable name for this error code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AuthenticationFailed => "authentication_failed",
            Self::AuthorizationFailed => "authorization_failed",
            Self::NetworkError => "network_error",
            Self::RateLimited => "rate_limited",
            Self::ServerError => "server_error",
            Self::InvalidResponse => "invalid_response",
            Self::NotFound => "not_found",
            Self::BadRequest => "bad_request",
            Self::ConfigurationError => "configuration_error",
        }
    }
}

impl fmt::Display for ProviderErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An error from an upstream gateway call.
#[derive(Debug, Error)]
pub struct ProviderError {
    /// The error code categorizing this error.
    code: ProviderErrorCode,
    /// A human-readable message describing the error.
    message: String,
    /// The gateway that produced this error (e.g., "calendar", "mail").
    gateway: Option<String>,
    /// The underlying cause of this error, if any.
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ProviderError {
    /// Creates a new gateway error with the given code and message.
    pub fn new(code: ProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            gateway: None,
            source: None,
        }
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthenticationFailed, message)
    }

    /// Creates an authorization error.
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::AuthorizationFailed, message)
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NetworkError, message)
    }

    /// Creates a rate limit error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::RateLimited, message)
    }

    /// Creates a server error.
    pub fn server(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ServerError, message)
    }

    /// Creates an invalid response error.
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::InvalidResponse, message)
    }

    /// Creates a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::NotFound, message)
    }

    /// Creates a bad request error.
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::BadRequest, message)
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::ConfigurationError, message)
    }

    /// Sets the gateway name for this error.
    pub fn with_gateway(mut self, gateway: impl Into<String>) -> Self {
        self.gateway = Some(gateway.into());
        self
    }

    /// Sets the source error for this error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    /// Returns the error code.
    pub fn code(&self) -> ProviderErrorCode {
        self.code
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the gateway name, if set.
    pub fn gateway(&self) -> Option<&str> {
        self.gateway.as_deref()
    }

    /// Returns true if this error is transient and may be retried.
    pub fn is_retryable(&self) -> bool {
        self.code.is_retryable()
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref gateway) = self.gateway {
            write!(f, "[{}] ", gateway)?;
        }
        write!(f, "{}: {}", self.code, self.message)
    }
}

/// A specialized Result type for gateway operations.
pub type ProviderResult<T> = Result<T, ProviderError>;
