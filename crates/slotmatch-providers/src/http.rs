//! Shared HTTP plumbing for the Graph gateways.

use std::time::Duration;

use reqwest::StatusCode;

use crate::error::ProviderError;

/// Default request timeout. Calendar event writes can be slow upstream, so
/// this is longer than the usual client default.
pub(crate) const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .expect("failed to create HTTP client")
}

/// Classifies a non-success status into a [`ProviderError`] carrying the
/// given message.
pub(crate) fn error_for_status(status: StatusCode, message: String) -> ProviderError {
    match status {
        StatusCode::UNAUTHORIZED => ProviderError::authentication(message),
        StatusCode::FORBIDDEN => ProviderError::authorization(message),
        StatusCode::NOT_FOUND => ProviderError::not_found(message),
        StatusCode::BAD_REQUEST => ProviderError::bad_request(message),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::rate_limited(message),
        _ => ProviderError::server(message),
    }
}

/// Converts a non-success response into a [`ProviderError`], consuming the
/// body for the message.
pub(crate) async fn error_from_response(response: reqwest::Response) -> ProviderError {
    let status = response.status();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok());
        return ProviderError::rate_limited(format!(
            "rate limit exceeded{}",
            retry_after
                .map(|s| format!(", retry after {} seconds", s))
                .unwrap_or_default()
        ));
    }

    let body = response.text().await.unwrap_or_default();
    error_for_status(status, format!("API error ({}): {}", status, body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;

    fn code_for(status: StatusCode) -> ProviderErrorCode {
        error_for_status(status, "boom".to_string()).code()
    }

    #[test]
    fn status_classification() {
        assert_eq!(
            code_for(StatusCode::UNAUTHORIZED),
            ProviderErrorCode::AuthenticationFailed
        );
        assert_eq!(
            code_for(StatusCode::FORBIDDEN),
            ProviderErrorCode::AuthorizationFailed
        );
        assert_eq!(code_for(StatusCode::NOT_FOUND), ProviderErrorCode::NotFound);
        assert_eq!(
            code_for(StatusCode::BAD_REQUEST),
            ProviderErrorCode::BadRequest
        );
        assert_eq!(
            code_for(StatusCode::TOO_MANY_REQUESTS),
            ProviderErrorCode::RateLimited
        );
        assert_eq!(
            code_for(StatusCode::BAD_GATEWAY),
            ProviderErrorCode::ServerError
        );
        assert_eq!(
            code_for(StatusCode::IM_A_TEAPOT),
            ProviderErrorCode::ServerError
        );
    }

    #[test]
    fn classified_errors_keep_the_message() {
        let err = error_for_status(StatusCode::FORBIDDEN, "missing scope".to_string());
        assert_eq!(err.message(), "missing scope");
    }
}
