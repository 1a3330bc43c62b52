//! Client-credentials token acquisition.
//!
//! The gateways authenticate with application permissions: a confidential
//! client exchanges its secret for a bearer token scoped to the Graph API.
//! Tokens are cached until shortly before expiry.

use std::time::{Duration, Instant};

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::debug;

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};
use crate::http;
use crate::retry::{RETRY_ATTEMPTS, RETRY_BASE_DELAY, with_transient_retry};

const DEFAULT_AUTHORITY: &str = "https://login.microsoftonline.com";
const TOKEN_SCOPE: &str = "https://graph.microsoft.com/.default";

/// Refresh this long before the reported expiry.
const EXPIRY_SKEW: Duration = Duration::from_secs(300);

/// Supplies bearer tokens for gateway requests.
pub trait TokenSource: Send + Sync {
    /// Returns a token valid for at least the next few minutes.
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>>;
}

/// Credentials for a confidential client application.
#[derive(Debug, Clone)]
pub struct ClientCredentials {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl ClientCredentials {
    fn validate(&self) -> ProviderResult<()> {
        for (name, value) in [
            ("tenant_id", &self.tenant_id),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
        ] {
            if value.trim().is_empty() {
                return Err(ProviderError::configuration(format!("{} is empty", name)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

#[derive(Debug)]
struct CachedToken {
    value: String,
    refresh_after: Instant,
}

/// [`TokenSource`] backed by the OAuth2 client-credentials grant.
#[derive(Debug)]
pub struct ClientCredentialsTokenSource {
    http_client: reqwest::Client,
    credentials: ClientCredentials,
    authority: String,
    cache: Mutex<Option<CachedToken>>,
}

impl ClientCredentialsTokenSource {
    /// Creates a token source for the given credentials.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when any credential field is empty.
    pub fn new(credentials: ClientCredentials) -> ProviderResult<Self> {
        credentials.validate()?;
        Ok(Self {
            http_client: http::build_client(http::DEFAULT_TIMEOUT),
            credentials,
            authority: DEFAULT_AUTHORITY.to_string(),
            cache: Mutex::new(None),
        })
    }

    /// Overrides the token authority base URL.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = authority.into();
        self
    }

    async fn fetch_token(&self) -> ProviderResult<CachedToken> {
        let url = format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority, self.credentials.tenant_id
        );
        let response = self
            .http_client
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("scope", TOKEN_SCOPE),
                ("client_id", &self.credentials.client_id),
                ("client_secret", &self.credentials.client_secret),
            ])
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("token request failed: {}", e)).with_source(e)
            })?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response)
                .await
                .with_gateway("identity"));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::network(format!("failed to read token response: {}", e)))?;
        let token: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse token response: {}", e))
        })?;
        if token.access_token.is_empty() {
            return Err(ProviderError::invalid_response(
                "token response carried an empty access_token",
            ));
        }

        let lifetime = Duration::from_secs(token.expires_in);
        let refresh_after = Instant::now() + lifetime.saturating_sub(EXPIRY_SKEW);
        debug!(expires_in = token.expires_in, "acquired access token");
        Ok(CachedToken {
            value: token.access_token,
            refresh_after,
        })
    }
}

impl TokenSource for ClientCredentialsTokenSource {
    fn access_token(&self) -> BoxFuture<'_, ProviderResult<String>> {
        Box::pin(async move {
            let mut cache = self.cache.lock().await;
            if let Some(cached) = cache.as_ref() {
                if Instant::now() < cached.refresh_after {
                    return Ok(cached.value.clone());
                }
            }
            let token =
                with_transient_retry(RETRY_ATTEMPTS, RETRY_BASE_DELAY, || self.fetch_token())
                    .await?;
            let value = token.value.clone();
            *cache = Some(token);
            Ok(value)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ClientCredentials {
        ClientCredentials {
            tenant_id: "tenant".to_string(),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
        }
    }

    #[test]
    fn empty_credentials_are_rejected() {
        let mut creds = credentials();
        creds.client_secret = "  ".to_string();
        let err = ClientCredentialsTokenSource::new(creds).unwrap_err();
        assert_eq!(
            err.code(),
            crate::error::ProviderErrorCode::ConfigurationError
        );
    }

    #[test]
    fn valid_credentials_are_accepted() {
        assert!(ClientCredentialsTokenSource::new(credentials()).is_ok());
    }

    #[test]
    fn token_response_parses() {
        let body = r#"{"token_type":"Bearer","expires_in":3599,"access_token":"eyJ0eXAi"}"#;
        let token: TokenResponse = serde_json::from_str(body).unwrap();
        assert_eq!(token.access_token, "eyJ0eXAi");
        assert_eq!(token.expires_in, 3599);
    }
}
