//! Service configuration.
//!
//! Credentials for the confidential client, the system mail sender, and the
//! public URLs linked from confirmation mails. Loaded from the environment
//! in deployments; built directly in tests.

use slotmatch_providers::ClientCredentials;
use url::Url;

use crate::error::{ServiceError, ServiceResult};

/// Configuration for the scheduling service.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Directory tenant of the confidential client.
    pub tenant_id: String,
    /// Application id of the confidential client.
    pub client_id: String,
    /// Client secret of the confidential client.
    pub client_secret: String,
    /// Mailbox the confirmation mails are sent from.
    pub sender_email: String,
    /// Public base URL of the scheduling frontend.
    pub front_url: Url,
    /// Public base URL of this service, used for reschedule links.
    pub backend_url: Url,
}

impl ServiceConfig {
    /// Loads the configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns a validation error when a variable is missing, empty, or (for
    /// the URLs) unparseable.
    pub fn from_env() -> ServiceResult<Self> {
        Ok(Self {
            tenant_id: require_env("TENANT_ID")?,
            client_id: require_env("CLIENT_ID")?,
            client_secret: require_env("CLIENT_SECRET")?,
            sender_email: require_env("SYSTEM_SENDER_EMAIL")?,
            front_url: require_url("FRONT_URL")?,
            backend_url: require_url("BACKEND_URL")?,
        })
    }

    /// Returns the client credentials for token acquisition.
    pub fn credentials(&self) -> ClientCredentials {
        ClientCredentials {
            tenant_id: self.tenant_id.clone(),
            client_id: self.client_id.clone(),
            client_secret: self.client_secret.clone(),
        }
    }

    /// Frontend link for reopening a scheduling request.
    pub fn appointment_url(&self, token: &str) -> String {
        format!(
            "{}appointment?token={}",
            ensure_trailing_slash(&self.front_url),
            token
        )
    }

    /// Backend link that cancels the booked events for a request.
    pub fn reschedule_url(&self, token: &str) -> String {
        format!(
            "{}reschedule?token={}",
            ensure_trailing_slash(&self.backend_url),
            token
        )
    }
}

fn ensure_trailing_slash(url: &Url) -> String {
    let raw = url.as_str();
    if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{}/", raw)
    }
}

fn require_env(name: &str) -> ServiceResult<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ServiceError::validation(format!(
            "environment variable {} is not set",
            name
        ))),
    }
}

fn require_url(name: &str) -> ServiceResult<Url> {
    let raw = require_env(name)?;
    Url::parse(&raw)
        .map_err(|e| ServiceError::validation(format!("{} is not a valid URL: {}", name, e)))
}
