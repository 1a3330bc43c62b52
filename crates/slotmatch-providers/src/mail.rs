//! Mail gateway trait and the Graph `sendMail` implementation.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::BoxFuture;
use crate::auth::TokenSource;
use crate::error::{ProviderError, ProviderResult};
use crate::http;

const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// An HTML mail to a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body_html: String,
}

/// Outbound mail delivery.
pub trait MailGateway: Send + Sync {
    /// Sends `message` from the configured system sender.
    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, ProviderResult<()>>;
}

/// [`MailGateway`] backed by the Graph `sendMail` endpoint.
pub struct GraphMailClient {
    http_client: reqwest::Client,
    token_source: Arc<dyn TokenSource>,
    sender: String,
    base_url: String,
}

impl GraphMailClient {
    /// Creates a mail client sending from `sender`.
    pub fn new(token_source: Arc<dyn TokenSource>, sender: impl Into<String>) -> Self {
        Self {
            http_client: http::build_client(Duration::from_secs(30)),
            token_source,
            sender: sender.into(),
            base_url: GRAPH_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn send_message(&self, message: &MailMessage) -> ProviderResult<()> {
        let url = format!(
            "{}/users/{}/sendMail",
            self.base_url,
            urlencoding::encode(&self.sender)
        );
        let body = SendMailRequest::from_message(message);

        let token = self.token_source.access_token().await?;
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("sendMail request failed: {}", e)).with_source(e)
            })?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response).await.with_gateway("mail"));
        }
        debug!(to = %message.to, "mail accepted for delivery");
        Ok(())
    }
}

impl MailGateway for GraphMailClient {
    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.send_message(message))
    }
}

/// Wraps the body so tenant signature injection lands after the content.
fn wrap_body(body_html: &str) -> String {
    format!(
        "<div style=\"font-family: Calibri, Arial, Helvetica, sans-serif;\">\
         <!--BeginSignature-->\n{}\n<!--EndSignature-->\n</div>",
        body_html
    )
}

#[derive(Debug, Serialize)]
struct SendMailRequest {
    message: OutboundMessage,
}

impl SendMailRequest {
    fn from_message(message: &MailMessage) -> Self {
        Self {
            message: OutboundMessage {
                subject: message.subject.clone(),
                body: MessageBody {
                    content_type: "HTML",
                    content: wrap_body(&message.body_html),
                },
                to_recipients: vec![Recipient {
                    email_address: EmailAddress {
                        address: message.to.clone(),
                    },
                }],
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutboundMessage {
    subject: String,
    body: MessageBody,
    to_recipients: Vec<Recipient>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageBody {
    content_type: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Recipient {
    email_address: EmailAddress,
}

#[derive(Debug, Serialize)]
struct EmailAddress {
    address: String,
}
