//! Gateways to the outside world: identity tokens, calendar free/busy and
//! event writes, and outbound mail, all against Microsoft Graph.
//!
//! Each gateway is a trait taking `&self` and returning boxed futures, so
//! the service layer can hold them as trait objects and tests can swap in
//! scripted fakes.

use std::future::Future;
use std::pin::Pin;

pub mod auth;
pub mod calendar;
pub mod error;
mod http;
pub mod mail;
pub mod retry;

pub mod graph;

/// A boxed future for async trait methods, keeping the traits object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub use auth::{ClientCredentials, ClientCredentialsTokenSource, TokenSource};
pub use calendar::{
    CalendarGateway, CreatedEvent, EventRequest, FreeBusyQuery, ParticipantSchedule,
};
pub use error::{ProviderError, ProviderErrorCode, ProviderResult};
pub use graph::GraphCalendarClient;
pub use mail::{GraphMailClient, MailGateway, MailMessage};
pub use retry::{RETRY_ATTEMPTS, RETRY_BASE_DELAY, with_transient_retry};
