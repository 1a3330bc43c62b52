//! Scheduling orchestration.
//!
//! [`SchedulingService`] ties the pieces together: the availability
//! pipeline, the request lifecycle, booking with slot finalization, and
//! reschedule. All external collaborators are injected trait objects, so
//! the whole service runs against in-memory fakes in tests and against the
//! Graph-backed gateways in deployments.

use std::sync::Arc;

use slotmatch_core::CandidateSlot;
use slotmatch_providers::{
    CalendarGateway, ClientCredentialsTokenSource, GraphCalendarClient, GraphMailClient,
    MailGateway, TokenSource,
};
use slotmatch_store::{RequestStore, ScheduleDocument};

pub mod availability;
pub mod booking;
pub mod config;
pub mod error;
pub mod finalize;
pub mod requests;
pub mod reschedule;

#[cfg(test)]
mod testutil;

pub use availability::{AvailabilityQuery, QuorumCandidate};
pub use booking::{BookingOutcome, BookingRequest};
pub use config::ServiceConfig;
pub use error::{ServiceError, ServiceResult};
pub use requests::RequestSpec;
pub use reschedule::RescheduleOutcome;

/// The scheduling service.
pub struct SchedulingService {
    store: Arc<dyn RequestStore>,
    calendar: Arc<dyn CalendarGateway>,
    mail: Arc<dyn MailGateway>,
    config: ServiceConfig,
}

impl SchedulingService {
    /// Creates a service over explicit gateways.
    pub fn new(
        store: Arc<dyn RequestStore>,
        calendar: Arc<dyn CalendarGateway>,
        mail: Arc<dyn MailGateway>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            calendar,
            mail,
            config,
        }
    }

    /// Wires the Graph-backed gateways from the configuration.
    pub fn from_config(store: Arc<dyn RequestStore>, config: ServiceConfig) -> ServiceResult<Self> {
        let tokens: Arc<dyn TokenSource> =
            Arc::new(ClientCredentialsTokenSource::new(config.credentials())?);
        let calendar = Arc::new(GraphCalendarClient::new(Arc::clone(&tokens)));
        let mail = Arc::new(GraphMailClient::new(tokens, config.sender_email.clone()));
        Ok(Self::new(store, calendar, mail, config))
    }

    /// Candidate windows where every participant is free.
    pub async fn availability(
        &self,
        query: &AvailabilityQuery,
    ) -> ServiceResult<Vec<CandidateSlot>> {
        availability::compute_candidates(self.calendar.as_ref(), query).await
    }

    /// Candidate windows where at least `required_count` participants are
    /// free, with the attendees attached.
    pub async fn quorum_availability(
        &self,
        query: &AvailabilityQuery,
        required_count: usize,
    ) -> ServiceResult<Vec<QuorumCandidate>> {
        availability::compute_quorum_candidates(self.calendar.as_ref(), query, required_count)
            .await
    }

    /// Opens a new scheduling request and returns its token.
    pub async fn create_request(&self, spec: RequestSpec) -> ServiceResult<String> {
        requests::create_request(self.store.as_ref(), spec).await
    }

    /// Retrieves a scheduling request, refreshing its candidates from live
    /// calendars while it is unconfirmed.
    pub async fn fetch_request(&self, token: &str) -> ServiceResult<ScheduleDocument> {
        requests::fetch_request(self.store.as_ref(), self.calendar.as_ref(), token).await
    }

    /// Books a chosen candidate: creates the events, records their ids,
    /// finalizes the slot, and dispatches confirmation mail in the
    /// background.
    pub async fn book(&self, request: &BookingRequest) -> ServiceResult<BookingOutcome> {
        booking::book(
            self.store.as_ref(),
            self.calendar.as_ref(),
            &self.mail,
            &self.config,
            request,
        )
        .await
    }

    /// Cancels a booked request's events and reopens it.
    pub async fn reschedule(&self, token: &str) -> ServiceResult<RescheduleOutcome> {
        reschedule::reschedule(self.store.as_ref(), self.calendar.as_ref(), token).await
    }
}
