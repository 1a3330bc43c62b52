//! Booking flow: calendar event creation, event-id persistence, slot
//! finalization, and confirmation mail.

use std::collections::BTreeMap;
use std::sync::Arc;

use slotmatch_core::CandidateSlot;
use slotmatch_providers::{
    CalendarGateway, EventRequest, MailGateway, MailMessage, RETRY_ATTEMPTS, RETRY_BASE_DELAY,
    with_transient_retry,
};
use slotmatch_store::{CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, RequestStore, with_conflict_retry};
use tracing::{info, warn};

use crate::config::ServiceConfig;
use crate::error::ServiceResult;

/// A booking submission against a stored scheduling request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingRequest {
    /// Token of the scheduling request being booked.
    pub token: String,
    /// Chosen candidate in wire form, or `None`/`"none"` when the requester
    /// declined every offered window.
    pub candidate: Option<String>,
    /// Participants whose calendars receive the event.
    pub participants: Vec<String>,
    pub last_name: String,
    pub first_name: String,
    pub company: String,
    pub email: String,
}

/// Result of a booking submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingOutcome {
    /// No window was chosen; nothing was booked.
    NoCandidate,
    /// The window was booked and the request confirmed.
    Booked {
        candidate: CandidateSlot,
        /// Created event id per participant.
        event_ids: BTreeMap<String, String>,
        /// Online-meeting link, when the calendar issued one.
        join_url: Option<String>,
    },
}

pub(crate) async fn book(
    store: &dyn RequestStore,
    calendar: &dyn CalendarGateway,
    mail: &Arc<dyn MailGateway>,
    config: &ServiceConfig,
    request: &BookingRequest,
) -> ServiceResult<BookingOutcome> {
    let Some(raw) = request
        .candidate
        .as_deref()
        .filter(|c| !c.eq_ignore_ascii_case("none"))
    else {
        info!(token = %request.token, "booking submitted without a candidate");
        return Ok(BookingOutcome::NoCandidate);
    };
    let candidate: CandidateSlot = raw.parse()?;

    let stored = store.read(&request.token).await?;
    let time_zone = stored.document.time_zone.clone();

    let event = EventRequest {
        subject: confirmation_subject(request),
        body_html: event_body(request, &candidate),
        start: candidate.start,
        end: candidate.end,
        time_zone,
        online_meeting: true,
    };

    // Sequential on purpose: the first exhausted failure aborts the
    // remainder. Events already created stay in place; reschedule reaps
    // them.
    let mut event_ids = BTreeMap::new();
    let mut join_url: Option<String> = None;
    for owner in &request.participants {
        let created = with_transient_retry(RETRY_ATTEMPTS, RETRY_BASE_DELAY, || {
            calendar.create_event(owner, &event)
        })
        .await?;
        if join_url.is_none() {
            join_url = created.join_url;
        }
        event_ids.insert(owner.clone(), created.id);
    }
    info!(token = %request.token, events = event_ids.len(), "created calendar events");

    persist_event_ids(store, &request.token, &event_ids).await?;
    crate::finalize::finalize(store, &request.token, &candidate).await?;
    dispatch_confirmation_mail(mail, config, request, &candidate, join_url.as_deref());

    Ok(BookingOutcome::Booked {
        candidate,
        event_ids,
        join_url,
    })
}

/// Records the created event ids on the scheduling request.
async fn persist_event_ids(
    store: &dyn RequestStore,
    token: &str,
    event_ids: &BTreeMap<String, String>,
) -> ServiceResult<()> {
    with_conflict_retry(CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, || async {
        let fresh = store.read(token).await?;
        let mut document = fresh.document;
        document.event_ids = event_ids.clone();
        store.replace_if_match(&fresh.etag, document).await?;
        Ok(())
    })
    .await?;
    Ok(())
}

/// Sends the confirmation mails on a background task. Delivery failures are
/// logged and never fail the booking.
fn dispatch_confirmation_mail(
    mail: &Arc<dyn MailGateway>,
    config: &ServiceConfig,
    request: &BookingRequest,
    candidate: &CandidateSlot,
    join_url: Option<&str>,
) {
    let messages = confirmation_mails(config, request, candidate, join_url);
    let mail = Arc::clone(mail);
    tokio::spawn(async move {
        for message in messages {
            if let Err(err) = mail.send(&message).await {
                warn!(to = %message.to, error = %err, "confirmation mail failed");
            }
        }
    });
}

/// One mail per participant plus one to the requester.
pub(crate) fn confirmation_mails(
    config: &ServiceConfig,
    request: &BookingRequest,
    candidate: &CandidateSlot,
    join_url: Option<&str>,
) -> Vec<MailMessage> {
    let subject = confirmation_subject(request);
    let mut mails: Vec<MailMessage> = request
        .participants
        .iter()
        .map(|to| MailMessage {
            to: to.clone(),
            subject: subject.clone(),
            body_html: participant_mail_body(request, candidate, join_url),
        })
        .collect();
    mails.push(MailMessage {
        to: request.email.clone(),
        subject: "Your meeting is confirmed".to_string(),
        body_html: requester_mail_body(config, request, candidate, join_url),
    });
    mails
}

fn confirmation_subject(request: &BookingRequest) -> String {
    format!(
        "[{} / {} {}] meeting confirmed",
        request.company, request.last_name, request.first_name
    )
}

fn details_html(request: &BookingRequest, candidate: &CandidateSlot) -> String {
    format!(
        "Name<br>{} {}<br><br>\
         Company<br>{}<br><br>\
         Email<br>{}<br><br>\
         Schedule<br>{}<br><br>",
        request.last_name,
        request.first_name,
        request.company,
        request.email,
        candidate.confirmation_label(),
    )
}

fn join_html(join_url: Option<&str>) -> String {
    join_url
        .map(|url| format!("Meeting link<br><a href=\"{url}\">{url}</a><br><br>"))
        .unwrap_or_default()
}

fn event_body(request: &BookingRequest, candidate: &CandidateSlot) -> String {
    format!(
        "The meeting below has been scheduled.<br><br>{}",
        details_html(request, candidate)
    )
}

fn participant_mail_body(
    request: &BookingRequest,
    candidate: &CandidateSlot,
    join_url: Option<&str>,
) -> String {
    format!(
        "A meeting has been confirmed.<br><br>{}{}",
        details_html(request, candidate),
        join_html(join_url),
    )
}

fn requester_mail_body(
    config: &ServiceConfig,
    request: &BookingRequest,
    candidate: &CandidateSlot,
    join_url: Option<&str>,
) -> String {
    format!(
        "{} {},<br><br>Your meeting has been confirmed.<br><br>{}{}\
         To pick a different time, cancel here first:<br>\
         <a href=\"{}\">{}</a><br>",
        request.last_name,
        request.first_name,
        details_html(request, candidate),
        join_html(join_url),
        config.reschedule_url(&request.token),
        config.reschedule_url(&request.token),
    )
}
