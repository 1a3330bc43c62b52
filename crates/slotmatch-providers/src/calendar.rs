//! Calendar gateway trait and its request/response types.
//!
//! The service never talks HTTP directly; it goes through
//! [`CalendarGateway`] so tests can substitute scripted fakes and so the
//! Graph client stays swappable.

use chrono::NaiveDateTime;

use crate::BoxFuture;
use crate::error::ProviderResult;

/// A free/busy query over a set of participants.
///
/// `start` and `end` are wall-clock times interpreted in `time_zone`; the
/// returned bitmaps cover that range in 30-minute cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeBusyQuery {
    pub participants: Vec<String>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: String,
}

/// One participant's slice of a free/busy response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParticipantSchedule {
    /// The participant the bitmap belongs to.
    pub participant: String,
    /// Availability bitmap, one character per 30-minute cell. `'0'` marks a
    /// free cell; any other digit is some flavor of busy.
    pub bitmap: String,
}

/// A calendar event to create on a participant's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRequest {
    pub subject: String,
    pub body_html: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub time_zone: String,
    /// When set, the event carries an online-meeting link.
    pub online_meeting: bool,
}

/// A created event as reported by the upstream calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEvent {
    pub id: String,
    pub join_url: Option<String>,
}

/// Read/write access to participants' calendars.
pub trait CalendarGateway: Send + Sync {
    /// Fetches availability bitmaps for every participant in `query`.
    ///
    /// Participants the upstream cannot resolve may be missing from the
    /// result; callers decide whether that is fatal.
    fn free_busy<'a>(
        &'a self,
        query: &'a FreeBusyQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<ParticipantSchedule>>>;

    /// Creates `event` on `owner`'s calendar and returns its id.
    fn create_event<'a>(
        &'a self,
        owner: &'a str,
        event: &'a EventRequest,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>>;

    /// Deletes an event from `owner`'s calendar.
    ///
    /// Deleting an event that no longer exists succeeds; the desired state
    /// is already in place.
    fn delete_event<'a>(
        &'a self,
        owner: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>>;
}
