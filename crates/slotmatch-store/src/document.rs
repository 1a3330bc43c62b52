//! Persisted scheduling-request documents.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slotmatch_core::CandidateSlot;

/// A pending or confirmed scheduling request, as persisted in the request
/// store.
///
/// Created when a requester submits the scheduling form (candidates empty,
/// unconfirmed). While unconfirmed, the candidate list is refreshed lazily
/// on read; the finalization coordinator mutates it when a window it holds
/// is claimed elsewhere, or when the request itself is confirmed or
/// rescheduled. Documents expire through the store's retention TTL and are
/// never explicitly deleted here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDocument {
    /// Opaque token identifying the request (primary key).
    #[serde(rename = "id")]
    pub token: String,
    /// First date of the scheduling window.
    pub start_date: NaiveDate,
    /// Last date of the scheduling window.
    pub end_date: NaiveDate,
    /// Daily window start, `"HH:MM"`, aligned to the 30-minute grid.
    pub start_time: String,
    /// Daily window end, `"HH:MM"`.
    pub end_time: String,
    /// Weekdays the requester accepts (e.g. `"Monday"`).
    pub selected_days: Vec<String>,
    /// Requested meeting length in minutes.
    pub duration_minutes: u32,
    /// Participant email addresses whose calendars are matched.
    #[serde(rename = "users")]
    pub participants: Vec<String>,
    /// Named timezone forwarded to the calendar service.
    pub time_zone: String,
    /// Whether a candidate has been booked for this request.
    #[serde(rename = "isConfirmed", default)]
    pub confirmed: bool,
    /// Candidate windows still on offer.
    #[serde(default)]
    pub candidates: Vec<CandidateSlot>,
    /// Participant email -> external calendar event id, filled on booking.
    #[serde(default)]
    pub event_ids: BTreeMap<String, String>,
}

impl ScheduleDocument {
    /// Returns `true` if the candidate list contains `candidate`.
    ///
    /// [`CandidateSlot`] equality is on decoded timestamps, so formatting
    /// differences between writers do not matter.
    pub fn holds_candidate(&self, candidate: &CandidateSlot) -> bool {
        self.candidates.contains(candidate)
    }

    /// Removes every entry equal to `candidate`, returning how many were
    /// dropped.
    pub fn remove_candidate(&mut self, candidate: &CandidateSlot) -> usize {
        let before = self.candidates.len();
        self.candidates.retain(|held| held != candidate);
        before - self.candidates.len()
    }

    /// Returns `true` if booking created calendar events for this request.
    pub fn has_booked_events(&self) -> bool {
        !self.event_ids.is_empty()
    }
}
