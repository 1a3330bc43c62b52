//! Availability pipeline: free/busy fetch, bitmap decoding, window
//! intersection, and conversion to wire-form candidates.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slotmatch_core::{
    CandidateSlot, GridSlot, ParticipantAvailability, decode_free_slots, find_common_windows,
    find_quorum_windows, timeconv,
};
use slotmatch_providers::{
    CalendarGateway, FreeBusyQuery, ParticipantSchedule, RETRY_ATTEMPTS, RETRY_BASE_DELAY,
    with_transient_retry,
};
use tracing::{debug, warn};

use crate::error::ServiceResult;

/// Parameters of an availability query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityQuery {
    /// Participants whose calendars are consulted.
    pub participants: Vec<String>,
    /// First day of the scheduling window; also the base date grid indices
    /// count from.
    pub start_date: NaiveDate,
    /// Last day of the scheduling window.
    pub end_date: NaiveDate,
    /// Daily window start, `"HH:MM"` on the 30-minute grid.
    pub start_time: String,
    /// Daily window end, `"HH:MM"`.
    pub end_time: String,
    /// Requested meeting length in minutes.
    pub duration_minutes: u32,
    /// Named timezone the window times are expressed in.
    pub time_zone: String,
}

/// A bookable window together with the quorum that can attend it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumCandidate {
    pub candidate: CandidateSlot,
    pub participants: Vec<String>,
}

/// Finds every candidate where all participants are free.
pub(crate) async fn compute_candidates(
    calendar: &dyn CalendarGateway,
    query: &AvailabilityQuery,
) -> ServiceResult<Vec<CandidateSlot>> {
    let Some(fetched) = fetch_schedules(calendar, query).await? else {
        return Ok(Vec::new());
    };

    let anchor = anchor_slot(query)?;
    let free_sets: Vec<BTreeSet<GridSlot>> = fetched
        .iter()
        .map(|s| decode_free_slots(&s.bitmap, anchor))
        .collect();

    let windows = find_common_windows(&free_sets, query.duration_minutes);
    debug!(
        participants = query.participants.len(),
        windows = windows.len(),
        "computed common availability"
    );
    windows
        .iter()
        .map(|w| CandidateSlot::from_window(query.start_date, w).map_err(Into::into))
        .collect()
}

/// Finds every candidate where at least `required_count` participants are
/// free, attaching who can attend.
pub(crate) async fn compute_quorum_candidates(
    calendar: &dyn CalendarGateway,
    query: &AvailabilityQuery,
    required_count: usize,
) -> ServiceResult<Vec<QuorumCandidate>> {
    let Some(fetched) = fetch_schedules(calendar, query).await? else {
        return Ok(Vec::new());
    };

    let anchor = anchor_slot(query)?;
    let availability: Vec<ParticipantAvailability> = fetched
        .iter()
        .map(|s| ParticipantAvailability::decode(s.participant.clone(), &s.bitmap, anchor))
        .collect();

    let windows = find_quorum_windows(&availability, query.duration_minutes, required_count);
    debug!(
        participants = query.participants.len(),
        required_count,
        windows = windows.len(),
        "computed quorum availability"
    );
    windows
        .into_iter()
        .map(|w| {
            Ok(QuorumCandidate {
                candidate: CandidateSlot::from_window(query.start_date, &w.window)?,
                participants: w.participants,
            })
        })
        .collect()
}

/// Fetches bitmaps for every participant. `None` means the result cannot
/// be trusted (no participants, or some calendars were unresolvable) and
/// the caller should report no availability.
async fn fetch_schedules(
    calendar: &dyn CalendarGateway,
    query: &AvailabilityQuery,
) -> ServiceResult<Option<Vec<ParticipantSchedule>>> {
    if query.participants.is_empty() {
        return Ok(None);
    }

    let start_hour = timeconv::time_of_day_to_float_hour(&query.start_time)?;
    let end_hour = timeconv::time_of_day_to_float_hour(&query.end_time)?;
    let fb_query = FreeBusyQuery {
        participants: query.participants.clone(),
        start: timeconv::float_hour_to_datetime(query.start_date, start_hour)?,
        end: timeconv::float_hour_to_datetime(query.end_date, end_hour)?,
        time_zone: query.time_zone.clone(),
    };

    let schedules = with_transient_retry(RETRY_ATTEMPTS, RETRY_BASE_DELAY, || {
        calendar.free_busy(&fb_query)
    })
    .await?;

    if schedules.len() < query.participants.len() {
        // A missing bitmap means that participant's freedom is unknown; a
        // window cannot be promised on their behalf.
        warn!(
            requested = query.participants.len(),
            returned = schedules.len(),
            "free/busy response missing participants, reporting no availability"
        );
        return Ok(None);
    }
    Ok(Some(schedules))
}

fn anchor_slot(query: &AvailabilityQuery) -> ServiceResult<GridSlot> {
    Ok(GridSlot::new(timeconv::time_of_day_to_grid_index(
        &query.start_time,
    )?))
}
