//! Reschedule flow: tear down booked events and reopen the request.

use slotmatch_providers::{
    CalendarGateway, RETRY_ATTEMPTS, RETRY_BASE_DELAY, with_transient_retry,
};
use slotmatch_store::{CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, RequestStore, with_conflict_retry};
use tracing::info;

use crate::error::ServiceResult;

/// Result of a reschedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RescheduleOutcome {
    /// No events were ever booked; the request form can simply be reopened.
    NothingBooked,
    /// Events were deleted and the request reopened.
    Cleared { deleted_events: usize },
}

/// Deletes every booked event and returns the request to its unconfirmed
/// state. Event deletion treats an already-missing event as deleted, so the
/// flow can be retried after a partial failure.
pub(crate) async fn reschedule(
    store: &dyn RequestStore,
    calendar: &dyn CalendarGateway,
    token: &str,
) -> ServiceResult<RescheduleOutcome> {
    let stored = store.read(token).await?;
    if stored.document.event_ids.is_empty() {
        info!(token, "reschedule requested with nothing booked");
        return Ok(RescheduleOutcome::NothingBooked);
    }

    let mut deleted_events = 0usize;
    for (owner, event_id) in &stored.document.event_ids {
        with_transient_retry(RETRY_ATTEMPTS, RETRY_BASE_DELAY, || {
            calendar.delete_event(owner, event_id)
        })
        .await?;
        deleted_events += 1;
    }

    with_conflict_retry(CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, || async {
        let fresh = store.read(token).await?;
        let mut document = fresh.document;
        document.confirmed = false;
        document.event_ids.clear();
        store.replace_if_match(&fresh.etag, document).await?;
        Ok(())
    })
    .await?;

    info!(token, deleted_events, "cleared booking for reschedule");
    Ok(RescheduleOutcome::Cleared { deleted_events })
}
