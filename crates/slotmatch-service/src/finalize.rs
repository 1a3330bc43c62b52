//! Slot finalization: purge the chosen window from every competing request,
//! then confirm the selecting one.
//!
//! Purge runs first and its failure aborts the confirm step; a confirmed
//! request whose window still circulates elsewhere invites double bookings.
//! Two bookings racing for the same window in different requests remain
//! possible between the calendar write and the purge; there is no claim
//! record, the second event creation simply wins a slot the calendar no
//! longer shows as free.

use slotmatch_core::CandidateSlot;
use slotmatch_store::{CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, RequestStore, with_conflict_retry};
use tracing::info;

use crate::error::ServiceResult;

/// Retracts `candidate` from all other requests and confirms `token`.
pub(crate) async fn finalize(
    store: &dyn RequestStore,
    token: &str,
    candidate: &CandidateSlot,
) -> ServiceResult<()> {
    purge_from_others(store, token, candidate).await?;
    confirm(store, token).await
}

/// Removes `candidate` from every other request still offering it,
/// confirmed or not; a confirmed request that reopens must not resurface a
/// window that was booked away in the meantime. Each document gets its own
/// conflict-retried read-modify-write.
async fn purge_from_others(
    store: &dyn RequestStore,
    token: &str,
    candidate: &CandidateSlot,
) -> ServiceResult<()> {
    let holders = store.find_holding_candidate(candidate, token).await?;
    let mut purged = 0usize;
    for holder in &holders {
        let holder_token = holder.document.token.as_str();
        with_conflict_retry(CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, || async {
            let fresh = store.read(holder_token).await?;
            let mut document = fresh.document;
            if document.remove_candidate(candidate) == 0 {
                // Another finalization already took it out.
                return Ok(());
            }
            store.replace_if_match(&fresh.etag, document).await?;
            Ok(())
        })
        .await?;
        purged += 1;
    }
    info!(token, purged, "retracted window from competing requests");
    Ok(())
}

/// Marks the selecting request as confirmed.
async fn confirm(store: &dyn RequestStore, token: &str) -> ServiceResult<()> {
    with_conflict_retry(CONFLICT_ATTEMPTS, CONFLICT_BASE_DELAY, || async {
        let fresh = store.read(token).await?;
        let mut document = fresh.document;
        document.confirmed = true;
        store.replace_if_match(&fresh.etag, document).await?;
        Ok(())
    })
    .await?;
    info!(token, "scheduling request confirmed");
    Ok(())
}
