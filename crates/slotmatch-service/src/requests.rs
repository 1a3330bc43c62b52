//! Scheduling-request lifecycle: creation and retrieval.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use slotmatch_core::{CandidateSlot, timeconv};
use slotmatch_providers::CalendarGateway;
use slotmatch_store::{RequestStore, ScheduleDocument};
use std::collections::BTreeMap;
use tracing::{info, warn};
use uuid::Uuid;

use crate::availability::{self, AvailabilityQuery};
use crate::error::{ServiceError, ServiceResult};

/// Everything needed to open a new scheduling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSpec {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Daily window start, `"HH:MM"` on the 30-minute grid.
    pub start_time: String,
    /// Daily window end, `"HH:MM"`.
    pub end_time: String,
    /// Weekday labels the requester selected; stored for the frontend.
    pub selected_days: Vec<String>,
    pub duration_minutes: u32,
    pub participants: Vec<String>,
    pub time_zone: String,
    /// Candidates computed for the initial form, if any.
    #[serde(default)]
    pub candidates: Vec<CandidateSlot>,
}

/// Stores a new request and returns its opaque token.
pub(crate) async fn create_request(
    store: &dyn RequestStore,
    spec: RequestSpec,
) -> ServiceResult<String> {
    validate(&spec)?;
    let token = Uuid::new_v4().to_string();
    let document = ScheduleDocument {
        token: token.clone(),
        start_date: spec.start_date,
        end_date: spec.end_date,
        start_time: spec.start_time,
        end_time: spec.end_time,
        selected_days: spec.selected_days,
        duration_minutes: spec.duration_minutes,
        participants: spec.participants,
        time_zone: spec.time_zone,
        confirmed: false,
        candidates: spec.candidates,
        event_ids: BTreeMap::new(),
    };
    store.create(document).await?;
    info!(%token, "stored scheduling request");
    Ok(token)
}

/// Reads a request back. While it is unconfirmed, the candidate list is
/// recomputed from live calendars; if that fails the stored candidates are
/// returned as-is, since a stale form beats no form.
pub(crate) async fn fetch_request(
    store: &dyn RequestStore,
    calendar: &dyn CalendarGateway,
    token: &str,
) -> ServiceResult<ScheduleDocument> {
    let mut document = store.read(token).await?.document;
    if !document.confirmed {
        match availability::compute_candidates(calendar, &query_for(&document)).await {
            Ok(candidates) => document.candidates = candidates,
            Err(err) => {
                warn!(token, error = %err, "candidate refresh failed, returning stored candidates");
            }
        }
    }
    Ok(document)
}

fn query_for(document: &ScheduleDocument) -> AvailabilityQuery {
    AvailabilityQuery {
        participants: document.participants.clone(),
        start_date: document.start_date,
        end_date: document.end_date,
        start_time: document.start_time.clone(),
        end_time: document.end_time.clone(),
        duration_minutes: document.duration_minutes,
        time_zone: document.time_zone.clone(),
    }
}

fn validate(spec: &RequestSpec) -> ServiceResult<()> {
    if spec.participants.is_empty() {
        return Err(ServiceError::validation("participant list is empty"));
    }
    if spec.end_date < spec.start_date {
        return Err(ServiceError::validation(format!(
            "end date {} precedes start date {}",
            spec.end_date, spec.start_date
        )));
    }
    if spec.duration_minutes == 0 {
        return Err(ServiceError::validation("duration must be positive"));
    }
    timeconv::time_of_day_to_grid_index(&spec.start_time)?;
    timeconv::time_of_day_to_float_hour(&spec.end_time)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{FakeCalendar, sample_document};
    use slotmatch_store::MemoryStore;

    fn spec() -> RequestSpec {
        RequestSpec {
            start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
            start_time: "09:00".to_string(),
            end_time: "12:00".to_string(),
            selected_days: vec!["Fri".to_string()],
            duration_minutes: 60,
            participants: vec!["a@example.com".to_string()],
            time_zone: "Tokyo Standard Time".to_string(),
            candidates: Vec::new(),
        }
    }

    #[tokio::test]
    async fn create_stores_an_unconfirmed_document() {
        let store = MemoryStore::new();
        let token = create_request(&store, spec()).await.unwrap();

        let stored = store.read(&token).await.unwrap().document;
        assert_eq!(stored.token, token);
        assert!(!stored.confirmed);
        assert!(stored.event_ids.is_empty());
        assert_eq!(stored.participants, vec!["a@example.com".to_string()]);
    }

    #[tokio::test]
    async fn create_rejects_invalid_specs() {
        let store = MemoryStore::new();

        let mut no_participants = spec();
        no_participants.participants.clear();
        assert!(matches!(
            create_request(&store, no_participants).await,
            Err(ServiceError::Validation { .. })
        ));

        let mut inverted = spec();
        inverted.end_date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert!(matches!(
            create_request(&store, inverted).await,
            Err(ServiceError::Validation { .. })
        ));

        let mut zero_duration = spec();
        zero_duration.duration_minutes = 0;
        assert!(matches!(
            create_request(&store, zero_duration).await,
            Err(ServiceError::Validation { .. })
        ));

        let mut misaligned = spec();
        misaligned.start_time = "09:15".to_string();
        assert!(matches!(
            create_request(&store, misaligned).await,
            Err(ServiceError::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn fetch_refreshes_candidates_while_unconfirmed() {
        let store = MemoryStore::new();
        store
            .create(sample_document("tok", &["a@example.com"]))
            .await
            .unwrap();
        // Free 10:00-12:00 within the 09:00-12:00 window.
        let calendar = FakeCalendar::with_bitmaps(&[("a@example.com", "220000")]);

        let document = fetch_request(&store, &calendar, "tok").await.unwrap();
        let rendered: Vec<String> = document.candidates.iter().map(|c| c.to_string()).collect();
        assert_eq!(
            rendered,
            vec![
                "2025-01-10T10:00:00, 2025-01-10T11:00:00",
                "2025-01-10T10:30:00, 2025-01-10T11:30:00",
                "2025-01-10T11:00:00, 2025-01-10T12:00:00",
            ]
        );
    }

    #[tokio::test]
    async fn fetch_returns_stored_candidates_when_refresh_fails() {
        let store = MemoryStore::new();
        let mut document = sample_document("tok", &["a@example.com"]);
        let stale: CandidateSlot = "2025-01-10T09:00:00, 2025-01-10T10:00:00".parse().unwrap();
        document.candidates = vec![stale];
        store.create(document).await.unwrap();

        let calendar = FakeCalendar::failing();
        let fetched = fetch_request(&store, &calendar, "tok").await.unwrap();
        assert_eq!(fetched.candidates, vec![stale]);
    }

    #[tokio::test]
    async fn fetch_skips_refresh_once_confirmed() {
        let store = MemoryStore::new();
        let mut document = sample_document("tok", &["a@example.com"]);
        document.confirmed = true;
        store.create(document).await.unwrap();

        // Would fail loudly if consulted.
        let calendar = FakeCalendar::failing();
        let fetched = fetch_request(&store, &calendar, "tok").await.unwrap();
        assert!(fetched.confirmed);
        assert!(fetched.candidates.is_empty());
    }

    #[tokio::test]
    async fn fetch_unknown_token_is_not_found() {
        let store = MemoryStore::new();
        let calendar = FakeCalendar::default();
        assert!(matches!(
            fetch_request(&store, &calendar, "missing").await,
            Err(ServiceError::NotFound { .. })
        ));
    }
}
