//! Scripted fakes standing in for the external gateways in tests.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

use chrono::NaiveDate;
use slotmatch_providers::{
    BoxFuture, CalendarGateway, CreatedEvent, EventRequest, FreeBusyQuery, MailGateway,
    MailMessage, ParticipantSchedule, ProviderError, ProviderResult,
};
use slotmatch_store::ScheduleDocument;

/// Calendar gateway returning canned bitmaps and recording writes.
#[derive(Default)]
pub(crate) struct FakeCalendar {
    bitmaps: Vec<ParticipantSchedule>,
    fail_free_busy: bool,
    fail_create_for: Option<String>,
    fail_delete_for: Option<String>,
    next_event: AtomicU32,
    pub(crate) created: Mutex<Vec<(String, EventRequest)>>,
    pub(crate) deleted: Mutex<Vec<(String, String)>>,
}

impl FakeCalendar {
    pub(crate) fn with_bitmaps(bitmaps: &[(&str, &str)]) -> Self {
        Self {
            bitmaps: bitmaps
                .iter()
                .map(|(participant, bitmap)| ParticipantSchedule {
                    participant: participant.to_string(),
                    bitmap: bitmap.to_string(),
                })
                .collect(),
            ..Self::default()
        }
    }

    /// Every free/busy query fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail_free_busy: true,
            ..Self::default()
        }
    }

    /// Event creation fails for `owner`.
    pub(crate) fn failing_create_for(mut self, owner: &str) -> Self {
        self.fail_create_for = Some(owner.to_string());
        self
    }

    /// Event deletion fails for `owner`.
    pub(crate) fn failing_delete_for(mut self, owner: &str) -> Self {
        self.fail_delete_for = Some(owner.to_string());
        self
    }
}

impl CalendarGateway for FakeCalendar {
    fn free_busy<'a>(
        &'a self,
        _query: &'a FreeBusyQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<ParticipantSchedule>>> {
        Box::pin(async move {
            if self.fail_free_busy {
                return Err(ProviderError::bad_request("free/busy query rejected"));
            }
            Ok(self.bitmaps.clone())
        })
    }

    fn create_event<'a>(
        &'a self,
        owner: &'a str,
        event: &'a EventRequest,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(async move {
            if self.fail_create_for.as_deref() == Some(owner) {
                return Err(ProviderError::bad_request("event rejected"));
            }
            let n = self.next_event.fetch_add(1, Ordering::SeqCst);
            self.created
                .lock()
                .unwrap()
                .push((owner.to_string(), event.clone()));
            Ok(CreatedEvent {
                id: format!("evt-{}", n),
                join_url: event
                    .online_meeting
                    .then(|| format!("https://meet.example.com/join/{}", n)),
            })
        })
    }

    fn delete_event<'a>(
        &'a self,
        owner: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            if self.fail_delete_for.as_deref() == Some(owner) {
                return Err(ProviderError::bad_request("delete rejected"));
            }
            self.deleted
                .lock()
                .unwrap()
                .push((owner.to_string(), event_id.to_string()));
            Ok(())
        })
    }
}

/// Mail gateway recording every message.
#[derive(Default)]
pub(crate) struct FakeMail {
    pub(crate) sent: Mutex<Vec<MailMessage>>,
}

impl MailGateway for FakeMail {
    fn send<'a>(&'a self, message: &'a MailMessage) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(async move {
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        })
    }
}

/// A minimal unconfirmed document for store-backed tests.
pub(crate) fn sample_document(token: &str, participants: &[&str]) -> ScheduleDocument {
    ScheduleDocument {
        token: token.to_string(),
        start_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2025, 1, 10).unwrap(),
        start_time: "09:00".to_string(),
        end_time: "12:00".to_string(),
        selected_days: vec!["Fri".to_string()],
        duration_minutes: 60,
        participants: participants.iter().map(|p| p.to_string()).collect(),
        time_zone: "Tokyo Standard Time".to_string(),
        confirmed: false,
        candidates: Vec::new(),
        event_ids: BTreeMap::new(),
    }
}
