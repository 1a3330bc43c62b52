//! Microsoft Graph calendar client.
//!
//! Implements [`CalendarGateway`] over the Graph REST API: `getSchedule`
//! for free/busy bitmaps, `calendar/events` for event writes.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDateTime;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::BoxFuture;
use crate::auth::TokenSource;
use crate::calendar::{
    CalendarGateway, CreatedEvent, EventRequest, FreeBusyQuery, ParticipantSchedule,
};
use crate::error::{ProviderError, ProviderResult};
use crate::http;

/// Base URL for the Graph API.
const GRAPH_API_BASE: &str = "https://graph.microsoft.com/v1.0";

/// Wall-clock format Graph expects in dateTime/timeZone pairs.
const GRAPH_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Bitmap cell width requested from `getSchedule`, in minutes. Must match
/// the grid resolution the matching engine decodes against.
const AVAILABILITY_VIEW_INTERVAL: u32 = 30;

/// Microsoft Graph calendar client.
pub struct GraphCalendarClient {
    http_client: reqwest::Client,
    token_source: Arc<dyn TokenSource>,
    base_url: String,
}

impl GraphCalendarClient {
    /// Creates a client with the default endpoint and timeout.
    pub fn new(token_source: Arc<dyn TokenSource>) -> Self {
        Self::with_timeout(token_source, http::DEFAULT_TIMEOUT)
    }

    /// Creates a client with a custom request timeout.
    pub fn with_timeout(token_source: Arc<dyn TokenSource>, timeout: Duration) -> Self {
        Self {
            http_client: http::build_client(timeout),
            token_source,
            base_url: GRAPH_API_BASE.to_string(),
        }
    }

    /// Overrides the API base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn user_url(&self, owner: &str, suffix: &str) -> String {
        format!(
            "{}/users/{}/{}",
            self.base_url,
            urlencoding::encode(owner),
            suffix
        )
    }

    async fn fetch_free_busy(
        &self,
        query: &FreeBusyQuery,
    ) -> ProviderResult<Vec<ParticipantSchedule>> {
        let anchor = query.participants.first().ok_or_else(|| {
            ProviderError::bad_request("free/busy query needs at least one participant")
        })?;
        let url = self.user_url(anchor, "calendar/getSchedule");
        let body = GetScheduleRequest {
            schedules: &query.participants,
            start_time: GraphDateTime::new(query.start, &query.time_zone),
            end_time: GraphDateTime::new(query.end, &query.time_zone),
            availability_view_interval: AVAILABILITY_VIEW_INTERVAL,
        };

        let token = self.token_source.access_token().await?;
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("getSchedule request failed: {}", e)).with_source(e)
            })?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response)
                .await
                .with_gateway("calendar"));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read getSchedule response: {}", e))
        })?;
        let parsed: GetScheduleResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse getSchedule response: {}", e))
        })?;

        let schedules: Vec<ParticipantSchedule> = parsed
            .value
            .into_iter()
            .filter_map(|s| {
                let bitmap = s.availability_view?;
                Some(ParticipantSchedule {
                    participant: s.schedule_id,
                    bitmap,
                })
            })
            .collect();
        debug!(
            requested = query.participants.len(),
            returned = schedules.len(),
            "fetched free/busy schedules"
        );
        Ok(schedules)
    }

    async fn post_event(&self, owner: &str, event: &EventRequest) -> ProviderResult<CreatedEvent> {
        let url = self.user_url(owner, "calendar/events");
        let body = CreateEventRequest::from_event(event);

        let token = self.token_source.access_token().await?;
        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("event create request failed: {}", e)).with_source(e)
            })?;

        if !response.status().is_success() {
            return Err(http::error_from_response(response)
                .await
                .with_gateway("calendar"));
        }

        let body = response.text().await.map_err(|e| {
            ProviderError::network(format!("failed to read event response: {}", e))
        })?;
        let created: CreateEventResponse = serde_json::from_str(&body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse event response: {}", e))
        })?;
        debug!(owner, event_id = %created.id, "created calendar event");
        Ok(CreatedEvent {
            id: created.id,
            join_url: created.online_meeting.and_then(|m| m.join_url),
        })
    }

    async fn remove_event(&self, owner: &str, event_id: &str) -> ProviderResult<()> {
        let url = self.user_url(
            owner,
            &format!("calendar/events/{}", urlencoding::encode(event_id)),
        );

        let token = self.token_source.access_token().await?;
        let response = self
            .http_client
            .delete(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| {
                ProviderError::network(format!("event delete request failed: {}", e)).with_source(e)
            })?;

        let status = response.status();
        // Already gone counts as deleted.
        if status == StatusCode::NOT_FOUND {
            debug!(owner, event_id, "event already absent");
            return Ok(());
        }
        if !status.is_success() {
            return Err(http::error_from_response(response)
                .await
                .with_gateway("calendar"));
        }
        debug!(owner, event_id, "deleted calendar event");
        Ok(())
    }
}

impl CalendarGateway for GraphCalendarClient {
    fn free_busy<'a>(
        &'a self,
        query: &'a FreeBusyQuery,
    ) -> BoxFuture<'a, ProviderResult<Vec<ParticipantSchedule>>> {
        Box::pin(self.fetch_free_busy(query))
    }

    fn create_event<'a>(
        &'a self,
        owner: &'a str,
        event: &'a EventRequest,
    ) -> BoxFuture<'a, ProviderResult<CreatedEvent>> {
        Box::pin(self.post_event(owner, event))
    }

    fn delete_event<'a>(
        &'a self,
        owner: &'a str,
        event_id: &'a str,
    ) -> BoxFuture<'a, ProviderResult<()>> {
        Box::pin(self.remove_event(owner, event_id))
    }
}

#[derive(Debug, Serialize)]
struct GraphDateTime {
    #[serde(rename = "dateTime")]
    date_time: String,
    #[serde(rename = "timeZone")]
    time_zone: String,
}

impl GraphDateTime {
    fn new(moment: NaiveDateTime, time_zone: &str) -> Self {
        Self {
            date_time: moment.format(GRAPH_TIME_FORMAT).to_string(),
            time_zone: time_zone.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GetScheduleRequest<'a> {
    schedules: &'a [String],
    start_time: GraphDateTime,
    end_time: GraphDateTime,
    availability_view_interval: u32,
}

#[derive(Debug, Deserialize)]
struct GetScheduleResponse {
    #[serde(default)]
    value: Vec<ScheduleItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScheduleItem {
    schedule_id: String,
    availability_view: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventRequest {
    subject: String,
    body: EventBody,
    start: GraphDateTime,
    end: GraphDateTime,
    allow_new_time_proposals: bool,
    is_online_meeting: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    online_meeting_provider: Option<&'static str>,
}

impl CreateEventRequest {
    fn from_event(event: &EventRequest) -> Self {
        Self {
            subject: event.subject.clone(),
            body: EventBody {
                content_type: "HTML",
                content: event.body_html.clone(),
            },
            start: GraphDateTime::new(event.start, &event.time_zone),
            end: GraphDateTime::new(event.end, &event.time_zone),
            allow_new_time_proposals: true,
            is_online_meeting: event.online_meeting,
            online_meeting_provider: event.online_meeting.then_some("teamsForBusiness"),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EventBody {
    content_type: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateEventResponse {
    id: String,
    online_meeting: Option<OnlineMeeting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OnlineMeeting {
    join_url: Option<String>,
}
