//! Narrow seams over the Google REST surfaces.
//!
//! Handlers depend on these traits only. The REST clients in [`chat`]
//! and [`calendar`] implement them for production; tests substitute
//! in-memory fakes. There is no retry or backoff anywhere behind these
//! traits: a failed call surfaces as a `GatewayError`, gets logged, and
//! ends the command that made it.

pub mod auth;
pub mod calendar;
pub mod chat;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::scheduling::{BusyCalendars, TimeSlot};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Google API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Token exchange failed: {0}")]
    Auth(String),

    #[error("Unexpected response shape: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Chat
// ---------------------------------------------------------------------------

/// Where an outbound message goes within its space.
#[derive(Debug, Clone, PartialEq)]
pub enum ReplyTarget {
    /// New top-level message.
    Space,
    /// Reply into the named thread (`spaces/<space>/threads/<thread>`),
    /// falling back to a new thread when it no longer accepts replies.
    Thread(String),
}

impl ReplyTarget {
    pub fn thread(space_id: &str, thread_id: &str) -> Self {
        ReplyTarget::Thread(format!("spaces/{}/threads/{}", space_id, thread_id))
    }
}

/// The created message, as named by the Chat API.
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub name: String,
    pub thread_name: String,
}

/// First message of a thread.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadRoot {
    pub name: String,
    pub text: String,
}

/// A human member of a space.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    /// Bare id segment of `users/<id>`.
    pub user_id: String,
    pub display_name: String,
}

impl Member {
    /// Chat mention markup for this member.
    pub fn mention(&self) -> String {
        format!("<users/{}>", self.user_id)
    }
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Create a message in a space, optionally threaded.
    async fn create_message(
        &self,
        space_id: &str,
        target: &ReplyTarget,
        text: &str,
    ) -> Result<SentMessage, GatewayError>;

    /// Fetch the first message of a thread, when the thread has any.
    async fn first_thread_message(
        &self,
        space_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadRoot>, GatewayError>;

    /// All members of a space with `member.type = "HUMAN"`.
    async fn list_human_members(&self, space_id: &str) -> Result<Vec<Member>, GatewayError>;
}

// ---------------------------------------------------------------------------
// Calendar
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    pub date_time: String,
    pub time_zone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventAttendee {
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<bool>,
}

impl EventAttendee {
    pub fn person(email: &str) -> Self {
        Self {
            email: email.to_string(),
            resource: None,
        }
    }

    pub fn room(email: &str) -> Self {
        Self {
            email: email.to_string(),
            resource: Some(true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceSolutionKey {
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceCreateRequest {
    pub request_id: String,
    pub conference_solution_key: ConferenceSolutionKey,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceData {
    pub create_request: ConferenceCreateRequest,
}

impl ConferenceData {
    /// A fresh Hangouts-Meet conference request.
    pub fn hangouts_meet() -> Self {
        Self {
            create_request: ConferenceCreateRequest {
                request_id: Uuid::new_v4().to_string(),
                conference_solution_key: ConferenceSolutionKey {
                    kind: "hangoutsMeet".to_string(),
                },
            },
        }
    }
}

/// Payload for `events.insert`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRequest {
    pub summary: String,
    pub start: EventTime,
    pub end: EventTime,
    pub attendees: Vec<EventAttendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub guests_can_modify: bool,
    pub conference_data: ConferenceData,
}

impl EventRequest {
    /// An event over `slot` with a Meet conference attached.
    pub fn meet_event(
        summary: String,
        slot: &TimeSlot,
        time_zone: &str,
        attendees: Vec<EventAttendee>,
        description: Option<String>,
    ) -> Self {
        Self {
            summary,
            start: EventTime {
                date_time: slot.start.to_rfc3339(),
                time_zone: time_zone.to_string(),
            },
            end: EventTime {
                date_time: slot.end.to_rfc3339(),
                time_zone: time_zone.to_string(),
            },
            attendees,
            description,
            guests_can_modify: true,
            conference_data: ConferenceData::hangouts_meet(),
        }
    }
}

/// The created event, trimmed to what handlers report back.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CreatedEvent {
    pub id: String,
    pub html_link: Option<String>,
    pub hangout_link: Option<String>,
}

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Busy intervals per id over the window, in the business timezone.
    async fn freebusy(
        &self,
        ids: &[String],
        window: &TimeSlot,
    ) -> Result<BusyCalendars, GatewayError>;

    /// Insert an event on the primary calendar with conference support.
    async fn insert_event(&self, event: &EventRequest) -> Result<CreatedEvent, GatewayError>;
}
