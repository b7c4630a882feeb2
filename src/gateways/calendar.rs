//! Google Calendar REST client.
//!
//! Two calls: the freeBusy query feeding the slot finder, and event
//! insertion with an attached Meet conference.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::DateTime;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_json::json;

use crate::scheduling::{BusyCalendars, BusyInterval, TimeSlot};

use super::auth::TokenProvider;
use super::{CalendarGateway, CreatedEvent, EventRequest, GatewayError};

const CALENDAR_BASE: &str = "https://www.googleapis.com/calendar/v3";

pub struct CalendarClient {
    http: reqwest::Client,
    token: Arc<TokenProvider>,
    tz: Tz,
}

impl CalendarClient {
    pub fn new(http: reqwest::Client, token: Arc<TokenProvider>, tz: Tz) -> Self {
        Self { http, token, tz }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFreeBusyResponse {
    #[serde(default)]
    calendars: HashMap<String, RawFreeBusyCalendar>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawFreeBusyCalendar {
    #[serde(default)]
    busy: Vec<RawBusyInterval>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawBusyInterval {
    #[serde(default)]
    start: String,
    #[serde(default)]
    end: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCreatedEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    html_link: Option<String>,
    #[serde(default)]
    hangout_link: Option<String>,
}

fn parse_instant(value: &str, tz: Tz) -> Option<DateTime<Tz>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&tz))
}

#[async_trait]
impl CalendarGateway for CalendarClient {
    async fn freebusy(
        &self,
        calendar_ids: &[String],
        window: &TimeSlot,
    ) -> Result<BusyCalendars, GatewayError> {
        let access = self.token.access_token().await?;
        let items: Vec<_> = calendar_ids
            .iter()
            .map(|id| json!({ "id": id }))
            .collect();
        let body = json!({
            "timeMin": window.start.to_rfc3339(),
            "timeMax": window.end.to_rfc3339(),
            "items": items,
        });

        let resp = self
            .http
            .post(format!("{}/freeBusy", CALENDAR_BASE))
            .bearer_auth(&access)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let raw: RawFreeBusyResponse = resp.json().await?;

        let mut calendars = BusyCalendars::new();
        for (id, calendar) in raw.calendars {
            let mut intervals = Vec::with_capacity(calendar.busy.len());
            for busy in calendar.busy {
                match (
                    parse_instant(&busy.start, self.tz),
                    parse_instant(&busy.end, self.tz),
                ) {
                    (Some(start), Some(end)) => {
                        intervals.push(BusyInterval { start, end })
                    }
                    _ => log::warn!(
                        "Skipping unparsable busy interval {} - {} for {}",
                        busy.start,
                        busy.end,
                        id
                    ),
                }
            }
            calendars.insert(id, intervals);
        }

        Ok(calendars)
    }

    async fn insert_event(
        &self,
        event: &EventRequest,
    ) -> Result<CreatedEvent, GatewayError> {
        let access = self.token.access_token().await?;
        let url = format!("{}/calendars/primary/events", CALENDAR_BASE);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(&access)
            .query(&[("conferenceDataVersion", "1")])
            .json(event)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let raw: RawCreatedEvent = resp.json().await?;
        log::info!("Created calendar event {}", raw.id);

        Ok(CreatedEvent {
            id: raw.id,
            html_link: raw.html_link,
            hangout_link: raw.hangout_link,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::Europe::Moscow;

    #[test]
    fn test_freebusy_response_parses_calendars() {
        let json = r#"{
            "kind": "calendar#freeBusy",
            "calendars": {
                "alice@example.com": {
                    "busy": [
                        { "start": "2024-03-13T06:00:00Z", "end": "2024-03-13T07:00:00Z" }
                    ]
                },
                "bob@example.com": { "busy": [] }
            }
        }"#;
        let raw: RawFreeBusyResponse = serde_json::from_str(json).expect("parse");
        assert_eq!(raw.calendars.len(), 2);
        assert_eq!(raw.calendars["alice@example.com"].busy.len(), 1);
        assert!(raw.calendars["bob@example.com"].busy.is_empty());
    }

    #[test]
    fn test_parse_instant_converts_to_business_timezone() {
        let instant = parse_instant("2024-03-13T06:00:00Z", Moscow).expect("parse");
        assert_eq!(instant.hour(), 9);
    }

    #[test]
    fn test_parse_instant_rejects_garbage() {
        assert!(parse_instant("yesterday", Moscow).is_none());
    }

    #[test]
    fn test_created_event_parses_links() {
        let json = r#"{
            "id": "evt123",
            "htmlLink": "https://www.google.com/calendar/event?eid=abc",
            "hangoutLink": "https://meet.google.com/abc-defg-hij",
            "status": "confirmed"
        }"#;
        let raw: RawCreatedEvent = serde_json::from_str(json).expect("parse");
        assert_eq!(raw.id, "evt123");
        assert_eq!(
            raw.hangout_link.as_deref(),
            Some("https://meet.google.com/abc-defg-hij")
        );
    }
}
