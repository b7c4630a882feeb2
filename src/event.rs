//! Inbound webhook payload types.
//!
//! Google Chat pushes one JSON document per event. Only the fields the
//! bot reads are modeled; unknown fields are ignored and missing blocks
//! deserialize to defaults rather than failing the whole event.

use serde::Deserialize;

/// One webhook delivery from Google Chat.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    /// Event kind: "MESSAGE", "ADDED_TO_SPACE", "REMOVED_FROM_SPACE", ...
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub message: Option<EventMessage>,
    #[serde(default)]
    pub space: Option<EventSpace>,
    #[serde(default)]
    pub user: Option<EventUser>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMessage {
    /// Resource name: `spaces/<space>/messages/<message>`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub thread: Option<EventThread>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventThread {
    /// Resource name: `spaces/<space>/threads/<thread>`.
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventSpace {
    /// Resource name: `spaces/<space>`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub display_name: String,
    /// "DIRECT_MESSAGE" or "SPACE". Older payloads carry `type` instead.
    #[serde(default, alias = "type")]
    pub space_type: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventUser {
    #[serde(default)]
    pub display_name: String,
}

impl EventSpace {
    /// The opaque id segment of `spaces/<space>`.
    pub fn space_id(&self) -> Option<&str> {
        self.name.split('/').nth(1).filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_message_event() {
        let json = r#"{
            "type": "MESSAGE",
            "eventTime": "2024-03-01T10:15:00.000Z",
            "message": {
                "name": "spaces/AAA123/messages/BBB456",
                "text": "@Staff Bot INTERVIEW Ivanov 14.03 15:00",
                "thread": { "name": "spaces/AAA123/threads/CCC789" },
                "sender": { "name": "users/111", "displayName": "Some User" }
            },
            "space": {
                "name": "spaces/AAA123",
                "displayName": "PHP - AcmeCorp - Outstaff",
                "spaceType": "SPACE"
            }
        }"#;

        let event: ChatEvent = serde_json::from_str(json).expect("parse event");
        assert_eq!(event.event_type, "MESSAGE");
        let message = event.message.expect("message block");
        assert_eq!(message.text, "@Staff Bot INTERVIEW Ivanov 14.03 15:00");
        assert_eq!(
            message.thread.expect("thread").name,
            "spaces/AAA123/threads/CCC789"
        );
        let space = event.space.expect("space block");
        assert_eq!(space.display_name, "PHP - AcmeCorp - Outstaff");
        assert_eq!(space.space_id(), Some("AAA123"));
    }

    #[test]
    fn test_deserialize_added_to_space_event() {
        let json = r#"{
            "type": "ADDED_TO_SPACE",
            "space": {
                "name": "spaces/DDD321",
                "spaceType": "DIRECT_MESSAGE"
            },
            "user": { "displayName": "Ivan Ivanov" }
        }"#;

        let event: ChatEvent = serde_json::from_str(json).expect("parse event");
        assert_eq!(event.event_type, "ADDED_TO_SPACE");
        assert!(event.message.is_none());
        let space = event.space.expect("space block");
        assert_eq!(space.space_type, "DIRECT_MESSAGE");
        assert_eq!(space.space_id(), Some("DDD321"));
        assert_eq!(event.user.expect("user").display_name, "Ivan Ivanov");
    }

    #[test]
    fn test_legacy_type_field_on_space() {
        let json = r#"{"type": "ADDED_TO_SPACE", "space": {"name": "spaces/X", "type": "DIRECT_MESSAGE"}}"#;
        let event: ChatEvent = serde_json::from_str(json).expect("parse event");
        assert_eq!(event.space.expect("space").space_type, "DIRECT_MESSAGE");
    }
}
