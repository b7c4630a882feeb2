//! Google Chat REST client.
//!
//! Covers the three calls the bot actually makes: posting a message
//! into a space or thread, fetching the first message of a thread, and
//! listing the human members of a space.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use super::auth::TokenProvider;
use super::{ChatGateway, GatewayError, Member, ReplyTarget, SentMessage, ThreadRoot};

const CHAT_BASE: &str = "https://chat.googleapis.com/v1";

pub struct ChatClient {
    http: reqwest::Client,
    token: Arc<TokenProvider>,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, token: Arc<TokenProvider>) -> Self {
        Self { http, token }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessage {
    #[serde(default)]
    name: String,
    #[serde(default)]
    text: String,
    thread: Option<RawThread>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawThread {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMessageList {
    #[serde(default)]
    messages: Vec<RawMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMembershipList {
    #[serde(default)]
    memberships: Vec<RawMembership>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawMembership {
    member: Option<RawUser>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    /// Resource name in the form `users/<id>`.
    #[serde(default)]
    name: String,
    #[serde(default)]
    display_name: String,
}

#[async_trait]
impl ChatGateway for ChatClient {
    async fn create_message(
        &self,
        space_id: &str,
        target: &ReplyTarget,
        text: &str,
    ) -> Result<SentMessage, GatewayError> {
        let access = self.token.access_token().await?;
        let url = format!("{}/spaces/{}/messages", CHAT_BASE, space_id);

        let mut request = self.http.post(&url).bearer_auth(&access);
        let body = match target {
            ReplyTarget::Space => json!({ "text": text }),
            ReplyTarget::Thread(thread_name) => {
                request = request.query(&[(
                    "messageReplyOption",
                    "REPLY_MESSAGE_FALLBACK_TO_NEW_THREAD",
                )]);
                json!({
                    "text": text,
                    "thread": { "name": thread_name },
                })
            }
        };

        let resp = request.json(&body).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let raw: RawMessage = resp.json().await?;
        Ok(SentMessage {
            name: raw.name,
            thread_name: raw.thread.unwrap_or_default().name,
        })
    }

    async fn first_thread_message(
        &self,
        space_id: &str,
        thread_id: &str,
    ) -> Result<Option<ThreadRoot>, GatewayError> {
        let access = self.token.access_token().await?;
        let url = format!("{}/spaces/{}/messages", CHAT_BASE, space_id);
        let filter = format!(
            "thread.name=\"spaces/{}/threads/{}\"",
            space_id, thread_id
        );

        let resp = self
            .http
            .get(&url)
            .bearer_auth(&access)
            .query(&[("filter", filter.as_str()), ("pageSize", "1")])
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

        let raw: RawMessageList = resp.json().await?;
        Ok(raw
            .messages
            .into_iter()
            .next()
            .map(|message| ThreadRoot {
                name: message.name,
                text: message.text,
            }))
    }

    async fn list_human_members(
        &self,
        space_id: &str,
    ) -> Result<Vec<Member>, GatewayError> {
        let access = self.token.access_token().await?;
        let url = format!("{}/spaces/{}/members", CHAT_BASE, space_id);

        let mut members = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self.http.get(&url).bearer_auth(&access).query(&[
                ("filter", "member.type = \"HUMAN\""),
                ("pageSize", "1000"),
            ]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let resp = request.send().await?;
            let status = resp.status();
            if !status.is_success() {
                let body = resp.text().await.unwrap_or_default();
                return Err(GatewayError::Api {
                    status: status.as_u16(),
                    message: body,
                });
            }

            let RawMembershipList {
                memberships,
                next_page_token,
            } = resp.json().await?;

            for membership in memberships {
                let Some(user) = membership.member else {
                    continue;
                };
                let user_id = user.name.split('/').nth(1).unwrap_or_default();
                if user_id.is_empty() {
                    log::warn!("Skipping member with odd resource name {:?}", user.name);
                    continue;
                }
                members.push(Member {
                    user_id: user_id.to_string(),
                    display_name: user.display_name,
                });
            }

            match next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        Ok(members)
    }
}
