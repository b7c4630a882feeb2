//! Event dispatch and the per-command handlers.
//!
//! `process_event` is the single entry point behind the webhook route.
//! MESSAGE events get the thread root fetched (when the message sits in
//! a thread), run through the parser, and land in exactly one handler.
//! ADDED_TO_SPACE binds a developer's direct-message space. Everything
//! else is ignored at debug level.
//!
//! Handlers are stateless: they read and write the record store, call
//! the gateways, and return. An input-class failure is answered with
//! the "command not found" notice in the originating thread; any other
//! failure ends the command in the log.

use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::command::{Command, ErrorCommand};
use crate::config::BotConfig;
use crate::error::BotError;
use crate::event::ChatEvent;
use crate::gateways::{CalendarGateway, ChatGateway, ReplyTarget};
use crate::parser;
use crate::store::RecordStore;

mod interview;
mod membership;
mod preparation;
mod request;
mod result;

/// Everything a handler needs: the store, both gateways, and config.
#[derive(Clone)]
pub struct BotContext {
    pub store: Arc<Mutex<RecordStore>>,
    pub chat: Arc<dyn ChatGateway>,
    pub calendar: Arc<dyn CalendarGateway>,
    pub config: Arc<BotConfig>,
}

/// Route one webhook delivery.
pub async fn process_event(ctx: &BotContext, event: &ChatEvent) {
    log::info!("Received {} event", event.event_type);

    match event.event_type.as_str() {
        "MESSAGE" => handle_message(ctx, event).await,
        "ADDED_TO_SPACE" => {
            if let Err(e) = membership::handle(ctx, event).await {
                log::error!("Space binding failed: {}", e);
            }
        }
        other => log::debug!("Ignoring event of type {:?}", other),
    }
}

async fn handle_message(ctx: &BotContext, event: &ChatEvent) {
    let thread_root = match fetch_thread_root(ctx, event).await {
        Ok(root) => root,
        Err(e) => {
            log::error!("Could not fetch the thread root: {}", e);
            return;
        }
    };

    let command = parser::parse(event, thread_root.as_deref(), &ctx.config.bot_name);
    dispatch(ctx, command).await;
}

/// Text of the first message in the triggering thread, when there is
/// one. Commands that read the request description live off this.
async fn fetch_thread_root(
    ctx: &BotContext,
    event: &ChatEvent,
) -> Result<Option<String>, BotError> {
    let (space_id, thread_id) = parser::routing_ids(event);
    let (Some(space_id), Some(thread_id)) = (space_id, thread_id) else {
        return Ok(None);
    };

    let root = ctx.chat.first_thread_message(&space_id, &thread_id).await?;
    Ok(root.map(|r| r.text))
}

/// Run the one handler a command maps to, then settle its outcome.
pub async fn dispatch(ctx: &BotContext, command: Command) {
    let keyword = command.keyword().to_string();
    let (space_id, thread_id) = reply_ids(&command);
    log::info!("Dispatching {} command", keyword);

    let outcome = match &command {
        Command::Preparation(c) => preparation::handle(ctx, c).await,
        Command::Request(c) => request::handle(ctx, c).await,
        Command::Interview(c) => interview::handle(ctx, c).await,
        Command::Result(c) => result::handle(ctx, c).await,
        Command::Error(c) => error_reply(ctx, c).await,
    };

    match outcome {
        Ok(()) => {}
        Err(e) if e.is_input_error() => {
            log::warn!("{} rejected: {}", keyword, e);
            let notice = ErrorCommand {
                token: keyword,
                space_id,
                thread_id,
            };
            if let Err(reply_err) = error_reply(ctx, &notice).await {
                log::error!("Failed to send the input-error notice: {}", reply_err);
            }
        }
        Err(e) => log::error!("{} command failed: {}", keyword, e),
    }
}

/// Space and thread a handler failure should be answered in.
fn reply_ids(command: &Command) -> (Option<String>, Option<String>) {
    match command {
        Command::Request(c) => (c.space_id.clone(), c.thread_id.clone()),
        Command::Interview(c) => (c.space_id.clone(), c.thread_id.clone()),
        Command::Error(c) => (c.space_id.clone(), c.thread_id.clone()),
        Command::Preparation(_) | Command::Result(_) => (None, None),
    }
}

/// The Error handler: a threaded "command not found" notice. With no
/// space to answer in, the notice is dropped.
async fn error_reply(ctx: &BotContext, command: &ErrorCommand) -> Result<(), BotError> {
    let Some(space_id) = command.space_id.as_deref() else {
        log::debug!("No space to answer in, dropping the notice");
        return Ok(());
    };

    let target = match command.thread_id.as_deref() {
        Some(thread_id) => ReplyTarget::thread(space_id, thread_id),
        None => ReplyTarget::Space,
    };
    let text = format!(
        "{} command not found. Please check your input.",
        command.token
    );
    ctx.chat.create_message(space_id, &target, &text).await?;
    Ok(())
}

/// First/last pair from a "First Last" display string.
fn split_name(full: &str) -> Option<(&str, &str)> {
    let mut parts = full.split_whitespace();
    let first = parts.next()?;
    let last = parts.next()?;
    Some((first, last))
}

/// Drop duplicates, keeping the first occurrence of each value.
fn dedup_preserving_order(values: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|value| seen.insert(value.clone()))
        .collect()
}


#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::test_utils::{test_context, FakeCalendar, FakeChat};
    use super::*;
    use crate::gateways::ThreadRoot;

    fn message_event(text: &str, display_name: &str) -> ChatEvent {
        let json = format!(
            r#"{{
                "type": "MESSAGE",
                "message": {{
                    "name": "spaces/AAA/messages/MMM",
                    "text": "{text}",
                    "thread": {{ "name": "spaces/AAA/threads/TTT" }}
                }},
                "space": {{
                    "name": "spaces/AAA",
                    "displayName": "{display_name}",
                    "spaceType": "SPACE"
                }}
            }}"#
        );
        serde_json::from_str(&json).expect("event fixture")
    }

    #[tokio::test]
    async fn test_unknown_keyword_answered_in_thread() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));

        let event = message_event("@Staff Bot FOOBAR something", "PHP - AcmeCorp - Outstaff");
        process_event(&ctx, &event).await;

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        let (space, target, text) = &sent[0];
        assert_eq!(space, "AAA");
        assert_eq!(
            *target,
            ReplyTarget::Thread("spaces/AAA/threads/TTT".to_string())
        );
        assert_eq!(text, "FOOBAR command not found. Please check your input.");
    }

    #[tokio::test]
    async fn test_result_command_runs_end_to_end() {
        let chat = Arc::new(FakeChat {
            thread_root: Some(ThreadRoot {
                name: "spaces/AAA/messages/root".to_string(),
                text: "irrelevant".to_string(),
            }),
            ..FakeChat::default()
        });
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));

        let event = message_event("@Staff Bot RESULT Иванов passed", "PHP - AcmeCorp - Outstaff");
        process_event(&ctx, &event).await;

        // Result answers nothing; the record lands in the store.
        assert!(chat.sent.lock().unwrap().is_empty());
        let store = ctx.store.lock().await;
        let interviews = store.interviews_for_client("AcmeCorp").expect("query");
        assert_eq!(interviews.len(), 1);
        assert_eq!(interviews[0].dev, "Иванов");
        assert_eq!(interviews[0].request, "PHP - AcmeCorp - Outstaff");
        assert_eq!(interviews[0].result.as_deref(), Some("passed"));
    }

    #[tokio::test]
    async fn test_unhandled_event_type_is_ignored() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));

        let event: ChatEvent =
            serde_json::from_str(r#"{"type": "REMOVED_FROM_SPACE"}"#).expect("event");
        process_event(&ctx, &event).await;

        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("Ivan Ivanov"), Some(("Ivan", "Ivanov")));
        assert_eq!(split_name("  Ivan   Ivanov "), Some(("Ivan", "Ivanov")));
        assert_eq!(split_name("Ivanov"), None);
        assert_eq!(split_name(""), None);
    }

    #[test]
    fn test_dedup_preserving_order() {
        let deduped = dedup_preserving_order(vec![
            "a@example.com".to_string(),
            "b@example.com".to_string(),
            "a@example.com".to_string(),
        ]);
        assert_eq!(deduped, vec!["a@example.com", "b@example.com"]);
    }
}
