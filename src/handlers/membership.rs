//! ADDED_TO_SPACE: bind a developer's direct-message space.
//!
//! Adding the bot to a group space does nothing. In a direct message
//! the inviting user's display name is matched against the developers'
//! English names and the space id is stored, so later preparations and
//! interview notices know where to reach them.

use crate::error::BotError;
use crate::event::ChatEvent;
use crate::gateways::ReplyTarget;

use super::{split_name, BotContext};

pub async fn handle(ctx: &BotContext, event: &ChatEvent) -> Result<(), BotError> {
    let Some(space) = event.space.as_ref() else {
        return Ok(());
    };
    if space.space_type != "DIRECT_MESSAGE" {
        log::debug!("Added to a group space, nothing to bind");
        return Ok(());
    }
    let Some(space_id) = space.space_id() else {
        log::warn!("ADDED_TO_SPACE without a space id");
        return Ok(());
    };

    let display_name = event
        .user
        .as_ref()
        .map(|user| user.display_name.as_str())
        .unwrap_or("");
    let Some((first_en, last_en)) = split_name(display_name) else {
        log::warn!("User display name {:?} is not a first/last pair", display_name);
        return Ok(());
    };

    let store = ctx.store.lock().await;
    let bound = store.bind_developer_space(first_en, last_en, space_id)?;
    drop(store);
    if !bound {
        log::warn!("No developer matches {} {}, space not bound", first_en, last_en);
    }

    ctx.chat
        .create_message(space_id, &ReplyTarget::Space, "Configuration completed!")
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_utils::{test_context, FakeCalendar, FakeChat};
    use super::*;

    fn added_event(space_type: &str, display_name: &str) -> ChatEvent {
        let json = format!(
            r#"{{
                "type": "ADDED_TO_SPACE",
                "space": {{ "name": "spaces/DMSPACE", "spaceType": "{space_type}" }},
                "user": {{ "displayName": "{display_name}" }}
            }}"#
        );
        serde_json::from_str(&json).expect("event fixture")
    }

    #[tokio::test]
    async fn test_direct_message_binds_and_confirms() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));
        {
            let store = ctx.store.lock().await;
            store
                .insert_developer("Иван", "Иванов", "Ivan", "Ivanov", "ivan@example.com")
                .expect("insert");
        }

        handle(&ctx, &added_event("DIRECT_MESSAGE", "Ivan Ivanov"))
            .await
            .expect("handle");

        let store = ctx.store.lock().await;
        let developer = store
            .find_developer_exact("Ivanov", None)
            .expect("query")
            .expect("match");
        assert_eq!(developer.space.as_deref(), Some("DMSPACE"));
        drop(store);

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "DMSPACE");
        assert_eq!(sent[0].2, "Configuration completed!");
    }

    #[tokio::test]
    async fn test_group_space_is_ignored() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));

        handle(&ctx, &added_event("SPACE", "Ivan Ivanov"))
            .await
            .expect("handle");

        assert!(chat.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_user_still_gets_confirmation() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));

        handle(&ctx, &added_event("DIRECT_MESSAGE", "Ghost Person"))
            .await
            .expect("handle");

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].2, "Configuration completed!");
    }
}
