//! REQUEST: register a client's staffing request.
//!
//! The client row is matched fuzzily or created, the request row is
//! always inserted. The only reply is a history summary, and only when
//! the client already has preparations or interviews on file.

use crate::command::RequestCommand;
use crate::error::BotError;
use crate::gateways::ReplyTarget;

use super::BotContext;

pub async fn handle(ctx: &BotContext, command: &RequestCommand) -> Result<(), BotError> {
    let store = ctx.store.lock().await;

    // Reuse an existing client when the name is close enough.
    let client_name = match store.find_client_fuzzy(&command.client_name)? {
        Some(client) => client.name,
        None => {
            store.insert_client(&command.client_name)?;
            command.client_name.clone()
        }
    };

    store.insert_request(
        &command.request_name,
        &client_name,
        command.description.as_deref(),
        command.devs_amount.as_deref(),
    )?;

    let preparations = store.preparations_for_client(&client_name)?;
    let interviews = store.interviews_for_client(&client_name)?;
    drop(store);

    if preparations.is_empty() && interviews.is_empty() {
        return Ok(());
    }
    let Some(space_id) = command.space_id.as_deref() else {
        return Ok(());
    };

    let mut text = format!("*{}*", client_name);
    if !preparations.is_empty() {
        text.push_str("\nSent CVs:");
        for preparation in &preparations {
            text.push_str(&format!("\n{} {}", preparation.dev, preparation.cv));
        }
    }
    if !interviews.is_empty() {
        text.push_str("\nInterviews:");
        for interview in &interviews {
            match interview.result.as_deref() {
                Some(result) if !result.is_empty() => {
                    text.push_str(&format!("\n{}: {}", interview.dev, result))
                }
                _ => text.push_str(&format!("\n{}: scheduled", interview.dev)),
            }
        }
    }

    let target = match command.thread_id.as_deref() {
        Some(thread_id) => ReplyTarget::thread(space_id, thread_id),
        None => ReplyTarget::Space,
    };
    ctx.chat.create_message(space_id, &target, &text).await?;

    Ok(())
}
