//! RESULT: attach an interview outcome.
//!
//! Set-once and silent: duplicate deliveries of the same webhook change
//! nothing, and no reply goes back to the space.

use crate::command::ResultCommand;
use crate::error::BotError;

use super::BotContext;

pub async fn handle(ctx: &BotContext, command: &ResultCommand) -> Result<(), BotError> {
    let store = ctx.store.lock().await;
    let outcome = store.record_result(
        &command.last_name,
        &command.space_name,
        &command.client_name,
        &command.result,
    )?;
    log::info!(
        "Result for {} in {}: {:?}",
        command.last_name,
        command.space_name,
        outcome
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_utils::{test_context, FakeCalendar, FakeChat};
    use super::*;

    #[tokio::test]
    async fn test_result_closes_interview_and_stays_silent() {
        let chat = Arc::new(FakeChat::default());
        let ctx = test_context(chat.clone(), Arc::new(FakeCalendar::default()));
        {
            let store = ctx.store.lock().await;
            store
                .insert_interview("Иванов", "AcmeCorp", "PHP - AcmeCorp - Outstaff")
                .expect("insert");
        }

        let command = ResultCommand {
            last_name: "Иванов".to_string(),
            client_name: "AcmeCorp".to_string(),
            result: "passed".to_string(),
            space_name: "PHP - AcmeCorp - Outstaff".to_string(),
        };
        handle(&ctx, &command).await.expect("handle");
        // A second delivery is a no-op.
        handle(&ctx, &command).await.expect("handle");

        assert!(chat.sent.lock().unwrap().is_empty());

        let store = ctx.store.lock().await;
        let interviews = store.interviews_for_client("AcmeCorp").expect("query");
        assert_eq!(interviews.len(), 1);
        assert_eq!(interviews[0].result.as_deref(), Some("passed"));
    }
}
