//! PREPARATION: send a batch of candidates to a client.
//!
//! Per candidate: look the developer up, record the preparation, DM the
//! CV link into the developer's bound space. Then one summary in the
//! staffing space with the CV links threaded under it, and (unless the
//! no-sync flag is set) a "Request sync" meeting over the first common
//! free slot of everyone involved.

use chrono::Duration;

use crate::command::PreparationCommand;
use crate::error::BotError;
use crate::gateways::{EventAttendee, EventRequest, ReplyTarget};
use crate::parser::FLAG_NOSYNC;
use crate::scheduling::{find_common_free_slot, SlotOptions, TimeSlot};

use super::{dedup_preserving_order, split_name, BotContext};

struct CandidateLine {
    name_en: String,
    link: String,
    description: Option<String>,
}

pub async fn handle(ctx: &BotContext, command: &PreparationCommand) -> Result<(), BotError> {
    let config = &ctx.config;
    let staffing_space = config.staffing_space.as_str();

    // Mentor mentions resolve by display name against the staffing
    // space's human members, fetched once for the whole batch.
    let members = ctx.chat.list_human_members(staffing_space).await?;

    let mut attendees: Vec<String> = vec![config.group_email.clone()];
    let mut mention_list: Vec<String> = Vec::new();
    let mut candidate_lines: Vec<CandidateLine> = Vec::new();

    for candidate in &command.candidates {
        let Some(full_name) = candidate.candidate_name() else {
            log::error!("CV block without a candidate_name, skipping it");
            continue;
        };
        let Some((first_ru, last_ru)) = split_name(full_name) else {
            log::error!("Candidate name {:?} is not a first/last pair, skipping it", full_name);
            continue;
        };
        let link = candidate.link().unwrap_or("").to_string();

        let store = ctx.store.lock().await;
        let Some(developer) = store.find_developer_fuzzy(first_ru, last_ru)? else {
            log::error!("Candidate {} is missing in the store!", full_name);
            store.insert_developer_stub(first_ru, last_ru)?;
            continue;
        };
        let mentors = store.mentors_of(developer.id)?;
        store.insert_preparation(
            &command.request_name,
            &command.client_name,
            &developer.full_name_ru(),
            &link,
        )?;
        drop(store);

        attendees.push(developer.email.clone());

        let mut mentor_names: Vec<String> = Vec::new();
        for mentor in &mentors {
            let name_en = mentor.full_name_en();
            let mention = members
                .iter()
                .find(|member| member.display_name == name_en)
                .map(|member| member.mention())
                .unwrap_or_else(|| name_en.clone());
            mention_list.push(mention);
            attendees.push(mentor.email.clone());
            mentor_names.push(name_en);
        }

        candidate_lines.push(CandidateLine {
            name_en: developer.full_name_en(),
            link: link.clone(),
            description: candidate.description().map(str::to_string),
        });

        let Some(space) = developer.space.as_deref().filter(|s| !s.is_empty()) else {
            log::warn!("Developer {} has no bound space, skipping the DM", full_name);
            continue;
        };
        let dm = format!(
            "You have been sent to a new request. Here is your CV: {}. \
             If you don't have access to it, please contact {}",
            link,
            mentor_names.join(", ")
        );
        ctx.chat.create_message(space, &ReplyTarget::Space, &dm).await?;
    }

    // One summary for the whole batch, CV links threaded under it.
    let candidate_names = candidate_lines
        .iter()
        .map(|line| line.name_en.clone())
        .collect::<Vec<_>>()
        .join(", ");
    let mentions = dedup_preserving_order(mention_list).join(", ");

    let mut summary = format!(
        "*{}* \n👥: {}\nⓂ️: {}",
        command.request_name, candidate_names, mentions
    );
    if let Some(comment) = &command.description {
        summary.push('\n');
        summary.push_str(comment);
    }

    let posted = ctx
        .chat
        .create_message(staffing_space, &ReplyTarget::Space, &summary)
        .await?;
    let thread = ReplyTarget::Thread(posted.thread_name.clone());

    for line in &candidate_lines {
        if let Some(description) = &line.description {
            ctx.chat
                .create_message(staffing_space, &thread, description)
                .await?;
        }
        let cv_line = format!("CV {} {}", line.name_en, line.link);
        ctx.chat
            .create_message(staffing_space, &thread, &cv_line)
            .await?;
    }

    if command.flags.is_set(FLAG_NOSYNC) {
        log::info!("Sync skipped for {}", command.client_name);
        return Ok(());
    }

    schedule_sync(ctx, command, attendees, &candidate_lines).await
}

/// Find the first slot everyone shares within the horizon and book the
/// request sync there. No common slot is not an error: the messages
/// above stand, only the meeting is dropped.
async fn schedule_sync(
    ctx: &BotContext,
    command: &PreparationCommand,
    attendees: Vec<String>,
    candidate_lines: &[CandidateLine],
) -> Result<(), BotError> {
    let config = &ctx.config;
    let attendees = dedup_preserving_order(attendees);

    let now = chrono::Utc::now().with_timezone(&config.tz());
    let window = TimeSlot {
        start: now,
        end: now + Duration::days(config.horizon_days as i64),
    };
    let busy = ctx.calendar.freebusy(&attendees, &window).await?;

    let opts = SlotOptions {
        work_start_hour: config.work_hours_start,
        work_end_hour: config.work_hours_end,
        horizon_days: config.horizon_days,
        granularity_minutes: config.slot_minutes,
    };
    let Some(slot) = find_common_free_slot(&busy, now, &opts) else {
        log::warn!("No common free slot for {}", command.client_name);
        return Ok(());
    };
    log::info!("Chose slot {} - {}", slot.start, slot.end);

    let mut description_lines: Vec<String> = Vec::new();
    if let Some(comment) = &command.description {
        description_lines.push(comment.clone());
    }
    for line in candidate_lines {
        description_lines.push(format!("CV {} {}", line.name_en, line.link));
    }
    let description = if description_lines.is_empty() {
        None
    } else {
        Some(description_lines.join("\n"))
    };

    let event = EventRequest::meet_event(
        format!("Request sync {}", command.client_name),
        &slot,
        &config.timezone,
        attendees
            .iter()
            .map(|email| EventAttendee::person(email))
            .collect(),
        description,
    );
    ctx.calendar.insert_event(&event).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::super::test_utils::{test_context, FakeCalendar, FakeChat};
    use super::*;
    use crate::command::{CandidateEntry, FlagMap, FlagValue};
    use crate::gateways::Member;

    fn candidate(name: &str, link: &str) -> CandidateEntry {
        CandidateEntry::new(vec![
            ("candidate_name".to_string(), name.to_string()),
            ("link".to_string(), link.to_string()),
        ])
    }

    fn preparation(candidates: Vec<CandidateEntry>, flags: FlagMap) -> PreparationCommand {
        let description = flags.text("COMMENT").map(str::to_string);
        PreparationCommand {
            request_name: "Senior PHP engineer".to_string(),
            client_name: "AcmeCorp".to_string(),
            candidates,
            flags,
            description,
        }
    }

    async fn seeded_context(chat: Arc<FakeChat>, calendar: Arc<FakeCalendar>) -> super::super::BotContext {
        let ctx = test_context(chat, calendar);
        {
            let store = ctx.store.lock().await;
            let dev = store
                .insert_developer("Иван", "Иванов", "Ivan", "Ivanov", "ivan@example.com")
                .expect("insert");
            let mentor = store
                .insert_developer("Олег", "Кузнецов", "Oleg", "Kuznetsov", "oleg@example.com")
                .expect("insert");
            store.add_mentor(dev, mentor, 0).expect("link");
            store
                .bind_developer_space("Ivan", "Ivanov", "DEVSPACE")
                .expect("bind");
        }
        ctx
    }

    #[tokio::test]
    async fn test_preparation_dm_summary_followups_and_sync() {
        let chat = Arc::new(FakeChat {
            members: vec![Member {
                user_id: "777".to_string(),
                display_name: "Oleg Kuznetsov".to_string(),
            }],
            ..FakeChat::default()
        });
        let calendar = Arc::new(FakeCalendar::default());
        let ctx = seeded_context(chat.clone(), calendar.clone()).await;

        let command = preparation(
            vec![candidate("Иван Иванов", "https://cv.example/1")],
            FlagMap::default(),
        );
        handle(&ctx, &command).await.expect("handle");

        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 3);

        let (dm_space, dm_target, dm_text) = &sent[0];
        assert_eq!(dm_space, "DEVSPACE");
        assert_eq!(*dm_target, ReplyTarget::Space);
        assert_eq!(
            dm_text,
            "You have been sent to a new request. Here is your CV: https://cv.example/1. \
             If you don't have access to it, please contact Oleg Kuznetsov"
        );

        let (summary_space, _, summary_text) = &sent[1];
        assert_eq!(summary_space, "STAFFSPACE");
        assert_eq!(
            summary_text,
            "*Senior PHP engineer* \n👥: Ivan Ivanov\nⓂ️: <users/777>"
        );

        let (cv_space, cv_target, cv_text) = &sent[2];
        assert_eq!(cv_space, "STAFFSPACE");
        assert!(matches!(cv_target, ReplyTarget::Thread(_)));
        assert_eq!(cv_text, "CV Ivan Ivanov https://cv.example/1");

        let events = calendar.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].summary, "Request sync AcmeCorp");
        let emails: Vec<&str> = events[0]
            .attendees
            .iter()
            .map(|attendee| attendee.email.as_str())
            .collect();
        assert_eq!(
            emails,
            vec![
                "php-preparations@example.com",
                "ivan@example.com",
                "oleg@example.com"
            ]
        );
        assert_eq!(
            events[0].description.as_deref(),
            Some("CV Ivan Ivanov https://cv.example/1")
        );

        let store = ctx.store.lock().await;
        let rows = store.preparations_for_client("AcmeCorp").expect("query");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].dev, "Иван Иванов");
        assert_eq!(rows[0].cv, "https://cv.example/1");
    }

    #[tokio::test]
    async fn test_unknown_candidate_gets_stub_and_batch_continues() {
        let chat = Arc::new(FakeChat {
            members: vec![Member {
                user_id: "777".to_string(),
                display_name: "Oleg Kuznetsov".to_string(),
            }],
            ..FakeChat::default()
        });
        let calendar = Arc::new(FakeCalendar::default());
        let ctx = seeded_context(chat.clone(), calendar.clone()).await;

        let command = preparation(
            vec![
                candidate("Пётр Петров", "https://cv.example/9"),
                candidate("Иван Иванов", "https://cv.example/1"),
            ],
            FlagMap::default(),
        );
        handle(&ctx, &command).await.expect("handle");

        // The unknown candidate is skipped but leaves a stub row behind.
        let store = ctx.store.lock().await;
        let all = store.all_developers().expect("query");
        assert_eq!(all.len(), 3);
        assert!(all
            .iter()
            .any(|dev| dev.last_name_ru == "Петров" && dev.first_name_en.is_empty()));

        let rows = store.preparations_for_client("AcmeCorp").expect("query");
        assert_eq!(rows.len(), 1);
        drop(store);

        let texts = chat.texts();
        let summary = texts
            .iter()
            .find(|text| text.starts_with('*'))
            .expect("summary");
        assert!(summary.contains("Ivan Ivanov"));
        assert!(!summary.contains("Петров"));

        // The sync still happens for the candidates that resolved.
        assert_eq!(calendar.events.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_nosync_flag_skips_the_meeting() {
        let chat = Arc::new(FakeChat::default());
        let calendar = Arc::new(FakeCalendar::default());
        let ctx = seeded_context(chat.clone(), calendar.clone()).await;

        let mut flags = FlagMap::default();
        flags.insert("NOSYNC".to_string(), FlagValue::Set);
        let command = preparation(
            vec![candidate("Иван Иванов", "https://cv.example/1")],
            flags,
        );
        handle(&ctx, &command).await.expect("handle");

        assert!(calendar.events.lock().unwrap().is_empty());
        // DM, summary and CV line still go out.
        assert_eq!(chat.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_comment_flag_lands_in_summary_and_event() {
        let chat = Arc::new(FakeChat::default());
        let calendar = Arc::new(FakeCalendar::default());
        let ctx = seeded_context(chat.clone(), calendar.clone()).await;

        let mut flags = FlagMap::default();
        flags.insert(
            "COMMENT".to_string(),
            FlagValue::Text("urgent, client waits".to_string()),
        );
        let command = preparation(
            vec![candidate("Иван Иванов", "https://cv.example/1")],
            flags,
        );
        handle(&ctx, &command).await.expect("handle");

        let texts = chat.texts();
        let summary = texts
            .iter()
            .find(|text| text.starts_with('*'))
            .expect("summary");
        assert!(summary.ends_with("\nurgent, client waits"));

        let events = calendar.events.lock().unwrap();
        assert_eq!(
            events[0].description.as_deref(),
            Some("urgent, client waits\nCV Ivan Ivanov https://cv.example/1")
        );
    }

    #[tokio::test]
    async fn test_unbound_developer_gets_no_dm() {
        let chat = Arc::new(FakeChat::default());
        let calendar = Arc::new(FakeCalendar::default());
        let ctx = test_context(chat.clone(), calendar.clone());
        {
            let store = ctx.store.lock().await;
            store
                .insert_developer("Иван", "Иванов", "Ivan", "Ivanov", "ivan@example.com")
                .expect("insert");
        }

        let command = preparation(
            vec![candidate("Иван Иванов", "https://cv.example/1")],
            FlagMap::default(),
        );
        handle(&ctx, &command).await.expect("handle");

        // Summary and CV line only, nothing to the developer.
        let sent = chat.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(space, _, _)| space == "STAFFSPACE"));
    }
}
