//! INTERVIEW: book a client interview for a known developer.
//!
//! The developer must already exist; an unknown name ends the command
//! in the error log with no reply and no side effects. The meeting
//! window opens 15 minutes before the requested time and runs one hour
//! past it, a free room from the roster is attached when one exists,
//! and every bound direct-message space gets told when to show up.

use chrono::{Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::command::InterviewCommand;
use crate::error::BotError;
use crate::gateways::{EventAttendee, EventRequest, ReplyTarget};
use crate::parser::ParseError;
use crate::scheduling::rooms::find_free_room;
use crate::scheduling::TimeSlot;

use super::{dedup_preserving_order, BotContext};

pub async fn handle(ctx: &BotContext, command: &InterviewCommand) -> Result<(), BotError> {
    let config = &ctx.config;

    let store = ctx.store.lock().await;
    let Some(developer) =
        store.find_developer_exact(&command.last_name, command.first_name.as_deref())?
    else {
        log::error!(
            "Developer {} is missing in the store, interview not scheduled",
            command.last_name
        );
        return Ok(());
    };
    let mentors = store.mentors_of(developer.id)?;
    drop(store);

    let start = parse_interview_start(&command.date_time, config.tz())?;
    let window = TimeSlot {
        start: start - Duration::minutes(15),
        end: start + Duration::hours(1),
    };

    let mut attendees: Vec<String> = vec![developer.email.clone()];
    attendees.extend(config.staff_emails.iter().cloned());
    attendees.extend(mentors.iter().map(|mentor| mentor.email.clone()));
    let attendees = dedup_preserving_order(attendees);

    let mut spaces: Vec<String> = Vec::new();
    for person in std::iter::once(&developer).chain(mentors.iter()) {
        if let Some(space) = person.space.as_deref().filter(|s| !s.is_empty()) {
            spaces.push(space.to_string());
        }
    }
    let spaces = dedup_preserving_order(spaces);

    let room = find_free_room(ctx.calendar.as_ref(), &config.rooms, &window).await?;
    let mut event_attendees: Vec<EventAttendee> = attendees
        .iter()
        .map(|email| EventAttendee::person(email))
        .collect();
    match &room {
        Some(room) => event_attendees.push(EventAttendee::room(&room.resource_email)),
        None => log::warn!("All rooms busy, scheduling without a room"),
    }

    let title = format!("{}. Support. {}", developer.last_name_en, command.client_name);
    let event = EventRequest::meet_event(
        title.clone(),
        &window,
        &config.timezone,
        event_attendees,
        None,
    );
    ctx.calendar.insert_event(&event).await?;

    let store = ctx.store.lock().await;
    store.insert_interview(
        &developer.last_name_ru,
        &command.client_name,
        &command.space_name,
    )?;
    drop(store);

    let notice = format!(
        "Interview scheduled: {} at {}",
        title,
        start.format("%d.%m %H:%M")
    );
    for space in &spaces {
        ctx.chat
            .create_message(space, &ReplyTarget::Space, &notice)
            .await?;
    }

    Ok(())
}

/// `"d.m H:M"` in the current year of the business timezone. Anything
/// that does not land on a real calendar time is an input error.
fn parse_interview_start(raw: &str, tz: Tz) -> Result<chrono::DateTime<Tz>, ParseError> {
    let invalid = || ParseError::InvalidDateTime(raw.to_string());

    let (date, time) = raw.split_once(' ').ok_or_else(invalid)?;
    let (day, month) = date.split_once('.').ok_or_else(invalid)?;
    let (hour, minute) = time.split_once(':').ok_or_else(invalid)?;

    let day: u32 = day.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    let hour: u32 = hour.parse().map_err(|_| invalid())?;
    let minute: u32 = minute.parse().map_err(|_| invalid())?;

    let year = Utc::now().with_timezone(&tz).year();
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .ok_or_else(invalid)?;

    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(invalid)
}
