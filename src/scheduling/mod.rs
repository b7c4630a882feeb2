//! Common-free-slot search over busy-interval data.
//!
//! Pure functions: busy intervals in, a slot out (or nothing). All
//! arithmetic runs in the business timezone so work-hour bounds and
//! weekday checks line up with what attendees see in their calendars.
//! The room allocator lives in [`rooms`].

pub mod rooms;

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Days, Duration, NaiveDate, TimeZone, Timelike, Weekday};
use chrono_tz::Tz;

/// A candidate meeting window. Invariant: start < end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// One committed range from an attendee's or a room's calendar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusyInterval {
    pub start: DateTime<Tz>,
    pub end: DateTime<Tz>,
}

/// Busy intervals keyed by attendee or resource id, as returned by a
/// free/busy query.
pub type BusyCalendars = HashMap<String, Vec<BusyInterval>>;

/// Scan bounds for the free-slot search.
#[derive(Debug, Clone, Copy)]
pub struct SlotOptions {
    pub work_start_hour: u8,
    pub work_end_hour: u8,
    pub horizon_days: u32,
    pub granularity_minutes: u32,
}

impl Default for SlotOptions {
    fn default() -> Self {
        Self {
            work_start_hour: 8,
            work_end_hour: 17,
            horizon_days: 7,
            granularity_minutes: 15,
        }
    }
}

/// Round up to the nearest half hour: minutes below 30 go to :30 of the
/// same hour (so an exact :00 becomes :30), anything else to :00 of the
/// next hour. Seconds are dropped.
pub fn round_up_half_hour(t: DateTime<Tz>) -> DateTime<Tz> {
    let top_of_hour = t
        - Duration::minutes(t.minute() as i64)
        - Duration::seconds(t.second() as i64)
        - Duration::nanoseconds(t.nanosecond() as i64);

    if t.minute() < 30 {
        top_of_hour + Duration::minutes(30)
    } else {
        top_of_hour + Duration::hours(1)
    }
}

/// Half-open interval overlap: [slot.start, slot.end) against [b0, b1).
fn conflicts(slot_start: DateTime<Tz>, slot_end: DateTime<Tz>, busy: &BusyInterval) -> bool {
    slot_end > busy.start && slot_start < busy.end
}

fn local_hour(tz: Tz, day: NaiveDate, hour: u8) -> Option<DateTime<Tz>> {
    let naive = day.and_hms_opt(hour as u32, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}

/// First slot of `granularity_minutes` length inside work hours that no
/// attendee's busy interval overlaps, scanning day-ascending then
/// time-ascending over the horizon. Saturdays and Sundays are skipped.
///
/// Day 0 starts at "now" rounded up to the half hour when that still
/// precedes the day's work end; every later day starts at work start.
/// No free slot across the whole horizon means `None`: the caller must
/// treat that as "do not schedule", not as a failure.
pub fn find_common_free_slot(
    busy_by_attendee: &BusyCalendars,
    now: DateTime<Tz>,
    opts: &SlotOptions,
) -> Option<TimeSlot> {
    let tz = now.timezone();
    let rounded_now = round_up_half_hour(now);
    let granularity = Duration::minutes(opts.granularity_minutes as i64);

    for day_offset in 0..opts.horizon_days {
        let day = now.date_naive().checked_add_days(Days::new(day_offset as u64))?;
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }

        let Some(work_start) = local_hour(tz, day, opts.work_start_hour) else {
            continue;
        };
        let Some(work_end) = local_hour(tz, day, opts.work_end_hour) else {
            continue;
        };

        let mut slot_start = if day_offset == 0 && rounded_now < work_end {
            rounded_now
        } else {
            work_start
        };

        while slot_start < work_end {
            let slot_end = slot_start + granularity;

            if slot_end < rounded_now {
                slot_start = slot_end;
                continue;
            }

            let conflict = busy_by_attendee
                .values()
                .flatten()
                .any(|busy| conflicts(slot_start, slot_end, busy));

            if !conflict {
                return Some(TimeSlot {
                    start: slot_start,
                    end: slot_end,
                });
            }

            slot_start += granularity;
        }
    }

    None
}
