//! Room allocation over the configured roster.
//!
//! Rooms are plain calendar resources; a room is free for a slot when a
//! free/busy query restricted to exactly that slot comes back with zero
//! intervals. The roster order is the allocation order.

use crate::config::RoomConfig;
use crate::gateways::{CalendarGateway, GatewayError};

use super::TimeSlot;

/// First room in roster order that is free for the whole slot. All
/// rooms busy means `None`; the caller schedules without a room.
pub async fn find_free_room<'a>(
    calendar: &dyn CalendarGateway,
    rooms: &'a [RoomConfig],
    slot: &TimeSlot,
) -> Result<Option<&'a RoomConfig>, GatewayError> {
    for room in rooms {
        let ids = [room.resource_email.clone()];
        let busy = calendar.freebusy(&ids, slot).await?;
        let occupied = busy
            .get(&room.resource_email)
            .map(|intervals| !intervals.is_empty())
            .unwrap_or(false);

        if !occupied {
            return Ok(Some(room));
        }
        log::debug!("Room {} is busy, trying the next one", room.name);
    }

    Ok(None)
}
