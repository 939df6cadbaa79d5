//! Time windows, booked intervals, and the minute arithmetic shared by the
//! generator and booking admission.
//!
//! All rounding helpers work on the instant (adding or subtracting a
//! `Duration`) rather than rebuilding local wall-clock fields, so they never
//! hit ambiguous or skipped local times around DST transitions.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SlotError};

/// An absolute time range. Used for availability windows and query ranges.
///
/// Both bounds are inclusive when a slot is tested against the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// A window with `start == end` never admits a slot.
    pub fn is_zero_length(&self) -> bool {
        self.start == self.end
    }

    /// Whether the slot `[slot_start, slot_end)` may be offered inside this window.
    ///
    /// The slot start must lie in `[start, end]`, the window must not be
    /// zero-length, and the whole slot must fit before `end`.
    pub fn admits(&self, slot_start: DateTime<Utc>, slot_end: DateTime<Utc>) -> bool {
        !self.is_zero_length()
            && self.start <= slot_start
            && slot_start <= self.end
            && slot_end <= self.end
    }
}

/// A span of time already taken by a non-canceled session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookedInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BookedInterval {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// Validate a slot length and return it in whole minutes.
///
/// Slot starts are aligned to minute multiples within each hour, so the
/// length must be a positive number of minutes that divides 60.
pub fn slot_minutes(slot: Duration) -> Result<i64> {
    let minutes = slot.num_minutes();
    if minutes <= 0 || Duration::minutes(minutes) != slot || 60 % minutes != 0 {
        return Err(SlotError::InvalidSlotDuration(minutes));
    }
    Ok(minutes)
}

/// Zero the second and sub-second components.
pub fn clean_seconds<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    dt.clone()
        - Duration::seconds(i64::from(dt.second()))
        - Duration::nanoseconds(i64::from(dt.nanosecond()))
}

/// Round up to the next `quantum`-minute boundary of the local hour.
///
/// Any second or sub-second remainder counts as a started minute, so
/// `10:30:15` rounds to `11:00` for a 30-minute quantum.
pub fn ceil_to_quantum<Tz: TimeZone>(dt: &DateTime<Tz>, quantum: i64) -> DateTime<Tz> {
    let mut rounded = clean_seconds(dt);
    if rounded < *dt {
        rounded += Duration::minutes(1);
    }
    let rem = i64::from(rounded.minute()) % quantum;
    if rem == 0 {
        rounded
    } else {
        rounded + Duration::minutes(quantum - rem)
    }
}

/// Round down to the previous `quantum`-minute boundary of the local hour.
pub fn floor_to_quantum<Tz: TimeZone>(dt: &DateTime<Tz>, quantum: i64) -> DateTime<Tz> {
    let cleaned = clean_seconds(dt);
    let rem = i64::from(cleaned.minute()) % quantum;
    cleaned - Duration::minutes(rem)
}

/// Keep the local date and hour, zero everything below.
pub fn floor_to_hour<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<Tz> {
    floor_to_quantum(dt, 60)
}
