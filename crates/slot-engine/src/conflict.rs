//! Detect overlaps between candidate slots and booked intervals.
//!
//! Overlap is half-open: an interval ending exactly when a slot starts (or
//! starting exactly when it ends) is NOT a conflict.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use crate::window::BookedInterval;

/// A booked interval that overlaps a requested range.
#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub interval: BookedInterval,
    pub overlap_minutes: i64,
}

/// Whether `interval` overlaps `[start, end)`.
pub fn overlaps(interval: &BookedInterval, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    !(interval.start >= end || interval.end <= start)
}

/// Whether `interval` touches the calendar day `day` in `tz`.
///
/// An interval crossing local midnight is relevant to both days it spans.
pub fn is_on_day<Tz: TimeZone>(interval: &BookedInterval, day: NaiveDate, tz: &Tz) -> bool {
    let first = interval.start.with_timezone(tz).date_naive();
    let last = interval.end.with_timezone(tz).date_naive();
    first <= day && day <= last
}

/// Whether the slot `[start, end)` avoids every booked interval on its day.
///
/// Only intervals on the slot's calendar day, in the slot's own timezone,
/// are considered.
pub fn is_conflict_free<Tz: TimeZone>(
    booked: &[BookedInterval],
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> bool {
    let tz = start.timezone();
    let day = start.date_naive();
    let (start, end) = (start.with_timezone(&Utc), end.with_timezone(&Utc));

    booked
        .iter()
        .filter(|interval| is_on_day(interval, day, &tz))
        .all(|interval| !overlaps(interval, start, end))
}

/// Find every booked interval overlapping `[start, end)`.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(
    booked: &[BookedInterval],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<Conflict> {
    booked
        .iter()
        .filter(|interval| overlaps(interval, start, end))
        .map(|interval| {
            let overlap_start = interval.start.max(start);
            let overlap_end = interval.end.min(end);
            Conflict {
                interval: *interval,
                overlap_minutes: (overlap_end - overlap_start).num_minutes(),
            }
        })
        .collect()
}
