//! Session booking admission and cancellation rules.
//!
//! These checks run before a caller persists or cancels a session. They only
//! validate a snapshot: two concurrent requests for the same slot can both be
//! admitted, so the caller must still reserve the slot transactionally.

use chrono::{DateTime, Duration, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::conflict;
use crate::error::{Result, SlotError};
use crate::slots::{compute_available_slots, SlotQuery};
use crate::window::{clean_seconds, BookedInterval, TimeWindow};

/// Minimum notice, in minutes, required to cancel a pending session.
pub const CANCELLATION_CUTOFF_MINUTES: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    User,
    Creator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Pending,
    #[serde(rename = "Confirmed", alias = "CONFIRMED")]
    Confirmed,
    InProgress,
    Completed,
    Canceled,
    Missed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionKind {
    Call,
    #[default]
    Video,
}

/// An existing session of the booking target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[serde(default)]
    pub status: SessionStatus,
}

impl SessionRecord {
    /// Canceled sessions no longer occupy time.
    pub fn is_active(&self) -> bool {
        self.status != SessionStatus::Canceled
    }
}

/// One side of a session request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    pub role: UserRole,
    /// Only consulted for creators; everyone else is bookable at any time.
    #[serde(default)]
    pub working_hours: Option<Vec<TimeWindow>>,
}

/// A request to book a session with `target`.
///
/// `start` keeps the requester's UTC offset; it determines the timezone used
/// for rounding and day grouping when no named zone is supplied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRequest {
    pub requester: Participant,
    pub target: Participant,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    #[serde(default)]
    pub kind: SessionKind,
}

/// The non-canceled sessions of `sessions`, as booked intervals.
pub fn booked_intervals(sessions: &[SessionRecord]) -> Vec<BookedInterval> {
    sessions
        .iter()
        .filter(|s| s.is_active())
        .map(|s| BookedInterval::new(s.start, s.end))
        .collect()
}

/// Check whether `request` can be booked against the target's `sessions`.
///
/// The requested range (seconds dropped) must not overlap any active session
/// of the target, and every slot step from start to end must be offered by
/// [`compute_available_slots`] in `tz`.
///
/// # Errors
/// - `SlotError::SelfBooking` if requester and target are the same user.
/// - `SlotError::RoleMismatch` if both sides have the same role.
/// - `SlotError::InvalidRange` if the cleaned start is not before the end.
/// - `SlotError::SessionConflict` if an active session overlaps the range.
/// - `SlotError::TargetUnavailable` if any slot of the range is not offered.
pub fn admit_session<Tz>(
    request: &SessionRequest,
    sessions: &[SessionRecord],
    now: DateTime<Utc>,
    tz: &Tz,
    slot: Duration,
) -> Result<BookedInterval>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    if request.requester.id == request.target.id {
        return Err(SlotError::SelfBooking);
    }
    if request.requester.role == request.target.role {
        return Err(SlotError::RoleMismatch);
    }

    let start = clean_seconds(&request.start).with_timezone(&Utc);
    let end = clean_seconds(&request.end).with_timezone(&Utc);
    if start >= end {
        return Err(SlotError::InvalidRange { start, end });
    }

    let booked = booked_intervals(sessions);
    let conflicts = conflict::find_conflicts(&booked, start, end);
    if let Some(first) = conflicts.first() {
        debug!(
            target_id = %request.target.id,
            conflicts = conflicts.len(),
            overlap_minutes = first.overlap_minutes,
            "requested range overlaps existing sessions"
        );
        return Err(SlotError::SessionConflict);
    }

    let availability = match request.target.role {
        UserRole::Creator => request.target.working_hours.clone(),
        UserRole::Admin | UserRole::User => None,
    };
    let query = SlotQuery {
        start,
        end,
        availability,
        booked,
        now,
        slot,
    };
    let offered: Vec<DateTime<Utc>> = compute_available_slots(&query, tz)?
        .iter()
        .flat_map(|group| group.hours.iter())
        .map(|s| s.start.with_timezone(&Utc))
        .collect();

    let mut step = start;
    while step < end {
        if !offered.contains(&step) {
            debug!(target_id = %request.target.id, missing = %step, "slot not offered");
            return Err(SlotError::TargetUnavailable);
        }
        step += slot;
    }

    Ok(BookedInterval::new(start, end))
}

/// Check whether `session` may still be canceled at `now`.
///
/// # Errors
/// - `SlotError::InvalidStatus` unless the session is pending.
/// - `SlotError::CancellationWindowClosed` when less than
///   [`CANCELLATION_CUTOFF_MINUTES`] remain before the start.
pub fn check_cancellation(session: &SessionRecord, now: DateTime<Utc>) -> Result<()> {
    if session.status != SessionStatus::Pending {
        return Err(SlotError::InvalidStatus(session.status));
    }
    if (session.start - now).num_minutes() < CANCELLATION_CUTOFF_MINUTES {
        return Err(SlotError::CancellationWindowClosed);
    }
    Ok(())
}
