//! Error types for slot-engine operations.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::booking::SessionStatus;

#[derive(Error, Debug)]
pub enum SlotError {
    #[error("Invalid range: start {start} must be before end {end}")]
    InvalidRange {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    /// Slot lengths must be a whole number of minutes dividing an hour.
    #[error("Invalid slot duration: {0} minutes")]
    InvalidSlotDuration(i64),

    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid datetime: {0}")]
    InvalidDatetime(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("You can not make appointment to yourself")]
    SelfBooking,

    #[error("Target type is wrong")]
    RoleMismatch,

    #[error("Target already has a session in the requested range")]
    SessionConflict,

    #[error("Target does not have available time slots")]
    TargetUnavailable,

    #[error("Session is not in valid status: {0:?}")]
    InvalidStatus(SessionStatus),

    #[error("You cannot cancel 1 minute before the meeting")]
    CancellationWindowClosed,
}

pub type Result<T> = std::result::Result<T, SlotError>;
