//! # slot-engine
//!
//! Timezone-aware bookable slot computation for scheduled sessions.
//!
//! Given a target's availability windows, its existing bookings, and a
//! requested range, the engine produces the fixed-length slots that can still
//! be booked, grouped by calendar day in the requester's timezone. Timezone
//! handling is delegated to `chrono` and `chrono-tz`.
//!
//! ## Quick start
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use slot_engine::{compute_available_slots, SlotQuery, TimeWindow};
//!
//! let day = |h| Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap();
//! let query = SlotQuery::new(day(0), day(0) + chrono::Duration::days(1), day(0))
//!     .with_availability(vec![TimeWindow::new(day(9), day(17))]);
//!
//! let groups = compute_available_slots(&query, &Utc).unwrap();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].hours.len(), 16);
//! ```
//!
//! ## Modules
//!
//! - [`slots`]: Slot generator and day grouping
//! - [`window`]: Availability windows, booked intervals, minute rounding
//! - [`conflict`]: Overlap checks against booked intervals
//! - [`booking`]: Session admission and cancellation rules
//! - [`request`]: JSON request shapes and timezone resolution
//! - [`error`]: Error types

pub mod booking;
pub mod conflict;
pub mod error;
pub mod request;
pub mod slots;
pub mod window;

pub use booking::{admit_session, check_cancellation};
pub use conflict::find_conflicts;
pub use error::SlotError;
pub use request::{BookingCheck, CancellationCheck, SlotRequest, SourceZone};
pub use slots::{compute_available_slots, DaySlotGroup, Slot, SlotGenerator, SlotQuery};
pub use window::{BookedInterval, TimeWindow};
