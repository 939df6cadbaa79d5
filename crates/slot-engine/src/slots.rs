//! Bookable slot generation.
//!
//! Walks fixed-length steps across a query range in the requester's
//! timezone, keeps the steps that fall inside the target's availability
//! windows and clear of existing bookings, and groups the survivors by local
//! calendar day.
//!
//! The walk is a small state machine:
//!
//! - `Scanning` tests one candidate slot and decides the next phase.
//! - `DayFlush` emits the finished day's group when the cursor crosses local
//!   midnight.
//! - `WindowAdvance` moves to the next availability window that has not
//!   already ended, repositioning the cursor at that window's start hour.
//! - `Done` emits whatever is still pending and stops.
//!
//! The cursor only ever moves forward, so every day is emitted at most once.
//! Results are advisory: nothing is reserved, and two callers can both be
//! offered the same slot.

use std::mem;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::conflict;
use crate::error::{Result, SlotError};
use crate::window::{self, BookedInterval, TimeWindow};

/// Default meeting length in minutes.
pub const DEFAULT_SLOT_MINUTES: i64 = 30;

/// A single bookable slot, expressed with the requester's UTC offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl Slot {
    fn from_local<Tz: TimeZone>(start: &DateTime<Tz>, end: &DateTime<Tz>) -> Self {
        Self {
            start: with_offset(start),
            end: with_offset(end),
        }
    }
}

/// All bookable slots of one local calendar day, in chronological order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaySlotGroup {
    /// Start of the first slot of the day.
    pub date: DateTime<FixedOffset>,
    pub hours: Vec<Slot>,
}

impl DaySlotGroup {
    /// The local calendar day this group belongs to.
    pub fn day(&self) -> NaiveDate {
        self.date.date_naive()
    }
}

/// Inputs for one slot computation.
#[derive(Debug, Clone, PartialEq)]
pub struct SlotQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// `None` means always available; `Some(vec![])` means never available.
    /// Windows may be given in any order; they are scanned by start time.
    pub availability: Option<Vec<TimeWindow>>,
    pub booked: Vec<BookedInterval>,
    pub now: DateTime<Utc>,
    pub slot: Duration,
}

impl SlotQuery {
    /// A fully-available query with no bookings and the default slot length.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            availability: None,
            booked: Vec::new(),
            now,
            slot: Duration::minutes(DEFAULT_SLOT_MINUTES),
        }
    }

    pub fn with_availability(mut self, windows: Vec<TimeWindow>) -> Self {
        self.availability = Some(windows);
        self
    }

    pub fn with_booked(mut self, booked: Vec<BookedInterval>) -> Self {
        self.booked = booked;
        self
    }

    pub fn with_slot_minutes(mut self, minutes: i64) -> Self {
        self.slot = Duration::minutes(minutes);
        self
    }
}

enum Phase<Tz: TimeZone> {
    Scanning,
    DayFlush { next: DateTime<Tz> },
    WindowAdvance { next: DateTime<Tz> },
    Done,
}

/// Lazily yields one [`DaySlotGroup`] per local day with availability.
pub struct SlotGenerator<'a, Tz: TimeZone> {
    query: &'a SlotQuery,
    quantum: i64,
    upper: DateTime<Tz>,
    cursor: DateTime<Tz>,
    /// `query.availability` sorted by start.
    windows: Option<Vec<TimeWindow>>,
    /// Index into `windows`; `None` in always-available mode.
    window: Option<usize>,
    pending: Vec<Slot>,
    phase: Phase<Tz>,
}

impl<'a, Tz> SlotGenerator<'a, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    /// Validate the query and position the cursor at the first candidate.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidRange` if `query.start >= query.end`.
    /// Returns `SlotError::InvalidSlotDuration` if the slot length does not
    /// divide an hour into whole minutes.
    pub fn new(query: &'a SlotQuery, tz: &Tz) -> Result<Self> {
        if query.start >= query.end {
            return Err(SlotError::InvalidRange {
                start: query.start,
                end: query.end,
            });
        }
        let quantum = window::slot_minutes(query.slot)?;

        let lower = window::ceil_to_quantum(&query.start.max(query.now).with_timezone(tz), quantum);
        let upper = window::floor_to_quantum(&(query.end - query.slot).with_timezone(tz), quantum);

        let windows = query.availability.clone().map(|mut windows| {
            windows.sort_by_key(|w| w.start);
            windows
        });

        let (cursor, window, phase) = match windows.as_deref() {
            None => (lower, None, Phase::Scanning),
            Some(windows) => match next_open_window(windows, 0, query.now) {
                Some(i) => {
                    let start = window::floor_to_hour(&windows[i].start.with_timezone(tz));
                    (start.max(lower), Some(i), Phase::Scanning)
                }
                None => {
                    debug!(windows = windows.len(), "no open availability window");
                    (lower, None, Phase::Done)
                }
            },
        };

        Ok(Self {
            query,
            quantum,
            upper,
            cursor,
            windows,
            window,
            pending: Vec::new(),
            phase,
        })
    }

    fn step(&mut self) -> Option<DaySlotGroup> {
        match mem::replace(&mut self.phase, Phase::Done) {
            Phase::Scanning => {
                self.scan();
                None
            }
            Phase::DayFlush { next } => {
                let group = self.flush();
                self.phase = if self.window_exhausted_at(next) {
                    Phase::WindowAdvance { next }
                } else {
                    self.cursor = next;
                    Phase::Scanning
                };
                group
            }
            Phase::WindowAdvance { next } => {
                self.advance_window(next);
                None
            }
            Phase::Done => self.flush(),
        }
    }

    fn scan(&mut self) {
        let start = self.cursor;
        if start > self.upper {
            // Phase is already `Done`.
            return;
        }
        let end = start + self.query.slot;

        if self.is_available(&start, &end) {
            if conflict::is_conflict_free(&self.query.booked, &start, &end) {
                self.pending.push(Slot::from_local(&start, &end));
            } else {
                trace!(start = %with_offset(&start), "slot overlaps a booking");
            }
        }

        let mut next = end;
        if next.offset().fix() != start.offset().fix() {
            // An offset change that is not a whole quantum leaves `next` off the grid.
            next = window::ceil_to_quantum(&next, self.quantum);
        }
        self.phase = if next.date_naive() != start.date_naive() {
            Phase::DayFlush { next }
        } else if self.window_exhausted_at(next) {
            Phase::WindowAdvance { next }
        } else {
            self.cursor = next;
            Phase::Scanning
        };
    }

    fn is_available(&self, start: &DateTime<Tz>, end: &DateTime<Tz>) -> bool {
        match self.current_window() {
            None => true,
            Some(w) => w.admits(start.with_timezone(&Utc), end.with_timezone(&Utc)),
        }
    }

    /// True when no further slot can start at `next` inside the current window.
    fn window_exhausted_at(&self, next: DateTime<Tz>) -> bool {
        match self.current_window() {
            None => false,
            Some(w) => (next + self.query.slot).with_timezone(&Utc) > w.end,
        }
    }

    fn advance_window(&mut self, next: DateTime<Tz>) {
        let (Some(windows), Some(current)) = (self.windows.as_deref(), self.window)
        else {
            self.cursor = next;
            self.phase = Phase::Scanning;
            return;
        };

        let Some(i) = next_open_window(windows, current + 1, self.query.now) else {
            debug!(window = current, "availability windows exhausted");
            return;
        };

        let tz = next.timezone();
        let target = window::floor_to_hour(&windows[i].start.with_timezone(&tz)).max(next);
        if target.date_naive() != self.cursor.date_naive() && !self.pending.is_empty() {
            // Emit the current day before jumping into a later one.
            self.phase = Phase::DayFlush { next: target };
        } else {
            self.window = Some(i);
            self.cursor = target;
            self.phase = Phase::Scanning;
        }
    }

    fn current_window(&self) -> Option<&TimeWindow> {
        let windows = self.windows.as_deref()?;
        windows.get(self.window?)
    }

    fn flush(&mut self) -> Option<DaySlotGroup> {
        if self.pending.is_empty() {
            return None;
        }
        let hours = mem::take(&mut self.pending);
        let date = hours[0].start;
        debug!(day = %date.date_naive(), slots = hours.len(), "day group ready");
        Some(DaySlotGroup { date, hours })
    }
}

impl<Tz> Iterator for SlotGenerator<'_, Tz>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    type Item = DaySlotGroup;

    fn next(&mut self) -> Option<DaySlotGroup> {
        loop {
            if matches!(self.phase, Phase::Done) && self.pending.is_empty() {
                return None;
            }
            if let Some(group) = self.step() {
                return Some(group);
            }
        }
    }
}

/// Compute the bookable slots of `query`, grouped by calendar day in `tz`.
///
/// # Arguments
///
/// * `query`: Range, availability windows, bookings, clock, and slot length.
/// * `tz`: The requester's timezone. Rounding, day grouping, and the
///   same-day booking filter all use it.
///
/// # Errors
/// Returns `SlotError::InvalidRange` if `query.start >= query.end`.
/// Returns `SlotError::InvalidSlotDuration` if the slot length is not a whole
/// number of minutes dividing 60.
pub fn compute_available_slots<Tz>(query: &SlotQuery, tz: &Tz) -> Result<Vec<DaySlotGroup>>
where
    Tz: TimeZone,
    Tz::Offset: Copy,
{
    let groups: Vec<DaySlotGroup> = SlotGenerator::new(query, tz)?.collect();
    debug!(
        days = groups.len(),
        slots = groups.iter().map(|g| g.hours.len()).sum::<usize>(),
        booked = query.booked.len(),
        "computed available slots"
    );
    Ok(groups)
}

fn next_open_window(windows: &[TimeWindow], from: usize, now: DateTime<Utc>) -> Option<usize> {
    (from..windows.len()).find(|&i| windows[i].end >= now)
}

fn with_offset<Tz: TimeZone>(dt: &DateTime<Tz>) -> DateTime<FixedOffset> {
    dt.with_timezone(&dt.offset().fix())
}
