//! JSON request shapes shared by the CLI and the WASM bindings.
//!
//! Datetimes are accepted as RFC 3339 strings (any offset) or as naive
//! `YYYY-MM-DDTHH:MM:SS` strings, which are read as UTC. Output slots are
//! serialized as RFC 3339 with the requester's offset.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::booking::{self, SessionRecord, SessionRequest};
use crate::error::{Result, SlotError};
use crate::slots::{compute_available_slots, DaySlotGroup, SlotQuery, DEFAULT_SLOT_MINUTES};
use crate::window::{BookedInterval, TimeWindow};

/// The timezone all rounding and day grouping happens in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceZone {
    /// An IANA zone such as `Europe/Berlin`.
    Named(Tz),
    /// The fixed offset carried by the query start.
    Fixed(FixedOffset),
}

impl SourceZone {
    /// Use the named zone when one is given, else the offset of `start`.
    ///
    /// # Errors
    /// Returns `SlotError::InvalidTimezone` if `name` is not a valid IANA identifier.
    pub fn resolve(name: Option<&str>, start: &DateTime<FixedOffset>) -> Result<Self> {
        match name {
            Some(name) => name
                .parse::<Tz>()
                .map(SourceZone::Named)
                .map_err(|_| SlotError::InvalidTimezone(name.to_string())),
            None => Ok(SourceZone::Fixed(*start.offset())),
        }
    }

    pub fn compute(&self, query: &SlotQuery) -> Result<Vec<DaySlotGroup>> {
        match self {
            SourceZone::Named(tz) => compute_available_slots(query, tz),
            SourceZone::Fixed(offset) => compute_available_slots(query, offset),
        }
    }

    pub fn admit(
        &self,
        request: &SessionRequest,
        sessions: &[SessionRecord],
        now: DateTime<Utc>,
        slot: Duration,
    ) -> Result<BookedInterval> {
        match self {
            SourceZone::Named(tz) => booking::admit_session(request, sessions, now, tz, slot),
            SourceZone::Fixed(offset) => {
                booking::admit_session(request, sessions, now, offset, slot)
            }
        }
    }
}

/// Parse an ISO 8601 datetime string, keeping its offset.
///
/// Naive strings without an offset are interpreted as UTC.
pub fn parse_datetime(s: &str) -> Result<DateTime<FixedOffset>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .map(|ndt| DateTime::<FixedOffset>::from(ndt.and_utc()))
        .map_err(|e| SlotError::InvalidDatetime(format!("'{}': {}", s, e)))
}

fn slot_duration(minutes: Option<i64>) -> Result<Duration> {
    let minutes = minutes.unwrap_or(DEFAULT_SLOT_MINUTES);
    Duration::try_minutes(minutes).ok_or(SlotError::InvalidSlotDuration(minutes))
}

fn parse_utc(s: &str) -> Result<DateTime<Utc>> {
    parse_datetime(s).map(|dt| dt.with_timezone(&Utc))
}

/// A `{start, end}` pair as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RangeInput {
    pub start: String,
    pub end: String,
}

impl RangeInput {
    fn parse(&self) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        Ok((parse_utc(&self.start)?, parse_utc(&self.end)?))
    }
}

/// A slot computation request.
///
/// `availability` absent or `null` means always available; an empty array
/// means never available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRequest {
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub now: Option<String>,
    #[serde(default)]
    pub slot_minutes: Option<i64>,
    #[serde(default)]
    pub availability: Option<Vec<RangeInput>>,
    #[serde(default)]
    pub booked: Vec<RangeInput>,
}

impl SlotRequest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build the engine query and resolve the source zone.
    ///
    /// `default_now` is used when the request carries no `now`.
    pub fn resolve(&self, default_now: DateTime<Utc>) -> Result<(SlotQuery, SourceZone)> {
        let start = parse_datetime(&self.start)?;
        let end = parse_utc(&self.end)?;
        let zone = SourceZone::resolve(self.timezone.as_deref(), &start)?;
        let now = match &self.now {
            Some(now) => parse_utc(now)?,
            None => default_now,
        };

        let availability = match &self.availability {
            Some(ranges) => Some(
                ranges
                    .iter()
                    .map(|r| r.parse().map(|(s, e)| TimeWindow::new(s, e)))
                    .collect::<Result<Vec<_>>>()?,
            ),
            None => None,
        };
        let booked = self
            .booked
            .iter()
            .map(|r| r.parse().map(|(s, e)| BookedInterval::new(s, e)))
            .collect::<Result<Vec<_>>>()?;

        let query = SlotQuery {
            start: start.with_timezone(&Utc),
            end,
            availability,
            booked,
            now,
            slot: slot_duration(self.slot_minutes)?,
        };
        Ok((query, zone))
    }

    pub fn compute(&self, default_now: DateTime<Utc>) -> Result<Vec<DaySlotGroup>> {
        let (query, zone) = self.resolve(default_now)?;
        zone.compute(&query)
    }
}

/// A booking admission request: the session to book and the target's
/// existing sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingCheck {
    pub request: SessionRequest,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slot_minutes: Option<i64>,
}

/// The outcome of an admitted booking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admission {
    pub admitted: BookedInterval,
}

impl BookingCheck {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn evaluate(&self, default_now: DateTime<Utc>) -> Result<Admission> {
        let zone = SourceZone::resolve(self.timezone.as_deref(), &self.request.start)?;
        let slot = slot_duration(self.slot_minutes)?;
        let admitted = zone.admit(
            &self.request,
            &self.sessions,
            self.now.unwrap_or(default_now),
            slot,
        )?;
        Ok(Admission { admitted })
    }
}

/// A cancellation request for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancellationCheck {
    pub session: SessionRecord,
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

impl CancellationCheck {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn evaluate(&self, default_now: DateTime<Utc>) -> Result<()> {
        booking::check_cancellation(&self.session, self.now.unwrap_or(default_now))
    }
}
