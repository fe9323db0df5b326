use crate::ParseError;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Materialized states of an availability record. `Available` is the absence
/// of a record and is never stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatState {
    Locked,
    Booked,
    Blocked,
}

/// Status of a seat as reported to callers, after lazy-expiry evaluation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    Available,
    Locked,
    Booked,
    Blocked,
}

/// One row of the availability ledger, keyed by
/// (schedule, seat, journey date). At most one record exists per key; it is
/// created lazily on first lock or booking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeatAvailabilityRecord {
    pub schedule_id: Uuid,
    pub seat_id: Uuid,
    pub journey_date: NaiveDate,
    pub state: SeatState,
    pub locked_by: Option<String>,
    pub locked_until: Option<DateTime<Utc>>,
    pub booking_id: Option<Uuid>,
}

impl SeatAvailabilityRecord {
    pub fn locked(
        schedule_id: Uuid,
        seat_id: Uuid,
        journey_date: NaiveDate,
        user_id: &str,
        locked_until: DateTime<Utc>,
    ) -> Self {
        Self {
            schedule_id,
            seat_id,
            journey_date,
            state: SeatState::Locked,
            locked_by: Some(user_id.to_string()),
            locked_until: Some(locked_until),
            booking_id: None,
        }
    }

    pub fn booked(
        schedule_id: Uuid,
        seat_id: Uuid,
        journey_date: NaiveDate,
        booking_id: Uuid,
    ) -> Self {
        Self {
            schedule_id,
            seat_id,
            journey_date,
            state: SeatState::Booked,
            locked_by: None,
            locked_until: None,
            booking_id: Some(booking_id),
        }
    }

    pub fn blocked(schedule_id: Uuid, seat_id: Uuid, journey_date: NaiveDate) -> Self {
        Self {
            schedule_id,
            seat_id,
            journey_date,
            state: SeatState::Blocked,
            locked_by: None,
            locked_until: None,
            booking_id: None,
        }
    }

    /// The one lazy-expiry rule. Every read and write path evaluates a
    /// record through here; a lock whose expiry has passed is available
    /// again even if no cleanup has physically removed the row.
    pub fn effective_status(&self, now: DateTime<Utc>) -> SeatStatus {
        match self.state {
            SeatState::Booked => SeatStatus::Booked,
            SeatState::Blocked => SeatStatus::Blocked,
            SeatState::Locked => match self.locked_until {
                Some(until) if now < until => SeatStatus::Locked,
                _ => SeatStatus::Available,
            },
        }
    }

    /// True when `user_id` holds a live lock on this seat.
    pub fn is_held_by(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == SeatStatus::Locked
            && self.locked_by.as_deref() == Some(user_id)
    }

    /// True when `user_id` may take or keep this seat: effectively available,
    /// or locked by that same user.
    pub fn is_claimable_by(&self, user_id: &str, now: DateTime<Utc>) -> bool {
        match self.effective_status(now) {
            SeatStatus::Available => true,
            SeatStatus::Locked => self.locked_by.as_deref() == Some(user_id),
            SeatStatus::Booked | SeatStatus::Blocked => false,
        }
    }
}

impl fmt::Display for SeatState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SeatState::Locked => "LOCKED",
            SeatState::Booked => "BOOKED",
            SeatState::Blocked => "BLOCKED",
        })
    }
}

impl FromStr for SeatState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LOCKED" => Ok(SeatState::Locked),
            "BOOKED" => Ok(SeatState::Booked),
            "BLOCKED" => Ok(SeatState::Blocked),
            other => Err(ParseError::new("seat state", other)),
        }
    }
}
