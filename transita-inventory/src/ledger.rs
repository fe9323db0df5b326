use crate::record::{SeatAvailabilityRecord, SeatState, SeatStatus};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Mutex;
use transita_core::CoreError;
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// At least one requested seat is booked, blocked or held by another
    /// user. No seat in the request was mutated.
    #[error("seats not available: {seats:?}")]
    Unavailable { seats: Vec<Uuid> },

    /// A seat changed state between lock validation and booking commit.
    /// No seat in the request was mutated.
    #[error("seats lost before commit: {seats:?}")]
    Conflict { seats: Vec<Uuid> },
}

impl From<LedgerError> for CoreError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Unavailable { seats } => CoreError::SeatUnavailable { seats },
            LedgerError::Conflict { seats } => CoreError::SeatConflict { seats },
        }
    }
}

/// A granted hold over a set of seats.
#[derive(Debug, Clone, Serialize)]
pub struct LockGrant {
    pub seat_ids: Vec<Uuid>,
    pub expires_at: DateTime<Utc>,
}

type RecordKey = (Uuid, Uuid, NaiveDate);

/// In-memory availability ledger. Single writer for seat state; every
/// mutation is all-or-nothing over the seats it touches, and every check
/// goes through `SeatAvailabilityRecord::effective_status`.
pub struct SeatLedger {
    records: Mutex<HashMap<RecordKey, SeatAvailabilityRecord>>,
}

impl SeatLedger {
    pub fn new() -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
        }
    }

    /// Grant `user_id` an exclusive hold on every seat in `seat_ids` until
    /// `now + ttl`. Re-locking a seat the user already holds extends the
    /// hold to a full fresh TTL. Fails whole if any seat is taken.
    pub fn lock_seats(
        &self,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> Result<LockGrant, LedgerError> {
        let mut records = self.records.lock().expect("seat ledger poisoned");

        let taken: Vec<Uuid> = seat_ids
            .iter()
            .copied()
            .filter(|seat_id| {
                records
                    .get(&(schedule_id, *seat_id, journey_date))
                    .map_or(false, |r| !r.is_claimable_by(user_id, now))
            })
            .collect();
        if !taken.is_empty() {
            return Err(LedgerError::Unavailable { seats: taken });
        }

        let expires_at = now + ttl;
        for seat_id in seat_ids {
            records.insert(
                (schedule_id, *seat_id, journey_date),
                SeatAvailabilityRecord::locked(
                    schedule_id,
                    *seat_id,
                    journey_date,
                    user_id,
                    expires_at,
                ),
            );
        }

        Ok(LockGrant {
            seat_ids: seat_ids.to_vec(),
            expires_at,
        })
    }

    /// Flip every seat in `seat_ids` to booked for `booking_id`. A seat
    /// qualifies when it is effectively available or held by `user_id`;
    /// anything else fails the whole request naming the lost seats.
    pub fn book_seats(
        &self,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        booking_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut records = self.records.lock().expect("seat ledger poisoned");

        let lost: Vec<Uuid> = seat_ids
            .iter()
            .copied()
            .filter(|seat_id| {
                records
                    .get(&(schedule_id, *seat_id, journey_date))
                    .map_or(false, |r| !r.is_claimable_by(user_id, now))
            })
            .collect();
        if !lost.is_empty() {
            return Err(LedgerError::Conflict { seats: lost });
        }

        for seat_id in seat_ids {
            records.insert(
                (schedule_id, *seat_id, journey_date),
                SeatAvailabilityRecord::booked(schedule_id, *seat_id, journey_date, booking_id),
            );
        }
        Ok(())
    }

    /// Operator-withheld seat. Only an effectively available seat can be
    /// blocked.
    pub fn block_seat(
        &self,
        schedule_id: Uuid,
        seat_id: Uuid,
        journey_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<(), LedgerError> {
        let mut records = self.records.lock().expect("seat ledger poisoned");
        let key = (schedule_id, seat_id, journey_date);
        if let Some(existing) = records.get(&key) {
            if existing.effective_status(now) != SeatStatus::Available {
                return Err(LedgerError::Unavailable {
                    seats: vec![seat_id],
                });
            }
        }
        records.insert(
            key,
            SeatAvailabilityRecord::blocked(schedule_id, seat_id, journey_date),
        );
        Ok(())
    }

    /// Delete every record bound to `booking_id`, making those seats
    /// immediately available again. Returns how many seats were released.
    pub fn release_booking(&self, booking_id: Uuid) -> usize {
        let mut records = self.records.lock().expect("seat ledger poisoned");
        let before = records.len();
        records.retain(|_, r| r.booking_id != Some(booking_id));
        before - records.len()
    }

    pub fn record(
        &self,
        schedule_id: Uuid,
        seat_id: Uuid,
        journey_date: NaiveDate,
    ) -> Option<SeatAvailabilityRecord> {
        let records = self.records.lock().expect("seat ledger poisoned");
        records.get(&(schedule_id, seat_id, journey_date)).cloned()
    }

    pub fn records_for(
        &self,
        schedule_id: Uuid,
        journey_date: NaiveDate,
    ) -> Vec<SeatAvailabilityRecord> {
        let records = self.records.lock().expect("seat ledger poisoned");
        records
            .values()
            .filter(|r| r.schedule_id == schedule_id && r.journey_date == journey_date)
            .cloned()
            .collect()
    }

    /// Status of one seat as a reader would see it right now.
    pub fn status_of(
        &self,
        schedule_id: Uuid,
        seat_id: Uuid,
        journey_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> SeatStatus {
        self.record(schedule_id, seat_id, journey_date)
            .map_or(SeatStatus::Available, |r| r.effective_status(now))
    }

    /// Hygiene only: drop lock records whose expiry has passed. Correctness
    /// never depends on this running; readers already treat them as
    /// available.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut records = self.records.lock().expect("seat ledger poisoned");
        let before = records.len();
        records.retain(|_, r| {
            !(r.state == SeatState::Locked && r.effective_status(now) == SeatStatus::Available)
        });
        before - records.len()
    }
}

impl Default for SeatLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const TTL: i64 = 300;

    fn ttl() -> Duration {
        Duration::seconds(TTL)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 20).unwrap()
    }

    #[test]
    fn test_lock_then_other_user_rejected() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        let grant = ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), now)
            .unwrap();
        assert_eq!(grant.expires_at, now + ttl());

        let err = ledger
            .lock_seats(schedule_id, date(), &[seat], "u2", ttl(), now)
            .unwrap_err();
        match err {
            LedgerError::Unavailable { seats } => assert_eq!(seats, vec![seat]),
            other => panic!("expected Unavailable, got {other:?}"),
        }
    }

    #[test]
    fn test_reentrant_lock_extends_hold() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), now)
            .unwrap();
        let later = now + Duration::seconds(120);
        let grant = ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), later)
            .unwrap();
        assert_eq!(grant.expires_at, later + ttl());
    }

    #[test]
    fn test_atomic_multi_seat_lock_leaves_others_untouched() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        ledger
            .book_seats(schedule_id, date(), &[c], "owner", Uuid::new_v4(), now)
            .unwrap();

        let err = ledger
            .lock_seats(schedule_id, date(), &[a, b, c], "u1", ttl(), now)
            .unwrap_err();
        match err {
            LedgerError::Unavailable { seats } => assert_eq!(seats, vec![c]),
            other => panic!("expected Unavailable, got {other:?}"),
        }

        // A and B must still be available: no partial lock.
        assert_eq!(
            ledger.status_of(schedule_id, a, date(), now),
            SeatStatus::Available
        );
        assert_eq!(
            ledger.status_of(schedule_id, b, date(), now),
            SeatStatus::Available
        );
    }

    #[test]
    fn test_expired_lock_is_available_without_sweep() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), now)
            .unwrap();

        // One second past expiry, with the row still physically present.
        let past_expiry = now + ttl() + Duration::seconds(1);
        assert_eq!(
            ledger.status_of(schedule_id, seat, date(), past_expiry),
            SeatStatus::Available
        );

        // And another user can take it over.
        ledger
            .lock_seats(schedule_id, date(), &[seat], "u2", ttl(), past_expiry)
            .unwrap();
        assert!(ledger
            .record(schedule_id, seat, date())
            .unwrap()
            .is_held_by("u2", past_expiry));
    }

    #[test]
    fn test_book_requires_own_live_lock() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), now)
            .unwrap();

        let err = ledger
            .book_seats(schedule_id, date(), &[seat], "u2", Uuid::new_v4(), now)
            .unwrap_err();
        match err {
            LedgerError::Conflict { seats } => assert_eq!(seats, vec![seat]),
            other => panic!("expected Conflict, got {other:?}"),
        }

        ledger
            .book_seats(schedule_id, date(), &[seat], "u1", Uuid::new_v4(), now)
            .unwrap();
        assert_eq!(
            ledger.status_of(schedule_id, seat, date(), now),
            SeatStatus::Booked
        );
    }

    #[test]
    fn test_book_unlocked_seat_is_allowed() {
        // A lock is a hint, not a prerequisite.
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        ledger
            .book_seats(schedule_id, date(), &[seat], "u1", Uuid::new_v4(), now)
            .unwrap();
        assert_eq!(
            ledger.status_of(schedule_id, seat, date(), now),
            SeatStatus::Booked
        );
    }

    #[test]
    fn test_release_booking_frees_seats() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let booking_id = Uuid::new_v4();
        let now = Utc::now();

        ledger
            .book_seats(schedule_id, date(), &[a, b], "u1", booking_id, now)
            .unwrap();
        assert_eq!(ledger.release_booking(booking_id), 2);

        for seat in [a, b] {
            assert_eq!(
                ledger.status_of(schedule_id, seat, date(), now),
                SeatStatus::Available
            );
        }
        // And a fresh lock succeeds immediately.
        ledger
            .lock_seats(schedule_id, date(), &[a], "u2", ttl(), now)
            .unwrap();
    }

    #[test]
    fn test_blocked_seat_rejects_lock_and_book() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        ledger.block_seat(schedule_id, seat, date(), now).unwrap();
        assert!(ledger
            .lock_seats(schedule_id, date(), &[seat], "u1", ttl(), now)
            .is_err());
        assert!(ledger
            .book_seats(schedule_id, date(), &[seat], "u1", Uuid::new_v4(), now)
            .is_err());
    }

    #[test]
    fn test_sweep_removes_only_expired_locks() {
        let ledger = SeatLedger::new();
        let schedule_id = Uuid::new_v4();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();

        ledger
            .lock_seats(schedule_id, date(), &[a], "u1", ttl(), now)
            .unwrap();
        ledger
            .book_seats(schedule_id, date(), &[b], "u2", Uuid::new_v4(), now)
            .unwrap();
        ledger.block_seat(schedule_id, c, date(), now).unwrap();

        let past_expiry = now + ttl() + Duration::seconds(1);
        assert_eq!(ledger.sweep_expired(past_expiry), 1);
        assert!(ledger.record(schedule_id, a, date()).is_none());
        assert!(ledger.record(schedule_id, b, date()).is_some());
        assert!(ledger.record(schedule_id, c, date()).is_some());
    }

    #[test]
    fn test_concurrent_lock_attempts_yield_one_winner() {
        let ledger = Arc::new(SeatLedger::new());
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    ledger
                        .lock_seats(
                            schedule_id,
                            date(),
                            &[seat],
                            &format!("user-{i}"),
                            ttl(),
                            now,
                        )
                        .is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(wins, 1);
    }

    #[test]
    fn test_concurrent_book_attempts_yield_one_booking() {
        let ledger = Arc::new(SeatLedger::new());
        let schedule_id = Uuid::new_v4();
        let seat = Uuid::new_v4();
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ledger = Arc::clone(&ledger);
                std::thread::spawn(move || {
                    let user = format!("user-{i}");
                    ledger
                        .lock_seats(schedule_id, date(), &[seat], &user, ttl(), now)
                        .and_then(|_| {
                            ledger.book_seats(
                                schedule_id,
                                date(),
                                &[seat],
                                &user,
                                Uuid::new_v4(),
                                now,
                            )
                        })
                        .is_ok()
                })
            })
            .collect();

        let wins = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|&ok| ok)
            .count();
        assert_eq!(wins, 1);
        assert_eq!(
            ledger.status_of(schedule_id, seat, date(), now),
            SeatStatus::Booked
        );
    }
}
