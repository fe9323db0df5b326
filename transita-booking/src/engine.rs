use crate::fare::compute_fare;
use crate::models::{
    Booking, BookingStatus, ContactInfo, Passenger, PassengerInput, PaymentStatus,
};
use crate::pnr::generate_pnr;
use crate::refund::{compute_refund, RefundOutcome};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use transita_catalog::{PointType, Schedule, Seat};
use transita_core::CoreError;
use transita_inventory::{LedgerError, LockGrant, SeatLedger};
use uuid::Uuid;

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("booking not found: {0}")]
    NotFound(Uuid),

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl From<BookingError> for CoreError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Ledger(inner) => inner.into(),
            BookingError::InvalidRequest(msg) => CoreError::InvalidRequest(msg),
            BookingError::NotFound(id) => CoreError::NotFound(format!("booking {id}")),
            BookingError::InvalidState(msg) => CoreError::InvalidState(msg),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateBookingRequest {
    pub schedule_id: Uuid,
    pub journey_date: NaiveDate,
    pub passengers: Vec<PassengerInput>,
    pub boarding_point_id: Uuid,
    pub dropping_point_id: Uuid,
    pub contact: ContactInfo,
    pub payment_reference: Option<String>,
    pub discount_amount_minor: i64,
}

/// Reject empty or duplicated seat selections before touching the ledger.
pub fn validate_seat_selection(seat_ids: &[Uuid]) -> Result<(), BookingError> {
    if seat_ids.is_empty() {
        return Err(BookingError::InvalidRequest(
            "at least one seat must be selected".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for seat_id in seat_ids {
        if !seen.insert(*seat_id) {
            return Err(BookingError::InvalidRequest(format!(
                "seat {seat_id} appears more than once"
            )));
        }
    }
    Ok(())
}

/// Every requested seat must exist on the schedule's bus. Returns the
/// resolved seats in request order.
pub fn resolve_seats<'a>(
    seats_on_bus: &'a [Seat],
    seat_ids: &[Uuid],
) -> Result<Vec<&'a Seat>, BookingError> {
    seat_ids
        .iter()
        .map(|seat_id| {
            seats_on_bus
                .iter()
                .find(|s| s.id == *seat_id)
                .ok_or_else(|| {
                    BookingError::InvalidRequest(format!(
                        "seat {seat_id} does not belong to this bus"
                    ))
                })
        })
        .collect()
}

/// Full request validation for a booking: passenger list shape, seat
/// membership, journey day, boarding/dropping point existence.
pub fn validate_booking_request<'a>(
    schedule: &Schedule,
    seats_on_bus: &'a [Seat],
    request: &CreateBookingRequest,
) -> Result<Vec<&'a Seat>, BookingError> {
    let seat_ids: Vec<Uuid> = request.passengers.iter().map(|p| p.seat_id).collect();
    validate_seat_selection(&seat_ids)?;

    if !schedule.runs_on(request.journey_date) {
        return Err(BookingError::InvalidRequest(format!(
            "schedule does not run on {}",
            request.journey_date
        )));
    }
    if !schedule.has_point(request.boarding_point_id, PointType::Boarding) {
        return Err(BookingError::InvalidRequest(
            "unknown boarding point".to_string(),
        ));
    }
    if !schedule.has_point(request.dropping_point_id, PointType::Dropping) {
        return Err(BookingError::InvalidRequest(
            "unknown dropping point".to_string(),
        ));
    }

    resolve_seats(seats_on_bus, &seat_ids)
}

/// In-memory booking engine over the seat ledger. Mirrors the persisted
/// pipeline operation for operation; the storage-backed path in the store
/// crate implements the same sequence inside one database transaction.
pub struct BookingEngine {
    ledger: Arc<SeatLedger>,
    lock_ttl: Duration,
    bookings: Mutex<HashMap<Uuid, (Booking, Vec<Passenger>)>>,
    issued_pnrs: Mutex<HashSet<String>>,
}

impl BookingEngine {
    pub fn new(ledger: Arc<SeatLedger>, lock_ttl: Duration) -> Self {
        Self {
            ledger,
            lock_ttl,
            bookings: Mutex::new(HashMap::new()),
            issued_pnrs: Mutex::new(HashSet::new()),
        }
    }

    pub fn ledger(&self) -> &SeatLedger {
        &self.ledger
    }

    /// Take a time-boxed hold on a set of seats.
    pub fn lock_seats(
        &self,
        schedule: &Schedule,
        seats_on_bus: &[Seat],
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<LockGrant, BookingError> {
        validate_seat_selection(seat_ids)?;
        if !schedule.runs_on(journey_date) {
            return Err(BookingError::InvalidRequest(format!(
                "schedule does not run on {journey_date}"
            )));
        }
        resolve_seats(seats_on_bus, seat_ids)?;

        Ok(self.ledger.lock_seats(
            schedule.id,
            journey_date,
            seat_ids,
            user_id,
            self.lock_ttl,
            now,
        )?)
    }

    /// Convert held (or still-available) seats into a confirmed booking.
    /// Availability is re-validated at commit time; a lock is a hint, not a
    /// guarantee.
    pub fn create_booking(
        &self,
        schedule: &Schedule,
        seats_on_bus: &[Seat],
        request: CreateBookingRequest,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Booking, BookingError> {
        let chosen = validate_booking_request(schedule, seats_on_bus, &request)?;
        let seat_ids: Vec<Uuid> = chosen.iter().map(|s| s.id).collect();

        let fare = compute_fare(schedule, &chosen, request.discount_amount_minor);
        let booking_id = Uuid::new_v4();
        let pnr = self.issue_pnr();

        self.ledger.book_seats(
            schedule.id,
            request.journey_date,
            &seat_ids,
            user_id,
            booking_id,
            now,
        )?;

        let passengers: Vec<Passenger> = request
            .passengers
            .iter()
            .map(|p| Passenger {
                id: Uuid::new_v4(),
                booking_id,
                seat_id: p.seat_id,
                full_name: p.full_name.clone(),
                age: p.age,
                gender: p.gender,
                id_document_type: p.id_document_type,
                id_document_number: p.id_document_number.clone(),
                seat_price_minor: fare.price_of(p.seat_id).unwrap_or(0),
            })
            .collect();

        let booking = Booking {
            id: booking_id,
            pnr,
            schedule_id: schedule.id,
            journey_date: request.journey_date,
            user_id: user_id.to_string(),
            status: BookingStatus::Confirmed,
            total_amount_minor: fare.total_amount_minor,
            discount_amount_minor: fare.discount_amount_minor,
            final_amount_minor: fare.final_amount_minor,
            payment_status: PaymentStatus::Paid,
            payment_reference: request.payment_reference,
            contact: request.contact,
            boarding_point_id: request.boarding_point_id,
            dropping_point_id: request.dropping_point_id,
            cancelled_at: None,
            refund_amount_minor: None,
            refund_status: None,
            created_at: now,
            updated_at: now,
        };

        let mut bookings = self.bookings.lock().expect("booking table poisoned");
        bookings.insert(booking_id, (booking.clone(), passengers));
        Ok(booking)
    }

    /// Cancel an owned booking: compute the refund tier from time to
    /// departure, mark the booking, release the seats.
    pub fn cancel_booking(
        &self,
        schedule: &Schedule,
        booking_id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<RefundOutcome, BookingError> {
        let mut bookings = self.bookings.lock().expect("booking table poisoned");
        let (booking, _) = bookings
            .get_mut(&booking_id)
            .filter(|(b, _)| b.user_id == user_id)
            .ok_or(BookingError::NotFound(booking_id))?;

        let departure = schedule.departure_instant(booking.journey_date);
        let outcome = compute_refund(booking.final_amount_minor, departure, now);
        booking
            .cancel(now, outcome.refund_amount_minor, outcome.refund_status)
            .map_err(BookingError::InvalidState)?;

        self.ledger.release_booking(booking_id);
        Ok(outcome)
    }

    pub fn booking(&self, booking_id: Uuid) -> Option<(Booking, Vec<Passenger>)> {
        let bookings = self.bookings.lock().expect("booking table poisoned");
        bookings.get(&booking_id).cloned()
    }

    fn issue_pnr(&self) -> String {
        let mut issued = self.issued_pnrs.lock().expect("pnr set poisoned");
        loop {
            let candidate = generate_pnr();
            if issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Gender, RefundStatus};
    use chrono::NaiveTime;
    use transita_catalog::seed::demo_fleet;
    use transita_inventory::SeatStatus;
    use transita_shared::Masked;

    struct Fixture {
        engine: BookingEngine,
        schedule: Schedule,
        seats: Vec<Seat>,
    }

    fn fixture() -> Fixture {
        let data = demo_fleet();
        let schedule = data.schedules[0].clone();
        let seats: Vec<Seat> = data
            .seats
            .iter()
            .filter(|s| s.bus_id == schedule.bus_id)
            .cloned()
            .collect();
        Fixture {
            engine: BookingEngine::new(Arc::new(SeatLedger::new()), Duration::seconds(300)),
            schedule,
            seats,
        }
    }

    fn passenger(seat_id: Uuid) -> PassengerInput {
        PassengerInput {
            seat_id,
            full_name: "Asha Rao".to_string(),
            age: 31,
            gender: Gender::Female,
            id_document_type: None,
            id_document_number: None,
        }
    }

    fn request(fx: &Fixture, seat_ids: &[Uuid], journey_date: NaiveDate) -> CreateBookingRequest {
        CreateBookingRequest {
            schedule_id: fx.schedule.id,
            journey_date,
            passengers: seat_ids.iter().map(|id| passenger(*id)).collect(),
            boarding_point_id: fx
                .schedule
                .points
                .iter()
                .find(|p| p.point_type == PointType::Boarding)
                .unwrap()
                .id,
            dropping_point_id: fx
                .schedule
                .points
                .iter()
                .find(|p| p.point_type == PointType::Dropping)
                .unwrap()
                .id,
            contact: ContactInfo {
                name: "Asha Rao".to_string(),
                email: Masked("asha@example.com".to_string()),
                phone: Masked("9876543210".to_string()),
            },
            payment_reference: Some("pay_ref_001".to_string()),
            discount_amount_minor: 0,
        }
    }

    /// Window seat on the demo schedule: base 500.00 + 50.00 premium.
    fn window_seat(fx: &Fixture) -> Seat {
        fx.seats
            .iter()
            .find(|s| s.seat_number == "L1A")
            .unwrap()
            .clone()
    }

    #[test]
    fn test_lock_book_cancel_scenario() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = date
            .and_time(NaiveTime::from_hms_opt(11, 30, 0).unwrap())
            .and_utc();

        // U1 locks the window seat.
        fx.engine
            .lock_seats(&fx.schedule, &fx.seats, date, &[seat.id], "u1", now)
            .unwrap();

        // U2 cannot lock it inside the hold window.
        let err = fx
            .engine
            .lock_seats(&fx.schedule, &fx.seats, date, &[seat.id], "u2", now)
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Ledger(LedgerError::Unavailable { .. })
        ));

        // U1 books it: snapshot 550.00, ledger flips to booked.
        let booking = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[seat.id], date), "u1", now)
            .unwrap();
        assert_eq!(booking.final_amount_minor, 55000);
        let (_, passengers) = fx.engine.booking(booking.id).unwrap();
        assert_eq!(passengers[0].seat_price_minor, 55000);
        assert_eq!(
            fx.engine.ledger().status_of(fx.schedule.id, seat.id, date, now),
            SeatStatus::Booked
        );

        // Departure is 21:30; cancelling at 11:30 is 10h out -> 25%.
        let outcome = fx
            .engine
            .cancel_booking(&fx.schedule, booking.id, "u1", now)
            .unwrap();
        assert_eq!(outcome.refund_percentage, 25);
        assert_eq!(outcome.refund_amount_minor, 13750);
        assert_eq!(outcome.refund_status, RefundStatus::Processed);
        assert_eq!(
            fx.engine.ledger().status_of(fx.schedule.id, seat.id, date, now),
            SeatStatus::Available
        );
    }

    #[test]
    fn test_commit_revalidates_despite_lock() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = Utc::now();

        // U1's lock expires before commit; U2 books in between.
        fx.engine
            .lock_seats(&fx.schedule, &fx.seats, date, &[seat.id], "u1", now)
            .unwrap();
        let after_expiry = now + Duration::seconds(301);
        fx.engine
            .create_booking(
                &fx.schedule,
                &fx.seats,
                request(&fx, &[seat.id], date),
                "u2",
                after_expiry,
            )
            .unwrap();

        let err = fx
            .engine
            .create_booking(
                &fx.schedule,
                &fx.seats,
                request(&fx, &[seat.id], date),
                "u1",
                after_expiry,
            )
            .unwrap_err();
        match err {
            BookingError::Ledger(LedgerError::Conflict { seats }) => {
                assert_eq!(seats, vec![seat.id])
            }
            other => panic!("expected Conflict, got {other:?}"),
        }
    }

    #[test]
    fn test_snapshot_price_survives_modifier_change() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = Utc::now();

        let booking = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[seat.id], date), "u1", now)
            .unwrap();

        // Reprice the catalog after the fact; the stored passenger keeps
        // the price it was sold at.
        let mut repriced = fx.seats.clone();
        repriced
            .iter_mut()
            .find(|s| s.id == seat.id)
            .unwrap()
            .price_modifier_minor = 9000;

        let (_, passengers) = fx.engine.booking(booking.id).unwrap();
        assert_eq!(passengers[0].seat_price_minor, 55000);
    }

    #[test]
    fn test_duplicate_seat_in_request_rejected() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();

        let err = fx
            .engine
            .create_booking(
                &fx.schedule,
                &fx.seats,
                request(&fx, &[seat.id, seat.id], date),
                "u1",
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[test]
    fn test_empty_passenger_list_rejected() {
        let fx = fixture();
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let err = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[], date), "u1", Utc::now())
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[test]
    fn test_foreign_seat_rejected() {
        let fx = fixture();
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let err = fx
            .engine
            .create_booking(
                &fx.schedule,
                &fx.seats,
                request(&fx, &[Uuid::new_v4()], date),
                "u1",
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidRequest(_)));
    }

    #[test]
    fn test_cancel_requires_ownership() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = Utc::now();

        let booking = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[seat.id], date), "u1", now)
            .unwrap();

        let err = fx
            .engine
            .cancel_booking(&fx.schedule, booking.id, "intruder", now)
            .unwrap_err();
        assert!(matches!(err, BookingError::NotFound(_)));
    }

    #[test]
    fn test_double_cancel_rejected() {
        let fx = fixture();
        let seat = window_seat(&fx);
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = Utc::now();

        let booking = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[seat.id], date), "u1", now)
            .unwrap();
        fx.engine
            .cancel_booking(&fx.schedule, booking.id, "u1", now)
            .unwrap();

        let err = fx
            .engine
            .cancel_booking(&fx.schedule, booking.id, "u1", now)
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidState(_)));
    }

    #[test]
    fn test_cancel_releases_both_seats_for_new_locks() {
        let fx = fixture();
        let date = NaiveDate::from_ymd_opt(2026, 8, 20).unwrap();
        let now = Utc::now();
        let a = fx.seats.iter().find(|s| s.seat_number == "L1A").unwrap().id;
        let b = fx.seats.iter().find(|s| s.seat_number == "L1B").unwrap().id;

        let booking = fx
            .engine
            .create_booking(&fx.schedule, &fx.seats, request(&fx, &[a, b], date), "u1", now)
            .unwrap();
        fx.engine
            .cancel_booking(&fx.schedule, booking.id, "u1", now)
            .unwrap();

        for seat in [a, b] {
            assert_eq!(
                fx.engine.ledger().status_of(fx.schedule.id, seat, date, now),
                SeatStatus::Available
            );
        }
        fx.engine
            .lock_seats(&fx.schedule, &fx.seats, date, &[a, b], "u2", now)
            .unwrap();
    }
}
