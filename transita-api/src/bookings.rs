use axum::{
    extract::{Extension, Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use transita_booking::engine::{validate_booking_request, CreateBookingRequest};
use transita_booking::fare::compute_fare;
use transita_booking::pnr::generate_pnr;
use transita_booking::refund::compute_refund;
use transita_booking::{
    Booking, BookingStatus, ContactInfo, Passenger, PassengerInput, PaymentStatus, RefundStatus,
};
use transita_shared::events::{BookingCancelledEvent, BookingConfirmedEvent};
use transita_shared::Masked;
use transita_store::{BookingRepository, CatalogRepository, LedgerRepository};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::seat_map::parse_journey_date;
use crate::state::AppState;

const PNR_ATTEMPTS: usize = 5;

#[derive(Debug, Deserialize)]
struct ContactPayload {
    name: String,
    email: String,
    phone: String,
}

#[derive(Debug, Deserialize)]
struct CreateBookingPayload {
    schedule_id: Uuid,
    journey_date: String,
    passengers: Vec<PassengerInput>,
    boarding_point_id: Uuid,
    dropping_point_id: Uuid,
    contact: ContactPayload,
    /// Reference of the already-authorized payment; trusted input from the
    /// payment collaborator, never verified here.
    payment_reference: Option<String>,
    #[serde(default)]
    discount_amount_minor: i64,
}

#[derive(Debug, Serialize)]
struct CreateBookingResponse {
    booking_id: Uuid,
    pnr: String,
    final_amount_minor: i64,
    status: BookingStatus,
}

#[derive(Debug, Serialize)]
struct CancelBookingResponse {
    refund_percentage: u8,
    refund_amount_minor: i64,
    refund_status: RefundStatus,
}

#[derive(Debug, Serialize)]
struct BookingDetailResponse {
    booking: Booking,
    passengers: Vec<Passenger>,
    route: RouteSummary,
}

#[derive(Debug, Serialize)]
struct RouteSummary {
    origin: String,
    destination: String,
    departure_time: String,
    journey_date: NaiveDate,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/bookings", post(create_booking).get(list_bookings))
        .route("/v1/bookings/{booking_id}", get(get_booking))
        .route("/v1/bookings/{booking_id}/cancel", post(cancel_booking))
}

async fn create_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<Json<CreateBookingResponse>, AppError> {
    if payload.passengers.is_empty() {
        return Err(AppError::Validation(
            "at least one passenger is required".to_string(),
        ));
    }
    let journey_date = parse_journey_date(&payload.journey_date)?;

    let schedule = CatalogRepository::schedule(&state.db.pool, payload.schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schedule {}", payload.schedule_id)))?;
    let seats = CatalogRepository::seats_for_bus(&state.db.pool, schedule.bus_id).await?;

    let request = CreateBookingRequest {
        schedule_id: payload.schedule_id,
        journey_date,
        passengers: payload.passengers,
        boarding_point_id: payload.boarding_point_id,
        dropping_point_id: payload.dropping_point_id,
        contact: ContactInfo {
            name: payload.contact.name,
            email: Masked(payload.contact.email),
            phone: Masked(payload.contact.phone),
        },
        payment_reference: payload.payment_reference,
        discount_amount_minor: payload.discount_amount_minor,
    };
    let chosen = validate_booking_request(&schedule, &seats, &request)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let seat_ids: Vec<Uuid> = chosen.iter().map(|s| s.id).collect();
    let fare = compute_fare(&schedule, &chosen, request.discount_amount_minor);

    let pnr = issue_pnr(&state).await?;
    let booking_id = Uuid::new_v4();
    let now = Utc::now();

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
        pnr: pnr.clone(),
        schedule_id: schedule.id,
        journey_date,
        user_id: claims.sub.clone(),
        status: BookingStatus::Confirmed,
        total_amount_minor: fare.total_amount_minor,
        discount_amount_minor: fare.discount_amount_minor,
        final_amount_minor: fare.final_amount_minor,
        payment_status: PaymentStatus::Paid,
        payment_reference: request.payment_reference.clone(),
        contact: request.contact.clone(),
        boarding_point_id: request.boarding_point_id,
        dropping_point_id: request.dropping_point_id,
        cancelled_at: None,
        refund_amount_minor: None,
        refund_status: None,
        created_at: now,
        updated_at: now,
    };

    // Seat flip and booking insert commit together or not at all. Seats are
    // re-validated under row locks inside book_seats; a hold taken earlier
    // is only a hint.
    let mut tx = state.db.pool.begin().await?;
    LedgerRepository::book_seats(
        &mut tx,
        schedule.id,
        journey_date,
        &seat_ids,
        &claims.sub,
        booking_id,
    )
    .await?;
    BookingRepository::insert(&mut tx, &booking, &passengers).await?;
    tx.commit().await?;

    let event = BookingConfirmedEvent {
        booking_id,
        pnr: pnr.clone(),
        schedule_id: schedule.id,
        journey_date,
        seat_count: seat_ids.len(),
        final_amount_minor: booking.final_amount_minor,
        confirmed_at: now.timestamp(),
    };
    if let Ok(event_payload) = serde_json::to_string(&event) {
        let _ = state
            .events
            .publish("booking.confirmed", &booking_id.to_string(), &event_payload)
            .await;
    }

    info!("Booking confirmed: {} ({})", booking_id, pnr);

    Ok(Json(CreateBookingResponse {
        booking_id,
        pnr,
        final_amount_minor: booking.final_amount_minor,
        status: booking.status,
    }))
}

async fn cancel_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<CancelBookingResponse>, AppError> {
    let mut tx = state.db.pool.begin().await?;

    // Ownership failures read as NotFound so booking ids stay undiscoverable.
    let booking = BookingRepository::fetch_for_update(&mut tx, booking_id)
        .await?
        .filter(|b| b.user_id == claims.sub)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
    if !booking.is_cancellable() {
        return Err(AppError::InvalidState(format!(
            "booking {} is already {}",
            booking.pnr, booking.status
        )));
    }

    let schedule = CatalogRepository::schedule(&state.db.pool, booking.schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schedule {}", booking.schedule_id)))?;

    let now = Utc::now();
    let departure = schedule.departure_instant(booking.journey_date);
    let outcome = compute_refund(booking.final_amount_minor, departure, now);
    let payment_status = if outcome.refund_amount_minor > 0 {
        PaymentStatus::Refunded
    } else {
        booking.payment_status
    };

    BookingRepository::mark_cancelled(
        &mut tx,
        booking_id,
        now,
        outcome.refund_amount_minor,
        outcome.refund_status,
        payment_status,
    )
    .await?;
    let released = LedgerRepository::release_booking(&mut tx, booking_id).await?;
    tx.commit().await?;

    let event = BookingCancelledEvent {
        booking_id,
        schedule_id: booking.schedule_id,
        journey_date: booking.journey_date,
        refund_percentage: outcome.refund_percentage,
        refund_amount_minor: outcome.refund_amount_minor,
        cancelled_at: now.timestamp(),
    };
    if let Ok(event_payload) = serde_json::to_string(&event) {
        let _ = state
            .events
            .publish("booking.cancelled", &booking_id.to_string(), &event_payload)
            .await;
    }

    info!(
        "Booking cancelled: {} ({} seats released, {}% refund)",
        booking_id, released, outcome.refund_percentage
    );

    Ok(Json(CancelBookingResponse {
        refund_percentage: outcome.refund_percentage,
        refund_amount_minor: outcome.refund_amount_minor,
        refund_status: outcome.refund_status,
    }))
}

async fn get_booking(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(booking_id): Path<Uuid>,
) -> Result<Json<BookingDetailResponse>, AppError> {
    let booking = BookingRepository::fetch(&state.db.pool, booking_id)
        .await?
        .filter(|b| b.user_id == claims.sub)
        .ok_or_else(|| AppError::NotFound(format!("booking {booking_id}")))?;
    let passengers = BookingRepository::passengers(&state.db.pool, booking_id).await?;
    let schedule = CatalogRepository::schedule(&state.db.pool, booking.schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schedule {}", booking.schedule_id)))?;

    let route = RouteSummary {
        origin: schedule.origin,
        destination: schedule.destination,
        departure_time: schedule.departure_time.to_string(),
        journey_date: booking.journey_date,
    };

    Ok(Json(BookingDetailResponse {
        booking,
        passengers,
        route,
    }))
}

async fn list_bookings(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = BookingRepository::list_for_user(&state.db.pool, &claims.sub).await?;
    Ok(Json(bookings))
}

/// Random booking reference with a uniqueness check; collisions retry a
/// bounded number of times. The UNIQUE constraint on the column backstops
/// the race between check and insert.
async fn issue_pnr(state: &AppState) -> Result<String, AppError> {
    for _ in 0..PNR_ATTEMPTS {
        let candidate = generate_pnr();
        if !BookingRepository::pnr_exists(&state.db.pool, &candidate).await? {
            return Ok(candidate);
        }
    }
    Err(AppError::Internal(anyhow::anyhow!(
        "could not allocate a unique booking reference"
    )))
}
