use axum::{
    extract::{Extension, Path, Query, State},
    routing::get,
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use transita_catalog::{pricing::seat_price_minor, Deck, SeatPosition, SeatType};
use transita_inventory::{SeatAvailabilityRecord, SeatStatus};
use transita_store::{CatalogRepository, LedgerRepository};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct SeatMapQuery {
    date: String,
}

#[derive(Debug, Serialize)]
struct SeatMapEntry {
    seat_id: Uuid,
    seat_number: String,
    seat_type: SeatType,
    deck: Deck,
    row: i16,
    column: i16,
    position: SeatPosition,
    female_only: bool,
    price_minor: i64,
    status: SeatStatus,
    locked_by_me: bool,
}

#[derive(Debug, Serialize)]
struct SeatMapResponse {
    schedule_id: Uuid,
    journey_date: NaiveDate,
    seats: Vec<SeatMapEntry>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/schedules/{schedule_id}/seat-map", get(seat_map))
}

pub fn parse_journey_date(raw: &str) -> Result<NaiveDate, AppError> {
    raw.parse::<NaiveDate>()
        .map_err(|_| AppError::Validation(format!("invalid journey date: {raw}")))
}

async fn seat_map(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(schedule_id): Path<Uuid>,
    Query(query): Query<SeatMapQuery>,
) -> Result<Json<SeatMapResponse>, AppError> {
    let journey_date = parse_journey_date(&query.date)?;

    let schedule = CatalogRepository::schedule(&state.db.pool, schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id}")))?;
    if !schedule.runs_on(journey_date) {
        return Err(AppError::Validation(format!(
            "schedule does not run on {journey_date}"
        )));
    }

    let seats = CatalogRepository::seats_for_bus(&state.db.pool, schedule.bus_id).await?;
    let records = LedgerRepository::records_for(&state.db.pool, schedule_id, journey_date).await?;
    let by_seat: HashMap<Uuid, SeatAvailabilityRecord> =
        records.into_iter().map(|r| (r.seat_id, r)).collect();

    let now = Utc::now();
    let entries = seats
        .into_iter()
        .map(|seat| {
            let record = by_seat.get(&seat.id);
            let status = record.map_or(SeatStatus::Available, |r| r.effective_status(now));
            let locked_by_me = record.map_or(false, |r| r.is_held_by(&claims.sub, now));
            SeatMapEntry {
                seat_id: seat.id,
                seat_number: seat.seat_number.clone(),
                seat_type: seat.seat_type,
                deck: seat.deck,
                row: seat.row,
                column: seat.column,
                position: seat.position,
                female_only: seat.female_only,
                price_minor: seat_price_minor(schedule.base_price_minor, &seat),
                status,
                locked_by_me,
            }
        })
        .collect();

    Ok(Json(SeatMapResponse {
        schedule_id,
        journey_date,
        seats: entries,
    }))
}
