use axum::{
    extract::{Extension, Path, State},
    routing::post,
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use transita_booking::engine::{resolve_seats, validate_seat_selection};
use transita_shared::events::SeatsLockedEvent;
use transita_store::{CatalogRepository, LedgerRepository};
use uuid::Uuid;

use crate::error::AppError;
use crate::middleware::auth::CustomerClaims;
use crate::seat_map::parse_journey_date;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct LockSeatsRequest {
    journey_date: String,
    seat_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
struct LockSeatsResponse {
    locked_seat_ids: Vec<Uuid>,
    expires_at: DateTime<Utc>,
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/schedules/{schedule_id}/locks", post(lock_seats))
}

async fn lock_seats(
    State(state): State<AppState>,
    Extension(claims): Extension<CustomerClaims>,
    Path(schedule_id): Path<Uuid>,
    Json(req): Json<LockSeatsRequest>,
) -> Result<Json<LockSeatsResponse>, AppError> {
    validate_seat_selection(&req.seat_ids)
        .map_err(|e| AppError::Validation(e.to_string()))?;
    let journey_date = parse_journey_date(&req.journey_date)?;

    let schedule = CatalogRepository::schedule(&state.db.pool, schedule_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("schedule {schedule_id}")))?;
    if !schedule.runs_on(journey_date) {
        return Err(AppError::Validation(format!(
            "schedule does not run on {journey_date}"
        )));
    }
    let seats = CatalogRepository::seats_for_bus(&state.db.pool, schedule.bus_id).await?;
    resolve_seats(&seats, &req.seat_ids).map_err(|e| AppError::Validation(e.to_string()))?;

    // All requested seats lock together or not at all.
    let mut tx = state.db.pool.begin().await?;
    let expires_at = LedgerRepository::lock_seats(
        &mut tx,
        schedule_id,
        journey_date,
        &req.seat_ids,
        &claims.sub,
        state.business_rules.seat_lock_seconds,
    )
    .await?;
    tx.commit().await?;

    let event = SeatsLockedEvent {
        schedule_id,
        journey_date,
        seat_ids: req.seat_ids.clone(),
        user_id: claims.sub.clone(),
        expires_at,
        locked_at: Utc::now().timestamp(),
    };
    if let Ok(payload) = serde_json::to_string(&event) {
        let _ = state
            .events
            .publish("seats.locked", &schedule_id.to_string(), &payload)
            .await;
    }

    info!(
        "Locked {} seat(s) on {}/{} for {}",
        req.seat_ids.len(),
        schedule_id,
        journey_date,
        claims.sub
    );

    Ok(Json(LockSeatsResponse {
        locked_seat_ids: req.seat_ids,
        expires_at,
    }))
}
