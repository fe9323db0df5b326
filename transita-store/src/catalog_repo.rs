use chrono::NaiveTime;
use sqlx::PgPool;
use tracing::info;
use transita_catalog::seed::SeedData;
use transita_catalog::{Deck, PointType, Schedule, SchedulePoint, Seat, SeatPosition, SeatType};
use transita_core::{CoreError, CoreResult};
use uuid::Uuid;

/// Read-mostly access to the reference tables: buses, seats, schedules and
/// their boarding/dropping points.
pub struct CatalogRepository;

#[derive(sqlx::FromRow)]
struct ScheduleRow {
    id: Uuid,
    bus_id: Uuid,
    origin: String,
    destination: String,
    departure_time: NaiveTime,
    arrival_time: NaiveTime,
    days_of_week: Vec<i16>,
    base_price_minor: i64,
}

#[derive(sqlx::FromRow)]
struct SchedulePointRow {
    id: Uuid,
    schedule_id: Uuid,
    name: String,
    point_type: String,
    point_time: NaiveTime,
}

#[derive(sqlx::FromRow)]
struct SeatRow {
    id: Uuid,
    bus_id: Uuid,
    seat_number: String,
    seat_type: String,
    deck: String,
    seat_row: i16,
    seat_column: i16,
    seat_position: String,
    price_modifier_minor: i64,
    female_only: bool,
}

impl SeatRow {
    fn into_seat(self) -> CoreResult<Seat> {
        Ok(Seat {
            id: self.id,
            bus_id: self.bus_id,
            seat_number: self.seat_number,
            seat_type: self.seat_type.parse::<SeatType>()?,
            deck: self.deck.parse::<Deck>()?,
            row: self.seat_row,
            column: self.seat_column,
            position: self.seat_position.parse::<SeatPosition>()?,
            price_modifier_minor: self.price_modifier_minor,
            female_only: self.female_only,
        })
    }
}

impl CatalogRepository {
    pub async fn schedule(pool: &PgPool, schedule_id: Uuid) -> CoreResult<Option<Schedule>> {
        let row = sqlx::query_as::<_, ScheduleRow>(
            r#"
            SELECT id, bus_id, origin, destination, departure_time, arrival_time,
                   days_of_week, base_price_minor
            FROM schedules
            WHERE id = $1
            "#,
        )
        .bind(schedule_id)
        .fetch_optional(pool)
        .await
        .map_err(CoreError::storage)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let point_rows = sqlx::query_as::<_, SchedulePointRow>(
            r#"
            SELECT id, schedule_id, name, point_type, point_time
            FROM schedule_points
            WHERE schedule_id = $1
            ORDER BY point_time
            "#,
        )
        .bind(schedule_id)
        .fetch_all(pool)
        .await
        .map_err(CoreError::storage)?;

        let points = point_rows
            .into_iter()
            .map(|p| {
                Ok(SchedulePoint {
                    id: p.id,
                    schedule_id: p.schedule_id,
                    name: p.name,
                    point_type: p.point_type.parse::<PointType>()?,
                    point_time: p.point_time,
                })
            })
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Some(Schedule {
            id: row.id,
            bus_id: row.bus_id,
            origin: row.origin,
            destination: row.destination,
            departure_time: row.departure_time,
            arrival_time: row.arrival_time,
            days_of_week: row.days_of_week,
            base_price_minor: row.base_price_minor,
            points,
        }))
    }

    pub async fn seats_for_bus(pool: &PgPool, bus_id: Uuid) -> CoreResult<Vec<Seat>> {
        let rows = sqlx::query_as::<_, SeatRow>(
            r#"
            SELECT id, bus_id, seat_number, seat_type, deck, seat_row, seat_column,
                   seat_position, price_modifier_minor, female_only
            FROM seats
            WHERE bus_id = $1
            ORDER BY deck, seat_row, seat_column
            "#,
        )
        .bind(bus_id)
        .fetch_all(pool)
        .await
        .map_err(CoreError::storage)?;
        rows.into_iter().map(SeatRow::into_seat).collect()
    }

    pub async fn is_empty(pool: &PgPool) -> CoreResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM schedules")
            .fetch_one(pool)
            .await
            .map_err(CoreError::storage)?;
        Ok(count == 0)
    }

    /// Load the demo fleet into an empty catalog.
    pub async fn seed(pool: &PgPool, data: &SeedData) -> CoreResult<()> {
        let mut tx = pool.begin().await.map_err(CoreError::storage)?;

        for bus in &data.buses {
            sqlx::query(
                r#"
                INSERT INTO buses (id, operator_name, registration_number, layout_name)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(bus.id)
            .bind(&bus.operator_name)
            .bind(&bus.registration_number)
            .bind(&bus.layout_name)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        }

        for seat in &data.seats {
            sqlx::query(
                r#"
                INSERT INTO seats
                    (id, bus_id, seat_number, seat_type, deck, seat_row, seat_column,
                     seat_position, price_modifier_minor, female_only)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(seat.id)
            .bind(seat.bus_id)
            .bind(&seat.seat_number)
            .bind(seat.seat_type.to_string())
            .bind(seat.deck.to_string())
            .bind(seat.row)
            .bind(seat.column)
            .bind(seat.position.to_string())
            .bind(seat.price_modifier_minor)
            .bind(seat.female_only)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::storage)?;
        }

        for schedule in &data.schedules {
            sqlx::query(
                r#"
                INSERT INTO schedules
                    (id, bus_id, origin, destination, departure_time, arrival_time,
                     days_of_week, base_price_minor)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                "#,
            )
            .bind(schedule.id)
            .bind(schedule.bus_id)
            .bind(&schedule.origin)
            .bind(&schedule.destination)
            .bind(schedule.departure_time)
            .bind(schedule.arrival_time)
            .bind(schedule.days_of_week.clone())
            .bind(schedule.base_price_minor)
            .execute(&mut *tx)
            .await
            .map_err(CoreError::storage)?;

            for point in &schedule.points {
                sqlx::query(
                    r#"
                    INSERT INTO schedule_points (id, schedule_id, name, point_type, point_time)
                    VALUES ($1, $2, $3, $4, $5)
                    "#,
                )
                .bind(point.id)
                .bind(point.schedule_id)
                .bind(&point.name)
                .bind(point.point_type.to_string())
                .bind(point.point_time)
                .execute(&mut *tx)
                .await
                .map_err(CoreError::storage)?;
            }
        }

        tx.commit().await.map_err(CoreError::storage)?;
        info!(
            "Seeded catalog: {} buses, {} seats, {} schedules",
            data.buses.len(),
            data.seats.len(),
            data.schedules.len()
        );
        Ok(())
    }
}
