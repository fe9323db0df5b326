use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use transita_core::{CoreError, CoreResult};
use transita_inventory::{SeatAvailabilityRecord, SeatState};
use uuid::Uuid;

/// The only writer of the `seat_availability` table. Every mutation runs
/// inside the caller's transaction, takes row locks on the touched keys,
/// and either applies to every requested seat or to none.
pub struct LedgerRepository;

#[derive(sqlx::FromRow)]
struct AvailabilityRow {
    schedule_id: Uuid,
    seat_id: Uuid,
    journey_date: NaiveDate,
    status: String,
    locked_by: Option<String>,
    locked_until: Option<DateTime<Utc>>,
    booking_id: Option<Uuid>,
}

impl AvailabilityRow {
    fn into_record(self) -> CoreResult<SeatAvailabilityRecord> {
        Ok(SeatAvailabilityRecord {
            schedule_id: self.schedule_id,
            seat_id: self.seat_id,
            journey_date: self.journey_date,
            state: self.status.parse::<SeatState>()?,
            locked_by: self.locked_by,
            locked_until: self.locked_until,
            booking_id: self.booking_id,
        })
    }
}

const SELECT_FOR_UPDATE: &str = r#"
    SELECT schedule_id, seat_id, journey_date, status, locked_by, locked_until, booking_id
    FROM seat_availability
    WHERE schedule_id = $1 AND journey_date = $2 AND seat_id = ANY($3)
    FOR UPDATE
"#;

impl LedgerRepository {
    /// All materialized records for one schedule instance (seat-map read
    /// path; callers evaluate expiry through the record predicate).
    pub async fn records_for(
        pool: &PgPool,
        schedule_id: Uuid,
        journey_date: NaiveDate,
    ) -> CoreResult<Vec<SeatAvailabilityRecord>> {
        let rows = sqlx::query_as::<_, AvailabilityRow>(
            r#"
            SELECT schedule_id, seat_id, journey_date, status, locked_by, locked_until, booking_id
            FROM seat_availability
            WHERE schedule_id = $1 AND journey_date = $2
            "#,
        )
        .bind(schedule_id)
        .bind(journey_date)
        .fetch_all(pool)
        .await
        .map_err(CoreError::storage)?;

        rows.into_iter().map(AvailabilityRow::into_record).collect()
    }

    /// Row-lock the requested keys and return their current records.
    async fn claimable_or_offenders(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<Uuid>> {
        let rows = sqlx::query_as::<_, AvailabilityRow>(SELECT_FOR_UPDATE)
            .bind(schedule_id)
            .bind(journey_date)
            .bind(seat_ids.to_vec())
            .fetch_all(&mut **tx)
            .await
            .map_err(CoreError::storage)?;

        let mut offenders = Vec::new();
        for row in rows {
            let record = row.into_record()?;
            if !record.is_claimable_by(user_id, now) {
                offenders.push(record.seat_id);
            }
        }
        Ok(offenders)
    }

    /// Grant `user_id` a hold on every seat until now + ttl. Re-locking a
    /// seat the user already holds refreshes the full TTL. The guarded
    /// upsert re-checks state on the conflict arm so an insert racing a
    /// concurrent lock cannot silently overwrite it.
    pub async fn lock_seats(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        ttl_seconds: u64,
    ) -> CoreResult<DateTime<Utc>> {
        let now = Utc::now();
        let offenders =
            Self::claimable_or_offenders(tx, schedule_id, journey_date, seat_ids, user_id, now)
                .await?;
        if !offenders.is_empty() {
            return Err(CoreError::SeatUnavailable { seats: offenders });
        }

        let expires_at = now + chrono::Duration::seconds(ttl_seconds as i64);
        for seat_id in seat_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO seat_availability
                    (schedule_id, seat_id, journey_date, status, locked_by, locked_until, booking_id)
                VALUES ($1, $2, $3, 'LOCKED', $4, $5, NULL)
                ON CONFLICT (schedule_id, seat_id, journey_date) DO UPDATE
                SET status = 'LOCKED',
                    locked_by = EXCLUDED.locked_by,
                    locked_until = EXCLUDED.locked_until,
                    booking_id = NULL,
                    updated_at = NOW()
                WHERE seat_availability.status = 'LOCKED'
                  AND (seat_availability.locked_by = EXCLUDED.locked_by
                       OR seat_availability.locked_until <= NOW())
                "#,
            )
            .bind(schedule_id)
            .bind(seat_id)
            .bind(journey_date)
            .bind(user_id)
            .bind(expires_at)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::storage)?;

            if result.rows_affected() == 0 {
                return Err(CoreError::SeatUnavailable {
                    seats: vec![*seat_id],
                });
            }
        }

        Ok(expires_at)
    }

    /// Flip every seat to booked for `booking_id`, clearing lock fields.
    /// Availability is re-validated here, under the same row locks the
    /// booking commit holds: a lock taken earlier is a hint, not a
    /// guarantee.
    pub async fn book_seats(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
        user_id: &str,
        booking_id: Uuid,
    ) -> CoreResult<()> {
        let now = Utc::now();
        let offenders =
            Self::claimable_or_offenders(tx, schedule_id, journey_date, seat_ids, user_id, now)
                .await?;
        if !offenders.is_empty() {
            return Err(CoreError::SeatConflict { seats: offenders });
        }

        for seat_id in seat_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO seat_availability
                    (schedule_id, seat_id, journey_date, status, locked_by, locked_until, booking_id)
                VALUES ($1, $2, $3, 'BOOKED', NULL, NULL, $4)
                ON CONFLICT (schedule_id, seat_id, journey_date) DO UPDATE
                SET status = 'BOOKED',
                    booking_id = EXCLUDED.booking_id,
                    locked_by = NULL,
                    locked_until = NULL,
                    updated_at = NOW()
                WHERE seat_availability.status = 'LOCKED'
                  AND (seat_availability.locked_by = $5
                       OR seat_availability.locked_until <= NOW())
                "#,
            )
            .bind(schedule_id)
            .bind(seat_id)
            .bind(journey_date)
            .bind(booking_id)
            .bind(user_id)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::storage)?;

            if result.rows_affected() == 0 {
                return Err(CoreError::SeatConflict {
                    seats: vec![*seat_id],
                });
            }
        }

        Ok(())
    }

    /// Operator-withheld seats; only currently-available keys can be taken.
    pub async fn block_seats(
        tx: &mut Transaction<'_, Postgres>,
        schedule_id: Uuid,
        journey_date: NaiveDate,
        seat_ids: &[Uuid],
    ) -> CoreResult<()> {
        let now = Utc::now();
        // A blocked seat belongs to no user; reuse the claim check with a
        // holder no lock can carry.
        let offenders =
            Self::claimable_or_offenders(tx, schedule_id, journey_date, seat_ids, "", now).await?;
        if !offenders.is_empty() {
            return Err(CoreError::SeatUnavailable { seats: offenders });
        }

        for seat_id in seat_ids {
            let result = sqlx::query(
                r#"
                INSERT INTO seat_availability
                    (schedule_id, seat_id, journey_date, status, locked_by, locked_until, booking_id)
                VALUES ($1, $2, $3, 'BLOCKED', NULL, NULL, NULL)
                ON CONFLICT (schedule_id, seat_id, journey_date) DO UPDATE
                SET status = 'BLOCKED',
                    locked_by = NULL,
                    locked_until = NULL,
                    booking_id = NULL,
                    updated_at = NOW()
                WHERE seat_availability.status = 'LOCKED'
                  AND seat_availability.locked_until <= NOW()
                "#,
            )
            .bind(schedule_id)
            .bind(seat_id)
            .bind(journey_date)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::storage)?;

            if result.rows_affected() == 0 {
                return Err(CoreError::SeatUnavailable {
                    seats: vec![*seat_id],
                });
            }
        }

        Ok(())
    }

    /// Cancellation path: drop every record bound to the booking so the
    /// seats are immediately available again.
    pub async fn release_booking(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> CoreResult<u64> {
        let result = sqlx::query("DELETE FROM seat_availability WHERE booking_id = $1")
            .bind(booking_id)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::storage)?;
        Ok(result.rows_affected())
    }

    /// Hygiene sweep: physically remove expired lock rows. Readers already
    /// treat them as available, so correctness never depends on this.
    pub async fn sweep_expired(pool: &PgPool) -> CoreResult<u64> {
        let result =
            sqlx::query("DELETE FROM seat_availability WHERE status = 'LOCKED' AND locked_until <= NOW()")
                .execute(pool)
                .await
                .map_err(CoreError::storage)?;
        Ok(result.rows_affected())
    }
}
