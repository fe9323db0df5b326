use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use transita_booking::{
    Booking, BookingStatus, ContactInfo, Gender, IdDocumentType, Passenger, PaymentStatus,
    RefundStatus,
};
use transita_core::{CoreError, CoreResult};
use transita_shared::Masked;
use uuid::Uuid;

pub struct BookingRepository;

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    pnr: String,
    schedule_id: Uuid,
    journey_date: NaiveDate,
    user_id: String,
    status: String,
    total_amount_minor: i64,
    discount_amount_minor: i64,
    final_amount_minor: i64,
    payment_status: String,
    payment_reference: Option<String>,
    contact_name: String,
    contact_email: String,
    contact_phone: String,
    boarding_point_id: Uuid,
    dropping_point_id: Uuid,
    cancelled_at: Option<DateTime<Utc>>,
    refund_amount_minor: Option<i64>,
    refund_status: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl BookingRow {
    fn into_booking(self) -> CoreResult<Booking> {
        Ok(Booking {
            id: self.id,
            pnr: self.pnr,
            schedule_id: self.schedule_id,
            journey_date: self.journey_date,
            user_id: self.user_id,
            status: self.status.parse::<BookingStatus>()?,
            total_amount_minor: self.total_amount_minor,
            discount_amount_minor: self.discount_amount_minor,
            final_amount_minor: self.final_amount_minor,
            payment_status: self.payment_status.parse::<PaymentStatus>()?,
            payment_reference: self.payment_reference,
            contact: ContactInfo {
                name: self.contact_name,
                email: Masked(self.contact_email),
                phone: Masked(self.contact_phone),
            },
            boarding_point_id: self.boarding_point_id,
            dropping_point_id: self.dropping_point_id,
            cancelled_at: self.cancelled_at,
            refund_amount_minor: self.refund_amount_minor,
            refund_status: self
                .refund_status
                .map(|s| s.parse::<RefundStatus>())
                .transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct PassengerRow {
    id: Uuid,
    booking_id: Uuid,
    seat_id: Uuid,
    full_name: String,
    age: i16,
    gender: String,
    id_document_type: Option<String>,
    id_document_number: Option<String>,
    seat_price_minor: i64,
}

impl PassengerRow {
    fn into_passenger(self) -> CoreResult<Passenger> {
        Ok(Passenger {
            id: self.id,
            booking_id: self.booking_id,
            seat_id: self.seat_id,
            full_name: self.full_name,
            age: self.age,
            gender: self.gender.parse::<Gender>()?,
            id_document_type: self
                .id_document_type
                .map(|s| s.parse::<IdDocumentType>())
                .transpose()?,
            id_document_number: self.id_document_number,
            seat_price_minor: self.seat_price_minor,
        })
    }
}

const SELECT_BOOKING: &str = r#"
    SELECT id, pnr, schedule_id, journey_date, user_id, status,
           total_amount_minor, discount_amount_minor, final_amount_minor,
           payment_status, payment_reference,
           contact_name, contact_email, contact_phone,
           boarding_point_id, dropping_point_id,
           cancelled_at, refund_amount_minor, refund_status,
           created_at, updated_at
    FROM bookings
"#;

impl BookingRepository {
    /// Insert the booking and its passenger manifest. Runs inside the same
    /// transaction that flips the seats, so either all of it lands or none.
    pub async fn insert(
        tx: &mut Transaction<'_, Postgres>,
        booking: &Booking,
        passengers: &[Passenger],
    ) -> CoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO bookings
                (id, pnr, schedule_id, journey_date, user_id, status,
                 total_amount_minor, discount_amount_minor, final_amount_minor,
                 payment_status, payment_reference,
                 contact_name, contact_email, contact_phone,
                 boarding_point_id, dropping_point_id,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(booking.id)
        .bind(&booking.pnr)
        .bind(booking.schedule_id)
        .bind(booking.journey_date)
        .bind(&booking.user_id)
        .bind(booking.status.to_string())
        .bind(booking.total_amount_minor)
        .bind(booking.discount_amount_minor)
        .bind(booking.final_amount_minor)
        .bind(booking.payment_status.to_string())
        .bind(&booking.payment_reference)
        .bind(&booking.contact.name)
        .bind(booking.contact.email.inner())
        .bind(booking.contact.phone.inner())
        .bind(booking.boarding_point_id)
        .bind(booking.dropping_point_id)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .execute(&mut **tx)
        .await
        .map_err(CoreError::storage)?;

        for passenger in passengers {
            sqlx::query(
                r#"
                INSERT INTO passengers
                    (id, booking_id, seat_id, full_name, age, gender,
                     id_document_type, id_document_number, seat_price_minor)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                "#,
            )
            .bind(passenger.id)
            .bind(passenger.booking_id)
            .bind(passenger.seat_id)
            .bind(&passenger.full_name)
            .bind(passenger.age)
            .bind(passenger.gender.to_string())
            .bind(passenger.id_document_type.map(|t| t.to_string()))
            .bind(&passenger.id_document_number)
            .bind(passenger.seat_price_minor)
            .execute(&mut **tx)
            .await
            .map_err(CoreError::storage)?;
        }

        Ok(())
    }

    pub async fn pnr_exists(pool: &PgPool, pnr: &str) -> CoreResult<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM bookings WHERE pnr = $1)")
                .bind(pnr)
                .fetch_one(pool)
                .await
                .map_err(CoreError::storage)?;
        Ok(exists)
    }

    pub async fn fetch(pool: &PgPool, booking_id: Uuid) -> CoreResult<Option<Booking>> {
        let row = sqlx::query_as::<_, BookingRow>(&format!("{SELECT_BOOKING} WHERE id = $1"))
            .bind(booking_id)
            .fetch_optional(pool)
            .await
            .map_err(CoreError::storage)?;
        row.map(BookingRow::into_booking).transpose()
    }

    /// Fetch with a row lock, serializing concurrent cancellations of the
    /// same booking.
    pub async fn fetch_for_update(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
    ) -> CoreResult<Option<Booking>> {
        let row =
            sqlx::query_as::<_, BookingRow>(&format!("{SELECT_BOOKING} WHERE id = $1 FOR UPDATE"))
                .bind(booking_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(CoreError::storage)?;
        row.map(BookingRow::into_booking).transpose()
    }

    pub async fn passengers(pool: &PgPool, booking_id: Uuid) -> CoreResult<Vec<Passenger>> {
        let rows = sqlx::query_as::<_, PassengerRow>(
            r#"
            SELECT id, booking_id, seat_id, full_name, age, gender,
                   id_document_type, id_document_number, seat_price_minor
            FROM passengers
            WHERE booking_id = $1
            "#,
        )
        .bind(booking_id)
        .fetch_all(pool)
        .await
        .map_err(CoreError::storage)?;
        rows.into_iter().map(PassengerRow::into_passenger).collect()
    }

    pub async fn list_for_user(pool: &PgPool, user_id: &str) -> CoreResult<Vec<Booking>> {
        let rows = sqlx::query_as::<_, BookingRow>(&format!(
            "{SELECT_BOOKING} WHERE user_id = $1 ORDER BY created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .map_err(CoreError::storage)?;
        rows.into_iter().map(BookingRow::into_booking).collect()
    }

    pub async fn mark_cancelled(
        tx: &mut Transaction<'_, Postgres>,
        booking_id: Uuid,
        cancelled_at: DateTime<Utc>,
        refund_amount_minor: i64,
        refund_status: RefundStatus,
        payment_status: PaymentStatus,
    ) -> CoreResult<()> {
        sqlx::query(
            r#"
            UPDATE bookings
            SET status = $1, cancelled_at = $2, refund_amount_minor = $3,
                refund_status = $4, payment_status = $5, updated_at = $2
            WHERE id = $6
            "#,
        )
        .bind(BookingStatus::Cancelled.to_string())
        .bind(cancelled_at)
        .bind(refund_amount_minor)
        .bind(refund_status.to_string())
        .bind(payment_status.to_string())
        .bind(booking_id)
        .execute(&mut **tx)
        .await
        .map_err(CoreError::storage)?;
        Ok(())
    }
}
