use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct SeatsLockedEvent {
    pub schedule_id: Uuid,
    pub journey_date: NaiveDate,
    pub seat_ids: Vec<Uuid>,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    pub locked_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingConfirmedEvent {
    pub booking_id: Uuid,
    pub pnr: String,
    pub schedule_id: Uuid,
    pub journey_date: NaiveDate,
    pub seat_count: usize,
    pub final_amount_minor: i64,
    pub confirmed_at: i64,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone)]
pub struct BookingCancelledEvent {
    pub booking_id: Uuid,
    pub schedule_id: Uuid,
    pub journey_date: NaiveDate,
    pub refund_percentage: u8,
    pub refund_amount_minor: i64,
    pub cancelled_at: i64,
}
