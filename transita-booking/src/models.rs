use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use transita_core::ParseError;
use transita_shared::Masked;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefundStatus {
    Processed,
    NoRefund,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IdDocumentType {
    Aadhaar,
    Passport,
    DrivingLicence,
    VoterId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactInfo {
    pub name: String,
    pub email: Masked<String>,
    pub phone: Masked<String>,
}

/// One confirmed reservation over a set of seats on a schedule instance.
/// Created only after every requested seat flipped to booked; mutated only
/// by status transitions, never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: Uuid,
    pub pnr: String,
    pub schedule_id: Uuid,
    pub journey_date: NaiveDate,
    pub user_id: String,
    pub status: BookingStatus,
    pub total_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub final_amount_minor: i64,
    pub payment_status: PaymentStatus,
    pub payment_reference: Option<String>,
    pub contact: ContactInfo,
    pub boarding_point_id: Uuid,
    pub dropping_point_id: Uuid,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_amount_minor: Option<i64>,
    pub refund_status: Option<RefundStatus>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn is_cancellable(&self) -> bool {
        !matches!(
            self.status,
            BookingStatus::Cancelled | BookingStatus::Completed
        )
    }

    /// Apply the cancellation transition. Guards the terminal states; the
    /// caller supplies the already-computed refund entitlement.
    pub fn cancel(
        &mut self,
        now: DateTime<Utc>,
        refund_amount_minor: i64,
        refund_status: RefundStatus,
    ) -> Result<(), String> {
        if !self.is_cancellable() {
            return Err(format!(
                "booking {} is already {:?}",
                self.pnr, self.status
            ));
        }
        self.status = BookingStatus::Cancelled;
        self.cancelled_at = Some(now);
        self.refund_amount_minor = Some(refund_amount_minor);
        self.refund_status = Some(refund_status);
        if refund_amount_minor > 0 {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Manifest entry: one passenger in one seat, with the seat price frozen at
/// booking time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Passenger {
    pub id: Uuid,
    pub booking_id: Uuid,
    pub seat_id: Uuid,
    pub full_name: String,
    pub age: i16,
    pub gender: Gender,
    pub id_document_type: Option<IdDocumentType>,
    pub id_document_number: Option<String>,
    pub seat_price_minor: i64,
}

/// Passenger details as submitted with a booking request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassengerInput {
    pub seat_id: Uuid,
    pub full_name: String,
    pub age: i16,
    pub gender: Gender,
    pub id_document_type: Option<IdDocumentType>,
    pub id_document_number: Option<String>,
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        })
    }
}

impl FromStr for BookingStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELLED" => Ok(BookingStatus::Cancelled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            other => Err(ParseError::new("booking status", other)),
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Refunded => "REFUNDED",
        })
    }
}

impl FromStr for PaymentStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(PaymentStatus::Pending),
            "PAID" => Ok(PaymentStatus::Paid),
            "REFUNDED" => Ok(PaymentStatus::Refunded),
            other => Err(ParseError::new("payment status", other)),
        }
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefundStatus::Processed => "PROCESSED",
            RefundStatus::NoRefund => "NO_REFUND",
        })
    }
}

impl FromStr for RefundStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PROCESSED" => Ok(RefundStatus::Processed),
            "NO_REFUND" => Ok(RefundStatus::NoRefund),
            other => Err(ParseError::new("refund status", other)),
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Gender::Male => "MALE",
            Gender::Female => "FEMALE",
            Gender::Other => "OTHER",
        })
    }
}

impl FromStr for Gender {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "MALE" => Ok(Gender::Male),
            "FEMALE" => Ok(Gender::Female),
            "OTHER" => Ok(Gender::Other),
            other => Err(ParseError::new("gender", other)),
        }
    }
}

impl fmt::Display for IdDocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IdDocumentType::Aadhaar => "AADHAAR",
            IdDocumentType::Passport => "PASSPORT",
            IdDocumentType::DrivingLicence => "DRIVING_LICENCE",
            IdDocumentType::VoterId => "VOTER_ID",
        })
    }
}

impl FromStr for IdDocumentType {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AADHAAR" => Ok(IdDocumentType::Aadhaar),
            "PASSPORT" => Ok(IdDocumentType::Passport),
            "DRIVING_LICENCE" => Ok(IdDocumentType::DrivingLicence),
            "VOTER_ID" => Ok(IdDocumentType::VoterId),
            other => Err(ParseError::new("id document type", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(status: BookingStatus) -> Booking {
        Booking {
            id: Uuid::new_v4(),
            pnr: "TSTPNR01".to_string(),
            schedule_id: Uuid::new_v4(),
            journey_date: NaiveDate::from_ymd_opt(2026, 8, 20).unwrap(),
            user_id: "u1".to_string(),
            status,
            total_amount_minor: 55000,
            discount_amount_minor: 0,
            final_amount_minor: 55000,
            payment_status: PaymentStatus::Paid,
            payment_reference: None,
            contact: ContactInfo {
                name: "Asha".to_string(),
                email: Masked("asha@example.com".to_string()),
                phone: Masked("9876543210".to_string()),
            },
            boarding_point_id: Uuid::new_v4(),
            dropping_point_id: Uuid::new_v4(),
            cancelled_at: None,
            refund_amount_minor: None,
            refund_status: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_cancel_sets_refund_fields() {
        let mut b = booking(BookingStatus::Confirmed);
        let now = Utc::now();
        b.cancel(now, 13750, RefundStatus::Processed).unwrap();
        assert_eq!(b.status, BookingStatus::Cancelled);
        assert_eq!(b.cancelled_at, Some(now));
        assert_eq!(b.refund_amount_minor, Some(13750));
        assert_eq!(b.payment_status, PaymentStatus::Refunded);
    }

    #[test]
    fn test_cancel_is_rejected_in_terminal_states() {
        for status in [BookingStatus::Cancelled, BookingStatus::Completed] {
            let mut b = booking(status);
            assert!(b.cancel(Utc::now(), 0, RefundStatus::NoRefund).is_err());
        }
    }

    #[test]
    fn test_zero_refund_keeps_payment_status() {
        let mut b = booking(BookingStatus::Confirmed);
        b.cancel(Utc::now(), 0, RefundStatus::NoRefund).unwrap();
        assert_eq!(b.payment_status, PaymentStatus::Paid);
        assert_eq!(b.refund_status, Some(RefundStatus::NoRefund));
    }

    #[test]
    fn test_status_round_trips() {
        for s in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Cancelled,
            BookingStatus::Completed,
        ] {
            assert_eq!(s.to_string().parse::<BookingStatus>().unwrap(), s);
        }
        for s in [RefundStatus::Processed, RefundStatus::NoRefund] {
            assert_eq!(s.to_string().parse::<RefundStatus>().unwrap(), s);
        }
    }
}
