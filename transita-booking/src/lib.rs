pub mod engine;
pub mod fare;
pub mod models;
pub mod pnr;
pub mod refund;

pub use engine::{BookingEngine, BookingError, CreateBookingRequest};
pub use fare::FareBreakdown;
pub use models::{
    Booking, BookingStatus, ContactInfo, Gender, IdDocumentType, Passenger, PassengerInput,
    PaymentStatus, RefundStatus,
};
pub use refund::RefundOutcome;
