pub mod bus;
pub mod pricing;
pub mod schedule;
pub mod seat;
pub mod seed;

pub use bus::Bus;
pub use pricing::seat_price_minor;
pub use schedule::{PointType, Schedule, SchedulePoint};
pub use seat::{Deck, Seat, SeatPosition, SeatType};
pub use transita_core::ParseError;
