pub mod ledger;
pub mod record;

pub use ledger::{LedgerError, LockGrant, SeatLedger};
pub use record::{SeatAvailabilityRecord, SeatState, SeatStatus};
pub use transita_core::ParseError;
