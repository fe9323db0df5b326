pub mod events;

use uuid::Uuid;

/// Service-level error taxonomy. Seat-level failures carry the offending
/// seat ids so callers can re-render seat selection; nothing in here implies
/// a partial mutation survived — every failing operation rolls back fully.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A requested seat is booked, blocked or held by another user.
    #[error("seats unavailable: {}", join_seats(.seats))]
    SeatUnavailable { seats: Vec<Uuid> },

    /// A seat passed lock validation but lost the race at booking commit.
    #[error("seats conflicted at commit: {}", join_seats(.seats))]
    SeatConflict { seats: Vec<Uuid> },

    /// Malformed input; not retryable without client correction.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Operation not legal in the entity's current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Underlying store failed; retryable with backoff.
    #[error("storage failure: {0}")]
    StorageFailure(String),
}

impl CoreError {
    pub fn storage(err: impl std::fmt::Display) -> Self {
        CoreError::StorageFailure(err.to_string())
    }
}

/// Raised when a stored enum discriminant does not round-trip.
#[derive(Debug, thiserror::Error)]
#[error("unrecognized {kind}: {value}")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

impl ParseError {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

impl From<ParseError> for CoreError {
    fn from(err: ParseError) -> Self {
        CoreError::StorageFailure(err.to_string())
    }
}

fn join_seats(seats: &[Uuid]) -> String {
    seats
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_error_names_seats() {
        let seat = Uuid::new_v4();
        let err = CoreError::SeatUnavailable { seats: vec![seat] };
        assert!(err.to_string().contains(&seat.to_string()));
    }
}
