use crate::models::RefundStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use transita_shared::percentage_of_minor;

/// Computed cancellation entitlement. Recording it is the cancellation
/// engine's whole job; moving money is an external collaborator's.
#[derive(Debug, Clone, Serialize)]
pub struct RefundOutcome {
    pub refund_percentage: u8,
    pub refund_amount_minor: i64,
    pub refund_status: RefundStatus,
}

/// Refund tier from time remaining before departure. Thresholds compare
/// with strict `>`, so each bracket includes its upper bound: exactly 24h
/// out refunds 50%, exactly 12h 25%, exactly 6h 0%.
pub fn refund_percentage(departure: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
    let seconds_left = (departure - now).num_seconds();
    if seconds_left > 24 * 3600 {
        90
    } else if seconds_left > 12 * 3600 {
        50
    } else if seconds_left > 6 * 3600 {
        25
    } else {
        0
    }
}

pub fn compute_refund(
    final_amount_minor: i64,
    departure: DateTime<Utc>,
    now: DateTime<Utc>,
) -> RefundOutcome {
    let refund_percentage = refund_percentage(departure, now);
    let refund_amount_minor = percentage_of_minor(final_amount_minor, refund_percentage);
    let refund_status = if refund_amount_minor > 0 {
        RefundStatus::Processed
    } else {
        RefundStatus::NoRefund
    };
    RefundOutcome {
        refund_percentage,
        refund_amount_minor,
        refund_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn pct_at(hours: i64, extra_seconds: i64) -> u8 {
        let now = Utc::now();
        let departure = now + Duration::hours(hours) + Duration::seconds(extra_seconds);
        refund_percentage(departure, now)
    }

    #[test]
    fn test_ladder_brackets() {
        assert_eq!(pct_at(48, 0), 90);
        assert_eq!(pct_at(18, 0), 50);
        assert_eq!(pct_at(10, 0), 25);
        assert_eq!(pct_at(2, 0), 0);
    }

    #[test]
    fn test_exact_boundaries_are_upper_inclusive() {
        // One second above each threshold falls in the higher bracket;
        // the threshold itself belongs to the bracket below it.
        assert_eq!(pct_at(24, 1), 90);
        assert_eq!(pct_at(24, 0), 50);
        assert_eq!(pct_at(24, -1), 50);

        assert_eq!(pct_at(12, 1), 50);
        assert_eq!(pct_at(12, 0), 25);
        assert_eq!(pct_at(12, -1), 25);

        assert_eq!(pct_at(6, 1), 25);
        assert_eq!(pct_at(6, 0), 0);
        assert_eq!(pct_at(6, -1), 0);
    }

    #[test]
    fn test_departed_bus_refunds_nothing() {
        assert_eq!(pct_at(-3, 0), 0);
    }

    #[test]
    fn test_refund_amount_rounds_to_minor_unit() {
        let now = Utc::now();
        let departure = now + Duration::hours(10);
        // 550.00 at 25% -> 137.50
        let outcome = compute_refund(55000, departure, now);
        assert_eq!(outcome.refund_percentage, 25);
        assert_eq!(outcome.refund_amount_minor, 13750);
        assert_eq!(outcome.refund_status, RefundStatus::Processed);
    }

    #[test]
    fn test_no_refund_inside_six_hours() {
        let now = Utc::now();
        let outcome = compute_refund(55000, now + Duration::hours(3), now);
        assert_eq!(outcome.refund_amount_minor, 0);
        assert_eq!(outcome.refund_status, RefundStatus::NoRefund);
    }
}
