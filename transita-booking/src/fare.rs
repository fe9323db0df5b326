use transita_catalog::{pricing::seat_price_minor, Schedule, Seat};
use uuid::Uuid;

/// Priced manifest for one booking request. Per-seat prices are what gets
/// snapshotted into each passenger record.
#[derive(Debug, Clone)]
pub struct FareBreakdown {
    pub seat_prices_minor: Vec<(Uuid, i64)>,
    pub total_amount_minor: i64,
    pub discount_amount_minor: i64,
    pub final_amount_minor: i64,
}

impl FareBreakdown {
    pub fn price_of(&self, seat_id: Uuid) -> Option<i64> {
        self.seat_prices_minor
            .iter()
            .find(|(id, _)| *id == seat_id)
            .map(|(_, price)| *price)
    }
}

/// Price a set of seats on a schedule. The discount is honored when
/// populated upstream; it is currently always zero.
pub fn compute_fare(schedule: &Schedule, seats: &[&Seat], discount_amount_minor: i64) -> FareBreakdown {
    let seat_prices_minor: Vec<(Uuid, i64)> = seats
        .iter()
        .map(|seat| (seat.id, seat_price_minor(schedule.base_price_minor, seat)))
        .collect();
    let total_amount_minor: i64 = seat_prices_minor.iter().map(|(_, p)| p).sum();

    FareBreakdown {
        seat_prices_minor,
        total_amount_minor,
        discount_amount_minor,
        final_amount_minor: total_amount_minor - discount_amount_minor,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use transita_catalog::{Deck, SeatPosition, SeatType};

    fn schedule(base: i64) -> Schedule {
        Schedule {
            id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            origin: "Pune".to_string(),
            destination: "Goa".to_string(),
            departure_time: NaiveTime::from_hms_opt(21, 30, 0).unwrap(),
            arrival_time: NaiveTime::from_hms_opt(7, 15, 0).unwrap(),
            days_of_week: vec![0, 1, 2, 3, 4, 5, 6],
            base_price_minor: base,
            points: vec![],
        }
    }

    fn seat(modifier: i64) -> Seat {
        Seat {
            id: Uuid::new_v4(),
            bus_id: Uuid::new_v4(),
            seat_number: "W1".to_string(),
            seat_type: SeatType::Seater,
            deck: Deck::Lower,
            row: 1,
            column: 0,
            position: SeatPosition::Window,
            price_modifier_minor: modifier,
            female_only: false,
        }
    }

    #[test]
    fn test_total_is_sum_of_seat_prices() {
        let schedule = schedule(50000);
        let window = seat(5000);
        let aisle = seat(0);
        let fare = compute_fare(&schedule, &[&window, &aisle], 0);

        assert_eq!(fare.price_of(window.id), Some(55000));
        assert_eq!(fare.price_of(aisle.id), Some(50000));
        assert_eq!(fare.total_amount_minor, 105000);
        assert_eq!(fare.final_amount_minor, 105000);
    }

    #[test]
    fn test_discount_reduces_final_only() {
        let schedule = schedule(50000);
        let s = seat(0);
        let fare = compute_fare(&schedule, &[&s], 5000);
        assert_eq!(fare.total_amount_minor, 50000);
        assert_eq!(fare.final_amount_minor, 45000);
    }
}
