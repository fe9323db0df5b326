use crate::seat::Seat;

/// Price of one seat on one schedule: base price plus the seat's modifier.
/// Pure computation, no side effects; booking snapshots the result so later
/// catalog changes never reprice an existing passenger.
pub fn seat_price_minor(base_price_minor: i64, seat: &Seat) -> i64 {
    base_price_minor + seat.price_modifier_minor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seat::{Deck, SeatPosition, SeatType};
    use uuid::Uuid;

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
    fn test_window_premium() {
        // base 500.00 + window premium 50.00 = 550.00
        assert_eq!(seat_price_minor(50000, &seat(5000)), 55000);
    }

    #[test]
    fn test_negative_modifier_discounts() {
        assert_eq!(seat_price_minor(50000, &seat(-2500)), 47500);
    }
}
