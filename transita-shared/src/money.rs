//! All monetary amounts in the system are integers in the currency's minor
//! unit (paise). `500.00` is stored as `50000`.

/// Take a percentage of an amount, rounding half-up to the minor unit.
pub fn percentage_of_minor(amount_minor: i64, percentage: u8) -> i64 {
    (amount_minor * percentage as i64 + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_percentage() {
        // 550.00 at 25% -> 137.50
        assert_eq!(percentage_of_minor(55000, 25), 13750);
        assert_eq!(percentage_of_minor(50000, 90), 45000);
        assert_eq!(percentage_of_minor(50000, 0), 0);
    }

    #[test]
    fn test_half_up_rounding() {
        // 3.33 at 50% -> 1.665 -> rounds up to 1.67
        assert_eq!(percentage_of_minor(333, 50), 167);
        // 3.33 at 25% -> 0.8325 -> rounds down to 0.83
        assert_eq!(percentage_of_minor(333, 25), 83);
    }
}
