use rand::Rng;

/// Alphabet without 0/O/1/I to keep codes unambiguous when read aloud at a
/// boarding point.
const PNR_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

pub const PNR_LENGTH: usize = 8;

/// Generate a candidate booking reference. Collision-resistant but not
/// collision-free: callers must check the code against existing bookings
/// and retry on a hit.
pub fn generate_pnr() -> String {
    let mut rng = rand::thread_rng();
    (0..PNR_LENGTH)
        .map(|_| PNR_ALPHABET[rng.gen_range(0..PNR_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pnr_shape() {
        let pnr = generate_pnr();
        assert_eq!(pnr.len(), PNR_LENGTH);
        assert!(pnr.bytes().all(|b| PNR_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_ten_thousand_pnrs_are_distinct() {
        let codes: HashSet<String> = (0..10_000).map(|_| generate_pnr()).collect();
        assert_eq!(codes.len(), 10_000);
    }
}
