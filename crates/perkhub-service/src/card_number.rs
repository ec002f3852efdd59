//! Loyalty card number generation.

use rand::Rng;

/// Generate a human-shareable card number: `PH-XXXX-XXXX-XXXX`.
///
/// Uniqueness is enforced by the storage constraint, not here; with
/// twelve random digits collisions are rare enough that a failed insert
/// is acceptable.
pub fn generate_card_number() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "PH-{:04}-{:04}-{:04}",
        rng.gen_range(0..10_000u16),
        rng.gen_range(0..10_000u16),
        rng.gen_range(0..10_000u16)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_number_shape() {
        let number = generate_card_number();
        assert_eq!(number.len(), 17);
        assert!(number.starts_with("PH-"));
        let digits: Vec<&str> = number[3..].split('-').collect();
        assert_eq!(digits.len(), 3);
        for group in digits {
            assert_eq!(group.len(), 4);
            assert!(group.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
