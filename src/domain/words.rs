// src/domain/words.rs
// Word lists shared by the generators and the normalizer's address fallback.

use rand::seq::SliceRandom;
use rand::Rng;

pub const STREET_NAMES: &[&str] = &[
    "Oak", "Maple", "Cedar", "Pine", "Elm", "Birch", "Willow", "Cherry", "Ash", "Walnut",
    "Main", "Park", "Lake", "River", "Hill", "Valley", "Sunset", "Ocean", "Mountain", "Forest",
    "Royal", "Victoria", "King", "Queen", "Prince", "Duke", "Windsor", "Hampton", "Cambridge",
];

pub const STREET_TYPES: &[&str] = &[
    "Street", "Avenue", "Road", "Drive", "Lane", "Boulevard", "Court", "Place", "Way",
];

/// "{number} {name} {type}", e.g. "4182 Willow Court".
pub fn street_address<R: Rng>(rng: &mut R) -> String {
    let number = rng.gen_range(100..=9999);
    let name = STREET_NAMES.choose(rng).copied().unwrap_or("Main");
    let kind = STREET_TYPES.choose(rng).copied().unwrap_or("Street");
    format!("{number} {name} {kind}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn street_address_has_number_name_and_type() {
        let mut rng = StdRng::seed_from_u64(7);
        let addr = street_address(&mut rng);
        let parts: Vec<&str> = addr.split(' ').collect();
        assert_eq!(parts.len(), 3);
        let n: u32 = parts[0].parse().unwrap();
        assert!((100..=9999).contains(&n));
        assert!(STREET_NAMES.contains(&parts[1]));
        assert!(STREET_TYPES.contains(&parts[2]));
    }
}
