// scraper/demo.rs
use crate::domain::listing::{Location, PropertyType};
use crate::domain::normalize::RawRecord;
use crate::domain::seed::{seed_from, short_hash};
use crate::domain::words::street_address;
use crate::scraper::adapter::SourceAdapter;
use crate::scraper::ScraperError;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde_json::json;
use std::ops::RangeInclusive;
use tracing::info;

pub const DEMO_SOURCE: &str = "demo";
pub const DEMO_URL_BASE: &str = "https://demo-listings.com/property";

const LISTING_COUNT: RangeInclusive<usize> = 5..=8;
const SEED_STRIDE: u64 = 1000;

/// Deterministic synthetic listings. Every value is a function of the
/// location string, so repeated calls return identical records.
#[derive(Debug, Clone, Copy, Default)]
pub struct DemoAdapter;

impl DemoAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Returns 5-8 records for a non-empty location, none for a blank one.
    pub fn generate(&self, location: &Location) -> Vec<RawRecord> {
        if location.raw.is_empty() {
            return Vec::new();
        }

        let location_seed = seed_from(&location.raw);
        let count = StdRng::seed_from_u64(location_seed).gen_range(LISTING_COUNT);

        (0..count as u64)
            .map(|i| {
                let seed = location_seed.wrapping_add(i * SEED_STRIDE);
                generate_property(&location.city, &location.region, seed)
            })
            .collect()
    }
}

impl SourceAdapter for DemoAdapter {
    fn name(&self) -> &str {
        DEMO_SOURCE
    }

    fn acquire(&self, location: &Location) -> Result<Vec<RawRecord>, ScraperError> {
        info!(location = %location, "generating demo listings");
        Ok(self.generate(location))
    }
}

fn base_price(kind: PropertyType) -> f64 {
    match kind {
        PropertyType::House => 550_000.0,
        PropertyType::Condo => 380_000.0,
        PropertyType::Apartment => 280_000.0,
        PropertyType::Townhouse => 450_000.0,
        PropertyType::Studio => 350_000.0,
        PropertyType::Unspecified => 400_000.0,
    }
}

fn description<R: Rng>(rng: &mut R, kind: PropertyType, bedrooms: u32) -> String {
    let templates = [
        format!("Beautiful {bedrooms}-bedroom {kind} with modern finishes and natural light"),
        format!("Stunning {kind} featuring open floor plan and updated kitchen"),
        format!("Charming {kind} in excellent condition with hardwood floors"),
        format!("Spacious {kind} with high ceilings and great outdoor space"),
        format!("Recently renovated {kind} with designer touches throughout"),
        format!("Move-in ready {kind} with great views and ample storage"),
        format!("Well-maintained {kind} in desirable neighborhood"),
        format!("Lovely {kind} with modern amenities and convenient location"),
    ];
    let pick = rng.gen_range(0..templates.len());
    templates[pick].clone()
}

fn generate_property(city: &str, region: &str, seed: u64) -> RawRecord {
    let mut rng = StdRng::seed_from_u64(seed);

    let kind = PropertyType::VOCABULARY
        .choose(&mut rng)
        .copied()
        .unwrap_or(PropertyType::House);

    let price = (base_price(kind) * rng.gen_range(0.6..=1.4)) as i64;

    let (bedrooms, bathrooms, sqft_base) = if kind.is_family_home() {
        let beds: u32 = rng.gen_range(2..=5);
        let half = if rng.gen_bool(0.5) { 0.5 } else { 0.0 };
        let baths = rng.gen_range(1..=3) as f64 + half;
        (beds, baths, 1200 + beds as i64 * 400)
    } else {
        let beds: u32 = rng.gen_range(1..=3);
        let baths = rng.gen_range(1..=2) as f64;
        (beds, baths, 600 + beds as i64 * 300)
    };
    let square_feet = sqft_base + rng.gen_range(-200..=400);

    let address = street_address(&mut rng);
    let description = description(&mut rng, kind, bedrooms);
    let url = format!("{DEMO_URL_BASE}/{}", short_hash(&format!("{city}{seed}"), 16));

    let record = json!({
        "url": url,
        "address": address,
        "city": city,
        "state": region,
        "price": price,
        "bedrooms": bedrooms,
        "bathrooms": bathrooms,
        "square_feet": square_feet,
        "property_type": kind.as_str(),
        "description": description,
        "source": DEMO_SOURCE,
    });

    match record {
        serde_json::Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::normalize::normalize;
    use std::collections::HashSet;

    fn listings_for(raw: &str) -> Vec<crate::domain::listing::Listing> {
        DemoAdapter::new()
            .generate(&Location::parse(raw))
            .iter()
            .map(|r| normalize(r).unwrap())
            .collect()
    }

    #[test]
    fn same_location_same_listings() {
        let a = listings_for("Austin, TX");
        let b = listings_for("Austin, TX");
        assert_eq!(a, b);
    }

    #[test]
    fn different_locations_differ() {
        let a = listings_for("Austin, TX");
        let b = listings_for("Denver, CO");
        assert_ne!(a[0].url, b[0].url);
    }

    #[test]
    fn never_empty_for_non_empty_location() {
        for loc in ["Austin, TX", "Lisbon", "a", "São Paulo, SP", "x,", ",y"] {
            let n = DemoAdapter::new().generate(&Location::parse(loc)).len();
            assert!(LISTING_COUNT.contains(&n), "{loc} produced {n} listings");
        }
    }

    #[test]
    fn blank_location_yields_nothing() {
        assert!(DemoAdapter::new().generate(&Location::parse("   ")).is_empty());
    }

    #[test]
    fn generated_fields_are_plausible() {
        for listing in listings_for("Portland, OR") {
            assert!(listing.url.starts_with(DEMO_URL_BASE));
            assert_eq!(listing.city, "Portland");
            assert_eq!(listing.state, "OR");
            assert_eq!(listing.source, DEMO_SOURCE);
            assert!(listing.price > 0);
            assert!(PropertyType::VOCABULARY.contains(&listing.property_type));

            let beds = listing.bedrooms.unwrap();
            let baths = listing.bathrooms.unwrap();
            let sqft = listing.square_feet.unwrap();
            if listing.property_type.is_family_home() {
                assert!((2..=5).contains(&beds));
                assert!((1.0..=3.5).contains(&baths));
            } else {
                assert!((1..=3).contains(&beds));
                assert!((1.0..=2.0).contains(&baths));
            }
            assert!(sqft >= 400);

            let base = base_price(listing.property_type);
            assert!(listing.price as f64 >= base * 0.6 - 1.0);
            assert!(listing.price as f64 <= base * 1.4);
        }
    }

    #[test]
    fn urls_are_unique_within_a_batch() {
        let listings = listings_for("Chicago, IL");
        let urls: HashSet<_> = listings.iter().map(|l| &l.url).collect();
        assert_eq!(urls.len(), listings.len());
    }

    #[test]
    fn region_defaults_to_unknown() {
        for listing in listings_for("Reykjavik") {
            assert_eq!(listing.state, "Unknown");
        }
    }
}
