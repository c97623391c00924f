// src/domain/listing.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed vocabulary of property types. Anything outside it is clamped to
/// `Unspecified` instead of rejecting the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Studio,
    Apartment,
    Townhouse,
    Condo,
    Unspecified,
}

impl PropertyType {
    /// The concrete types, in the order the generators draw from them.
    pub const VOCABULARY: [PropertyType; 5] = [
        PropertyType::House,
        PropertyType::Studio,
        PropertyType::Apartment,
        PropertyType::Townhouse,
        PropertyType::Condo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Studio => "studio",
            PropertyType::Apartment => "apartment",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Condo => "condo",
            PropertyType::Unspecified => "unspecified",
        }
    }

    /// Lenient parse: case and surrounding whitespace are ignored, a few
    /// common spellings are folded in, everything else is `Unspecified`.
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "house" | "single_family" | "single-family" | "single family" => PropertyType::House,
            "studio" => PropertyType::Studio,
            "apartment" | "apt" => PropertyType::Apartment,
            "townhouse" | "townhome" => PropertyType::Townhouse,
            "condo" | "condominium" => PropertyType::Condo,
            _ => PropertyType::Unspecified,
        }
    }

    /// Large multi-room homes; used by the generators to pick room counts.
    pub fn is_family_home(&self) -> bool {
        matches!(self, PropertyType::House | PropertyType::Townhouse)
    }
}

impl Default for PropertyType {
    fn default() -> Self {
        PropertyType::Unspecified
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One normalized property record produced by the acquisition pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Listing {
    pub url: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub price: i64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<u32>,
    pub property_type: PropertyType,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub source: String,
}

/// A listing as stored in the `properties` table.
#[derive(Debug, Clone, Serialize)]
pub struct StoredProperty {
    pub id: i64,
    pub url: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: Option<String>,
    pub price: i64,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<f64>,
    pub square_feet: Option<u32>,
    pub property_type: PropertyType,
    pub description: Option<String>,
    pub images: Vec<String>,
    pub source: String,
    pub scraped_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Free-text location split into `(city, region)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub raw: String,
    pub city: String,
    pub region: String,
}

impl Location {
    pub const UNKNOWN_REGION: &'static str = "Unknown";

    /// Splits on the first comma. Without a comma the whole string is the
    /// city and the region is "Unknown".
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (city, region) = match raw.split_once(',') {
            Some((city, rest)) => {
                let region = rest.split(',').next().unwrap_or("").trim();
                let region = if region.is_empty() {
                    Self::UNKNOWN_REGION
                } else {
                    region
                };
                (city.trim(), region)
            }
            None => (raw, Self::UNKNOWN_REGION),
        };

        Self {
            raw: raw.to_string(),
            city: city.to_string(),
            region: region.to_string(),
        }
    }

    pub fn has_region(&self) -> bool {
        self.region != Self::UNKNOWN_REGION
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_region() {
            write!(f, "{}, {}", self.city, self.region)
        } else {
            f.write_str(&self.city)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn location_splits_on_first_comma() {
        let loc = Location::parse("Austin, TX");
        assert_eq!(loc.city, "Austin");
        assert_eq!(loc.region, "TX");
        assert_eq!(loc.to_string(), "Austin, TX");
    }

    #[test]
    fn location_without_comma_has_unknown_region() {
        let loc = Location::parse("  Lisbon ");
        assert_eq!(loc.city, "Lisbon");
        assert_eq!(loc.region, "Unknown");
        assert!(!loc.has_region());
        assert_eq!(loc.to_string(), "Lisbon");
    }

    #[test]
    fn property_type_clamps_unknown_values() {
        assert_eq!(PropertyType::parse_lenient(" Condo "), PropertyType::Condo);
        assert_eq!(PropertyType::parse_lenient("castle"), PropertyType::Unspecified);
        assert_eq!(PropertyType::parse_lenient(""), PropertyType::Unspecified);
    }

    #[test]
    fn property_type_serializes_lowercase() {
        let json = serde_json::to_string(&PropertyType::Townhouse).unwrap();
        assert_eq!(json, "\"townhouse\"");
    }
}
