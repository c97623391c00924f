// src/domain/normalize.rs

use crate::domain::listing::{Listing, PropertyType};
use crate::domain::seed::rng_for;
use crate::domain::words::street_address;
use rand::Rng;
use serde_json::{Map, Value};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Heterogeneous extraction output before normalization.
pub type RawRecord = Map<String, Value>;

/// Substitute price range used when a record carries no usable price.
pub const FALLBACK_PRICE_RANGE: RangeInclusive<i64> = 200_000..=1_500_000;

pub const UNKNOWN: &str = "Unknown";

const URL_KEYS: &[&str] = &["url", "link", "href", "detail_url"];
const ADDRESS_KEYS: &[&str] = &["address", "address_line", "street"];
const STATE_KEYS: &[&str] = &["state", "region", "state_code"];
const SQFT_KEYS: &[&str] = &["square_feet", "sqft", "living_area"];

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("record has no usable url")]
    MissingUrl,
}

/// Raw key-value map -> `Listing`.
///
/// Optional fields fall back to `None`, numeric strings are coerced
/// ("$450,000", "3 bds", "1.5 ba"), unknown property types become
/// `Unspecified`. Required fields are always populated; when a price or
/// address is missing the substitute is drawn from an RNG seeded by the URL,
/// so the same record always normalizes to the same listing.
///
/// Only a record with no URL under any known key is rejected.
pub fn normalize(raw: &RawRecord) -> Result<Listing, NormalizeError> {
    let url = first_text(raw, URL_KEYS).ok_or(NormalizeError::MissingUrl)?;
    let mut fallback = rng_for(&url);

    let price = first_number(raw, &["price", "list_price"])
        .map(|p| p.round() as i64)
        .filter(|p| *p > 0)
        .unwrap_or_else(|| fallback.gen_range(FALLBACK_PRICE_RANGE));

    let address = first_text(raw, ADDRESS_KEYS)
        .filter(|a| a.chars().count() >= 3)
        .unwrap_or_else(|| street_address(&mut fallback));

    let city = first_text(raw, &["city"]).unwrap_or_else(|| UNKNOWN.to_string());
    let state = first_text(raw, STATE_KEYS).unwrap_or_else(|| UNKNOWN.to_string());

    let bedrooms = first_number(raw, &["bedrooms", "beds"])
        .filter(|n| *n >= 0.0)
        .map(|n| n.round() as u32);

    let bathrooms = first_number(raw, &["bathrooms", "baths"]).filter(|n| *n >= 0.0);

    let square_feet = first_number(raw, SQFT_KEYS)
        .map(|n| n.round())
        .filter(|n| *n >= 1.0)
        .map(|n| n as u32);

    let property_type = first_text(raw, &["property_type", "type"])
        .map(|t| PropertyType::parse_lenient(&t))
        .unwrap_or_default();

    let description = first_text(raw, &["description"]);

    let source = first_text(raw, &["source"]).unwrap_or_else(|| "unknown".to_string());

    Ok(Listing {
        url,
        address,
        city,
        state,
        price,
        bedrooms,
        bathrooms,
        square_feet,
        property_type,
        description,
        images: images(raw),
        source,
    })
}

fn first_text(raw: &RawRecord, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match raw.get(*k)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_number(raw: &RawRecord, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|k| match raw.get(*k)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => leading_number(s),
        _ => None,
    })
}

fn images(raw: &RawRecord) -> Vec<String> {
    match raw.get("images") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(single)) if !single.trim().is_empty() => {
            vec![single.trim().to_string()]
        }
        _ => Vec::new(),
    }
}

/// First number in free text: "$1,250,000" -> 1250000, "2.5 ba" -> 2.5.
/// Thousands separators are dropped; only one decimal point is accepted.
pub fn leading_number(text: &str) -> Option<f64> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let mut digits = String::new();
    let mut seen_dot = false;

    for c in text[start..].chars() {
        match c {
            '0'..='9' => digits.push(c),
            ',' => {}
            '.' if !seen_dot => {
                seen_dot = true;
                digits.push(c);
            }
            _ => break,
        }
    }

    digits.trim_end_matches('.').parse().ok()
}
