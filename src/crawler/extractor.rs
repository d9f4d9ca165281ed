//! Listing card extraction
//!
//! Turns the markup of one location index page into `ListingRecord`s:
//! - Locating listing cards by CSS selector
//! - Resolving and policy-checking each card's detail link
//! - Pulling price, address, beds/baths/area and image out of the card
//! - Deriving city and state from the location token
//!
//! Numeric patterns assume US-formatted numerals and English unit
//! abbreviations (`bd`, `ba`, `sqft`).

use crate::config::CardSelectors;
use crate::policy::PolicyGate;
use crate::storage::ListingRecord;
use crate::{ConfigError, ExtractionError};
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::Arc;
use url::Url;

/// Title used when a card's link has no text
pub const DEFAULT_TITLE: &str = "Apartment for Rent";

static PRICE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$?\s*((?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)").expect("price pattern")
});
static BEDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s*bd").expect("beds pattern"));
static BATHS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*ba").expect("baths pattern"));
static AREA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:,\d{3})*)\s*sqft").expect("area pattern"));

/// City and state derived from a location token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationContext {
    pub token: String,
    pub city: String,
    pub state: String,
}

impl LocationContext {
    /// Parses a hyphen-delimited token such as `"san-francisco-ca"`
    ///
    /// All segments but the last, title-cased and space-joined, form the
    /// city; the last segment, upper-cased, is the state. A token without a
    /// hyphen yields an empty state (and an empty city).
    pub fn parse(token: &str) -> Self {
        let parts: Vec<&str> = token.split('-').collect();
        let (city, state) = match parts.split_last() {
            Some((last, rest)) if !rest.is_empty() => {
                let city = rest
                    .iter()
                    .map(|part| title_case(part))
                    .collect::<Vec<_>>()
                    .join(" ");
                (city, last.to_uppercase())
            }
            _ => (String::new(), String::new()),
        };

        Self {
            token: token.to_string(),
            city,
            state,
        }
    }
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}

/// Extracts the first price-like number; 0 when none is present
///
/// Accepts `$2,450`, `2450`, `$1,234.56` and similar.
pub fn parse_price(text: &str) -> f64 {
    PRICE_RE
        .captures(text)
        .and_then(|caps| caps[1].replace(',', "").parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Bedrooms, bathrooms and square footage parsed from a details blob
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct UnitDetails {
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_footage: f64,
}

/// Parses `"2 bds 1.5 ba 950 sqft"`-style text
///
/// Each figure defaults to 0 independently when its pattern is absent.
/// A figure that matches but does not fit its type, such as a bedroom
/// count beyond `u32::MAX`, is an error: the caller skips the whole card
/// as malformed instead of defaulting that figure.
pub fn parse_details(text: &str) -> Result<UnitDetails, ExtractionError> {
    let mut details = UnitDetails::default();

    if let Some(caps) = BEDS_RE.captures(text) {
        details.bedrooms = caps[1]
            .parse()
            .map_err(|_| ExtractionError::InvalidNumber {
                field: "bedrooms",
                text: caps[1].to_string(),
            })?;
    }

    if let Some(caps) = BATHS_RE.captures(text) {
        details.bathrooms = caps[1]
            .parse()
            .map_err(|_| ExtractionError::InvalidNumber {
                field: "bathrooms",
                text: caps[1].to_string(),
            })?;
    }

    if let Some(caps) = AREA_RE.captures(text) {
        details.square_footage = caps[1]
            .replace(',', "")
            .parse()
            .map_err(|_| ExtractionError::InvalidNumber {
                field: "square_footage",
                text: caps[1].to_string(),
            })?;
    }

    Ok(details)
}

struct CompiledSelectors {
    card: Selector,
    link: Selector,
    price: Selector,
    address: Selector,
    details: Selector,
    image: Selector,
}

impl CompiledSelectors {
    fn compile(selectors: &CardSelectors) -> Result<Self, ConfigError> {
        Ok(Self {
            card: compile_selector(&selectors.card)?,
            link: compile_selector(&selectors.link)?,
            price: compile_selector(&selectors.price)?,
            address: compile_selector(&selectors.address)?,
            details: compile_selector(&selectors.details)?,
            image: compile_selector(&selectors.image)?,
        })
    }
}

fn compile_selector(css: &str) -> Result<Selector, ConfigError> {
    Selector::parse(css).map_err(|e| ConfigError::InvalidSelector(format!("'{}': {}", css, e)))
}

/// Parses index-page markup into listing records for one source
pub struct ListingExtractor {
    source_name: String,
    base_url: Url,
    selectors: CompiledSelectors,
    gate: Arc<PolicyGate>,
}

impl ListingExtractor {
    pub fn new(
        source_name: &str,
        base_url: Url,
        selectors: &CardSelectors,
        gate: Arc<PolicyGate>,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            source_name: source_name.to_string(),
            base_url,
            selectors: CompiledSelectors::compile(selectors)?,
            gate,
        })
    }

    /// Extracts every valid listing card from `markup`
    ///
    /// Pages without cards yield an empty vector. A card that cannot be
    /// parsed is logged and skipped; cards without a link or whose link is
    /// disallowed are skipped silently. Calling this twice on the same
    /// input yields the same records apart from timestamps.
    pub fn extract(&self, markup: &str, location: &str) -> Vec<ListingRecord> {
        let document = Html::parse_document(markup);
        let context = LocationContext::parse(location);
        let now = Utc::now();

        let mut records = Vec::new();
        let mut cards = 0usize;

        for card in document.select(&self.selectors.card) {
            cards += 1;
            match self.parse_card(card, &context, now) {
                Ok(Some(record)) => records.push(record),
                Ok(None) => {}
                Err(e) => tracing::error!("Error parsing listing card on {}: {}", location, e),
            }
        }

        tracing::debug!(
            "Found {} listing cards for {}, extracted {} records",
            cards,
            location,
            records.len()
        );

        records
    }

    fn parse_card(
        &self,
        card: ElementRef<'_>,
        context: &LocationContext,
        now: DateTime<Utc>,
    ) -> Result<Option<ListingRecord>, ExtractionError> {
        let Some(link) = card.select(&self.selectors.link).next() else {
            return Ok(None);
        };

        let href = match link.value().attr("href").map(str::trim) {
            Some(href) if !href.is_empty() => href,
            _ => return Ok(None),
        };

        let url = self.resolve_link(href)?;
        if !self.gate.is_allowed(url.as_str()) {
            tracing::warn!("URL {} is not allowed by crawl policy. Skipping.", url);
            return Ok(None);
        }

        let title = match element_text(link) {
            text if text.is_empty() => DEFAULT_TITLE.to_string(),
            text => text,
        };

        let price = self
            .first_text(card, &self.selectors.price)
            .map(|text| parse_price(&text))
            .unwrap_or(0.0);

        let address = self
            .first_text(card, &self.selectors.address)
            .unwrap_or_default();

        let details = match self.first_text(card, &self.selectors.details) {
            Some(text) => parse_details(&text)?,
            None => UnitDetails::default(),
        };

        let image_url = card
            .select(&self.selectors.image)
            .next()
            .and_then(|img| {
                non_empty_attr(img, "src").or_else(|| non_empty_attr(img, "data-src"))
            })
            .unwrap_or_default();

        Ok(Some(ListingRecord {
            title,
            url: url.to_string(),
            price,
            bedrooms: details.bedrooms,
            bathrooms: details.bathrooms,
            square_footage: details.square_footage,
            address,
            city: context.city.clone(),
            state: context.state.clone(),
            image_url,
            source: self.source_name.clone(),
            is_available: true,
            created_at: now,
            updated_at: now,
        }))
    }

    /// Resolves a card link against the source's base URL
    fn resolve_link(&self, href: &str) -> Result<Url, ExtractionError> {
        let url = self
            .base_url
            .join(href)
            .map_err(|e| ExtractionError::InvalidLink {
                href: href.to_string(),
                reason: e.to_string(),
            })?;

        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ExtractionError::InvalidLink {
                href: href.to_string(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }

        Ok(url)
    }

    fn first_text(&self, card: ElementRef<'_>, selector: &Selector) -> Option<String> {
        card.select(selector).next().map(element_text)
    }
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn non_empty_attr(element: ElementRef<'_>, name: &str) -> Option<String> {
    element
        .value()
        .attr(name)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
