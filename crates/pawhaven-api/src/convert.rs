//! Parsing of stored text columns back into API types. Rows written by this
//! server always parse; anything else is logged and replaced by a default so
//! one bad row never fails a whole listing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use tracing::warn;
use uuid::Uuid;

pub fn uuid(raw: &str, what: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt {} '{}': {}", what, raw, e);
        Uuid::default()
    })
}

pub fn opt_uuid(raw: Option<&str>, what: &str) -> Option<Uuid> {
    raw.map(|r| uuid(r, what))
}

pub fn timestamp(raw: &str, what: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt {} timestamp '{}': {}", what, raw, e);
            DateTime::<Utc>::default()
        })
}

pub fn enum_or<T: FromStr>(raw: &str, fallback: T, what: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        warn!("Corrupt {} value '{}'", what, raw);
        fallback
    })
}

pub fn opt_enum<T: FromStr>(raw: Option<&str>, what: &str) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            warn!("Corrupt {} value '{}'", what, raw);
            None
        }
    }
}

/// "First Last", or whichever half exists.
pub fn full_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

pub fn cents_to_price(cents: i64) -> f64 {
    cents as f64 / 100.0
}

pub fn price_to_cents(price: f64) -> i64 {
    (price * 100.0).round() as i64
}
