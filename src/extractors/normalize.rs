//! Pure text-to-typed-value conversions for the fields found on listing
//! pages. Every function here absorbs malformed input and answers `None`;
//! callers decide whether a gap disqualifies the record.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::LazyLock;

use crate::models::PriceRange;

static INT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)").expect("static regex"));
static FLOAT_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)").expect("static regex"));

/// Star rating for a single review: the leading integer of tokens such as
/// "5 star rating". Out-of-range or digit-free input is missing.
pub fn parse_rating(raw: &str) -> Option<u8> {
    let m = INT_TOKEN.find(raw)?;
    let value: u8 = m.as_str().parse().ok()?;
    (1..=5).contains(&value).then_some(value)
}

/// Business-level average, e.g. "4.5 star rating".
pub fn parse_fractional_rating(raw: &str) -> Option<f64> {
    let m = FLOAT_TOKEN.find(raw)?;
    let value: f64 = m.as_str().parse().ok()?;
    (0.0..=5.0).contains(&value).then_some(value)
}

/// Leading integer of free text like "227 reviews" or "3,413", with
/// thousands separators stripped. No digits means missing.
pub fn parse_count(raw: &str) -> Option<u32> {
    let start = raw.find(|c: char| c.is_ascii_digit())?;
    let run: String = raw[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',')
        .filter(|c| c.is_ascii_digit())
        .collect();
    run.parse().ok()
}

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%Y-%m-%d"];

/// Parses the site's date forms into a timestamp with an explicit offset.
/// Zone-less inputs resolve to UTC; date-only inputs to midnight UTC.
/// Never falls back to the current time or the epoch.
pub fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, format) {
            return naive.and_local_timezone(utc).single();
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, format) {
            return date.and_hms_opt(0, 0, 0)?.and_local_timezone(utc).single();
        }
    }

    None
}

/// Maps repeated currency markers ("$".."$$$$") to an ordinal tier.
pub fn parse_price_range(raw: &str) -> Option<PriceRange> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c == '$') {
        return None;
    }
    PriceRange::from_tier(trimmed.len() as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn rating_accepts_star_labels() {
        assert_eq!(parse_rating("5 star rating"), Some(5));
        assert_eq!(parse_rating("1 star rating"), Some(1));
        assert_eq!(parse_rating("Rated 3 out of 5"), Some(3));
    }

    #[test]
    fn rating_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_rating("0 star rating"), None);
        assert_eq!(parse_rating("6 star rating"), None);
        assert_eq!(parse_rating("no stars here"), None);
        assert_eq!(parse_rating(""), None);
    }

    #[test]
    fn fractional_rating_bounds() {
        assert_eq!(parse_fractional_rating("4.5 star rating"), Some(4.5));
        assert_eq!(parse_fractional_rating("5 star rating"), Some(5.0));
        assert_eq!(parse_fractional_rating("7.2 star rating"), None);
    }

    #[test]
    fn count_parses_any_digit_bearing_string() {
        assert_eq!(parse_count("227 reviews"), Some(227));
        assert_eq!(parse_count("3,413"), Some(3413));
        assert_eq!(parse_count("(1,024 photos)"), Some(1024));
        assert_eq!(parse_count("7"), Some(7));
    }

    #[test]
    fn count_missing_when_no_digits() {
        assert_eq!(parse_count("reviews"), None);
        assert_eq!(parse_count(""), None);
        assert_eq!(parse_count("none"), None);
    }

    #[test]
    fn date_forms_resolve_to_explicit_offset() {
        let d = parse_date("Mar 3, 2024").unwrap();
        assert_eq!(d.to_rfc3339(), "2024-03-03T00:00:00+00:00");

        let d = parse_date("March 14, 2023").unwrap();
        assert_eq!(d.to_rfc3339(), "2023-03-14T00:00:00+00:00");

        let d = parse_date("7/4/2022").unwrap();
        assert_eq!(d.to_rfc3339(), "2022-07-04T00:00:00+00:00");

        let d = parse_date("2024-01-15T08:30:00-05:00").unwrap();
        assert_eq!(d.hour(), 8);
        assert_eq!(d.offset().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn date_never_defaults() {
        assert_eq!(parse_date("last Tuesday"), None);
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("Updated review"), None);
    }

    #[test]
    fn price_tiers() {
        assert_eq!(parse_price_range("$"), Some(PriceRange::Budget));
        assert_eq!(parse_price_range("$$$"), Some(PriceRange::Pricey));
        assert_eq!(parse_price_range("$$$$$"), None);
        assert_eq!(parse_price_range("$5"), None);
        assert_eq!(parse_price_range("cheap"), None);
    }
}
