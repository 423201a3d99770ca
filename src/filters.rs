use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ScraperConfig;
use crate::error::{Error, Result};
use crate::extractors::normalize;
use crate::models::ReviewRecord;

/// Requested visit order for a walk. Mapped onto the site's `sort_by`
/// query parameter; never used to reorder after the fact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
    HighestRated,
    LowestRated,
}

impl SortOrder {
    pub fn query_value(&self) -> &'static str {
        match self {
            SortOrder::NewestFirst => "date_desc",
            SortOrder::OldestFirst => "date_asc",
            SortOrder::HighestRated => "rating_desc",
            SortOrder::LowestRated => "rating_asc",
        }
    }

    fn from_str(raw: &str) -> Result<Self> {
        match raw {
            "newest_first" => Ok(SortOrder::NewestFirst),
            "oldest_first" => Ok(SortOrder::OldestFirst),
            "highest_rated" => Ok(SortOrder::HighestRated),
            "lowest_rated" => Ok(SortOrder::LowestRated),
            other => Err(Error::InvalidFilter(format!("unknown sort order {other:?}"))),
        }
    }
}

/// User-supplied rating/date bounds plus walk limits. Validated once before
/// any walk starts; invalid bounds abort the whole run.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub min_rating: Option<u8>,
    pub max_rating: Option<u8>,
    pub date_from: Option<DateTime<FixedOffset>>,
    pub date_to: Option<DateTime<FixedOffset>>,
    pub sort: Option<SortOrder>,
    pub max_pages: u32,
}

impl FilterSpec {
    pub fn from_settings(scraper: &ScraperConfig) -> Result<Self> {
        let parse_bound = |raw: &Option<String>, name: &str| -> Result<Option<DateTime<FixedOffset>>> {
            match raw.as_deref().filter(|s| !s.is_empty()) {
                None => Ok(None),
                Some(text) => normalize::parse_date(text)
                    .map(Some)
                    .ok_or_else(|| Error::InvalidFilter(format!("malformed {name}: {text:?}"))),
            }
        };

        let spec = Self {
            min_rating: scraper.min_rating,
            max_rating: scraper.max_rating,
            date_from: parse_bound(&scraper.date_from, "date_from")?,
            date_to: parse_bound(&scraper.date_to, "date_to")?,
            sort: scraper
                .sort
                .as_deref()
                .filter(|s| !s.is_empty())
                .map(SortOrder::from_str)
                .transpose()?,
            max_pages: scraper.max_pages,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, bound) in [("min_rating", self.min_rating), ("max_rating", self.max_rating)] {
            if let Some(value) = bound {
                if !(1..=5).contains(&value) {
                    return Err(Error::InvalidFilter(format!(
                        "{name} must be between 1 and 5, got {value}"
                    )));
                }
            }
        }
        if let (Some(min), Some(max)) = (self.min_rating, self.max_rating) {
            if min > max {
                return Err(Error::InvalidFilter(format!(
                    "min_rating {min} exceeds max_rating {max}"
                )));
            }
        }
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(Error::InvalidFilter(format!(
                    "date_from {from} is after date_to {to}"
                )));
            }
        }
        if self.max_pages == 0 {
            return Err(Error::InvalidFilter("max_pages must be at least 1".into()));
        }
        Ok(())
    }

    /// True when the walk visits reviews newest-first, which makes the
    /// date_from early stop sound.
    pub fn newest_first(&self) -> bool {
        matches!(self.sort, None | Some(SortOrder::NewestFirst))
    }
}

/// Stateless predicate over a single review. Rating bounds default to 1..=5,
/// date bounds to open, when unset.
pub fn passes(review: &ReviewRecord, spec: &FilterSpec) -> bool {
    let min = spec.min_rating.unwrap_or(1);
    let max = spec.max_rating.unwrap_or(5);
    if review.rating < min || review.rating > max {
        debug!(
            reviewer = review.reviewer_name,
            rating = review.rating,
            "Review outside rating bounds"
        );
        return false;
    }

    if let Some(from) = spec.date_from {
        if review.review_date < from {
            return false;
        }
    }
    if let Some(to) = spec.date_to {
        if review.review_date > to {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReactionCounts, ReviewerStats};

    fn spec() -> FilterSpec {
        FilterSpec {
            min_rating: None,
            max_rating: None,
            date_from: None,
            date_to: None,
            sort: None,
            max_pages: 10,
        }
    }

    fn review(rating: u8, date: &str) -> ReviewRecord {
        ReviewRecord {
            reviewer_name: "A".into(),
            reviewer_avatar_url: None,
            reviewer_stats: ReviewerStats::default(),
            reviewer_location: None,
            rating,
            review_date: format!("{date}T00:00:00+00:00").parse().unwrap(),
            review_text: String::new(),
            media_urls: vec![],
            reaction_counts: ReactionCounts::default(),
            business_response: None,
        }
    }

    #[test]
    fn open_bounds_admit_everything() {
        let spec = spec();
        assert!(passes(&review(1, "2020-01-01"), &spec));
        assert!(passes(&review(5, "2030-01-01"), &spec));
    }

    #[test]
    fn rating_bounds_are_inclusive() {
        let mut spec = spec();
        spec.min_rating = Some(3);
        spec.max_rating = Some(4);

        assert!(!passes(&review(2, "2024-01-01"), &spec));
        assert!(passes(&review(3, "2024-01-01"), &spec));
        assert!(passes(&review(4, "2024-01-01"), &spec));
        assert!(!passes(&review(5, "2024-01-01"), &spec));
    }

    #[test]
    fn date_bounds_are_inclusive() {
        let mut spec = spec();
        spec.date_from = Some("2024-01-01T00:00:00+00:00".parse().unwrap());
        spec.date_to = Some("2024-06-30T00:00:00+00:00".parse().unwrap());

        assert!(!passes(&review(4, "2023-12-31"), &spec));
        assert!(passes(&review(4, "2024-01-01"), &spec));
        assert!(passes(&review(4, "2024-06-30"), &spec));
        assert!(!passes(&review(4, "2024-07-01"), &spec));
    }

    #[test]
    fn inverted_rating_bounds_rejected() {
        let mut spec = spec();
        spec.min_rating = Some(4);
        spec.max_rating = Some(2);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn inverted_date_bounds_rejected() {
        let mut spec = spec();
        spec.date_from = Some("2024-06-01T00:00:00+00:00".parse().unwrap());
        spec.date_to = Some("2024-01-01T00:00:00+00:00".parse().unwrap());
        assert!(spec.validate().is_err());
    }

    #[test]
    fn out_of_range_rating_rejected() {
        let mut spec = spec();
        spec.min_rating = Some(0);
        assert!(spec.validate().is_err());
        let mut spec = self::spec();
        spec.max_rating = Some(6);
        assert!(spec.validate().is_err());
    }

    #[test]
    fn sort_parsing_and_early_stop_eligibility() {
        assert_eq!(SortOrder::from_str("newest_first").unwrap(), SortOrder::NewestFirst);
        assert!(SortOrder::from_str("by_vibes").is_err());

        let mut spec = spec();
        assert!(spec.newest_first());
        spec.sort = Some(SortOrder::HighestRated);
        assert!(!spec.newest_first());
    }
}
