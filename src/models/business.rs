use serde::{Deserialize, Serialize};

/// Ordinal price tier derived from the site's `$`..`$$$$` markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PriceRange {
    Budget,
    Moderate,
    Pricey,
    Splurge,
}

impl PriceRange {
    pub fn from_tier(tier: u8) -> Option<Self> {
        match tier {
            1 => Some(PriceRange::Budget),
            2 => Some(PriceRange::Moderate),
            3 => Some(PriceRange::Pricey),
            4 => Some(PriceRange::Splurge),
            _ => None,
        }
    }

    /// The marker string as rendered on the page.
    pub fn symbol(&self) -> &'static str {
        match self {
            PriceRange::Budget => "$",
            PriceRange::Moderate => "$$",
            PriceRange::Pricey => "$$$",
            PriceRange::Splurge => "$$$$",
        }
    }
}

/// Per-star review counts as shown on the first page. The sum is allowed to
/// disagree with `total_reviews`; the site filters some reviews out of the
/// headline count and we preserve both values as observed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingHistogram {
    counts: [u32; 5],
}

impl RatingHistogram {
    pub fn record(&mut self, rating: u8) {
        if (1..=5).contains(&rating) {
            self.counts[(rating - 1) as usize] += 1;
        }
    }

    pub fn count_for(&self, rating: u8) -> u32 {
        if (1..=5).contains(&rating) {
            self.counts[(rating - 1) as usize]
        } else {
            0
        }
    }
}

/// Business metadata extracted once, from page 1 of a walk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessRecord {
    pub business_url: String,
    pub business_name: Option<String>,
    pub average_rating: Option<f64>,
    pub total_reviews: Option<u32>,
    pub price_range: Option<PriceRange>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub rating_histogram: RatingHistogram,
}

impl BusinessRecord {
    pub fn empty(business_url: &str) -> Self {
        Self {
            business_url: business_url.to_string(),
            business_name: None,
            average_rating: None,
            total_reviews: None,
            price_range: None,
            address: None,
            phone: None,
            rating_histogram: RatingHistogram::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_ignores_out_of_range() {
        let mut hist = RatingHistogram::default();
        hist.record(5);
        hist.record(5);
        hist.record(0);
        hist.record(6);

        assert_eq!(hist.count_for(5), 2);
        assert_eq!(hist.count_for(1), 0);
    }

    #[test]
    fn price_tiers_are_ordered() {
        assert!(PriceRange::Budget < PriceRange::Splurge);
        assert_eq!(PriceRange::from_tier(3), Some(PriceRange::Pricey));
        assert_eq!(PriceRange::from_tier(5), None);
        assert_eq!(PriceRange::Moderate.symbol(), "$$");
    }
}
