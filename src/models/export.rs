use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::models::business::BusinessRecord;
use crate::models::review::ReviewRecord;

/// One element of the output artifact: a single admitted review with its
/// parent business's fields carried inline. Key names match the established
/// artifact format consumed downstream.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRow {
    pub business_url: String,
    pub business_name: Option<String>,
    /// Rendered with one decimal place, e.g. "4.5".
    pub average_rating: Option<String>,
    pub total_reviews: Option<u32>,
    pub price_range: Option<String>,
    pub business_address: Option<String>,
    pub contact_number: Option<String>,
    pub review_counts_by_rating: BTreeMap<String, u32>,
    pub latest_reviewer_name: String,
    pub review_avatar_url: Option<String>,
    pub latest_reviewer_details: ReviewerDetails,
    pub latest_reviewer_location: Option<String>,
    pub latest_reviewer_rating: u8,
    pub review_date: DateTime<FixedOffset>,
    pub review_text: String,
    pub review_media_urls: Vec<String>,
    pub helpful_count: u32,
    pub thanks_count: u32,
    pub love_this_count: u32,
    pub oh_no_count: u32,
    pub response_author_name: Option<String>,
    pub response_date: Option<DateTime<FixedOffset>>,
    pub response_content: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewerDetails {
    pub total_reviews: u32,
    pub total_friends: u32,
    pub business_photos_uploaded: u32,
}

impl ReviewRow {
    pub fn from_records(business: &BusinessRecord, review: &ReviewRecord) -> Self {
        let review_counts_by_rating = (1..=5u8)
            .map(|stars| {
                (
                    format!("{stars}stars"),
                    business.rating_histogram.count_for(stars),
                )
            })
            .collect();

        let (response_author_name, response_date, response_content) =
            match &review.business_response {
                Some(resp) => (
                    resp.author_name.clone(),
                    resp.date,
                    resp.content.clone(),
                ),
                None => (None, None, None),
            };

        Self {
            business_url: business.business_url.clone(),
            business_name: business.business_name.clone(),
            average_rating: business.average_rating.map(|r| format!("{r:.1}")),
            total_reviews: business.total_reviews,
            price_range: business.price_range.map(|p| p.symbol().to_string()),
            business_address: business.address.clone(),
            contact_number: business.phone.clone(),
            review_counts_by_rating,
            latest_reviewer_name: review.reviewer_name.clone(),
            review_avatar_url: review.reviewer_avatar_url.clone(),
            latest_reviewer_details: ReviewerDetails {
                total_reviews: review.reviewer_stats.review_count.unwrap_or(0),
                total_friends: review.reviewer_stats.friend_count.unwrap_or(0),
                business_photos_uploaded: review.reviewer_stats.photo_count.unwrap_or(0),
            },
            latest_reviewer_location: review.reviewer_location.clone(),
            latest_reviewer_rating: review.rating,
            review_date: review.review_date,
            review_text: review.review_text.clone(),
            review_media_urls: review.media_urls.clone(),
            helpful_count: review.reaction_counts.helpful,
            thanks_count: review.reaction_counts.thanks,
            love_this_count: review.reaction_counts.love_this,
            oh_no_count: review.reaction_counts.oh_no,
            response_author_name,
            response_date,
            response_content,
        }
    }
}

/// Result of one completed business walk.
#[derive(Debug, Clone)]
pub struct WalkOutcome {
    pub business: BusinessRecord,
    pub reviews: Vec<ReviewRecord>,
    pub pages_fetched: u32,
    /// Set when the walk ended early because a page's retry budget ran out.
    pub partial: bool,
}

/// Per-URL orchestrator output, in input order.
#[derive(Debug, Clone)]
pub enum BusinessResult {
    Completed(WalkOutcome),
    Failed { business_url: String, reason: String },
}

impl BusinessResult {
    pub fn is_failure(&self) -> bool {
        matches!(self, BusinessResult::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::business::RatingHistogram;
    use crate::models::review::{ReactionCounts, ReviewerStats};

    fn sample_review() -> ReviewRecord {
        ReviewRecord {
            reviewer_name: "Dana K.".into(),
            reviewer_avatar_url: None,
            reviewer_stats: ReviewerStats {
                review_count: Some(12),
                friend_count: None,
                photo_count: Some(3),
            },
            reviewer_location: Some("Portland, OR".into()),
            rating: 4,
            review_date: "2024-03-03T00:00:00+00:00".parse().unwrap(),
            review_text: "Great pour-over.".into(),
            media_urls: vec![],
            reaction_counts: ReactionCounts::default(),
            business_response: None,
        }
    }

    #[test]
    fn flattens_business_fields_inline() {
        let mut business = BusinessRecord::empty("https://www.yelp.com/biz/sample");
        business.business_name = Some("Sample Cafe".into());
        business.average_rating = Some(4.5);
        let mut hist = RatingHistogram::default();
        hist.record(4);
        business.rating_histogram = hist;

        let row = ReviewRow::from_records(&business, &sample_review());

        assert_eq!(row.average_rating.as_deref(), Some("4.5"));
        assert_eq!(row.review_counts_by_rating["4stars"], 1);
        assert_eq!(row.review_counts_by_rating["1stars"], 0);
        assert_eq!(row.latest_reviewer_details.total_reviews, 12);
        assert_eq!(row.latest_reviewer_details.total_friends, 0);
        assert_eq!(row.latest_reviewer_rating, 4);
    }
}
