use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewerStats {
    pub review_count: Option<u32>,
    pub friend_count: Option<u32>,
    pub photo_count: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionCounts {
    pub helpful: u32,
    pub thanks: u32,
    pub love_this: u32,
    pub oh_no: u32,
}

/// Owner reply attached to a review, when the business responded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessResponse {
    pub author_name: Option<String>,
    pub date: Option<DateTime<FixedOffset>>,
    pub content: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub reviewer_name: String,
    pub reviewer_avatar_url: Option<String>,
    pub reviewer_stats: ReviewerStats,
    pub reviewer_location: Option<String>,
    /// Required: reviews without a parseable rating never reach this struct.
    pub rating: u8,
    /// Required: carries an explicit UTC offset, never a defaulted "now".
    pub review_date: DateTime<FixedOffset>,
    pub review_text: String,
    pub media_urls: Vec<String>,
    pub reaction_counts: ReactionCounts,
    pub business_response: Option<BusinessResponse>,
}

impl ReviewRecord {
    /// Dedup identity within one business walk. The business URL component
    /// of the spec-level identity tuple is constant per walk, so it is
    /// carried by the walk itself rather than by every key.
    pub fn identity_key(&self) -> ReviewKey {
        ReviewKey {
            reviewer_name: self.reviewer_name.clone(),
            review_date: self.review_date,
            review_text: self.review_text.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReviewKey {
    pub reviewer_name: String,
    pub review_date: DateTime<FixedOffset>,
    pub review_text: String,
}
