use std::collections::HashSet;

use crate::models::{ReviewKey, ReviewRecord};

/// Identity tracking for one business walk. Pagination can return the same
/// review on consecutive pages (and retries can replay a page); the first
/// occurrence wins. Dropped with the walk, never shared across businesses.
#[derive(Debug, Default)]
pub struct Deduplicator {
    seen: HashSet<ReviewKey>,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True on first occurrence of the review's identity key.
    pub fn admit(&mut self, review: &ReviewRecord) -> bool {
        self.seen.insert(review.identity_key())
    }

    pub fn seen_count(&self) -> usize {
        self.seen.len()
    }
}
