mod business;
mod export;
mod review;

pub use business::{BusinessRecord, PriceRange, RatingHistogram};
pub use export::{BusinessResult, ReviewRow, ReviewerDetails, WalkOutcome};
pub use review::{BusinessResponse, ReactionCounts, ReviewKey, ReviewRecord, ReviewerStats};
