pub mod rate_limit;
pub mod retry;
pub mod time;

pub use rate_limit::RateLimiter;
pub use retry::retry_with_backoff;
pub use time::sleep_with_jitter;
