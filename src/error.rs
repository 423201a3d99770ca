use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] rquest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Forbidden - Access denied")]
    Forbidden,

    #[error("Unexpected status {status} fetching {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Fetch retries exhausted for {url} after {attempts} attempts: {source}")]
    FetchExhausted {
        url: String,
        attempts: u32,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid selector: {0}")]
    Selector(String),

    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid filter configuration: {0}")]
    InvalidFilter(String),

    #[error("No input URLs: {0}")]
    EmptyInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}
