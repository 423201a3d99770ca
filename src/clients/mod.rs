pub mod http;
pub mod pool;

pub use http::HttpClient;
pub use pool::ClientPool;
