pub mod fetch;
pub mod orchestrator;
pub mod walker;

pub use fetch::{FetchService, HttpPageFetcher, PageFetcher};
pub use orchestrator::RunOrchestrator;
pub use walker::ReviewWalker;
