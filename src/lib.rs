pub mod clients;
pub mod config;
pub mod dedup;
pub mod error;
pub mod extractors;
pub mod filters;
pub mod input;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;
