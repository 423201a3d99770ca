use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use yelp_reviews_etl::clients::ClientPool;
use yelp_reviews_etl::config::Settings;
use yelp_reviews_etl::extractors::PageParser;
use yelp_reviews_etl::filters::FilterSpec;
use yelp_reviews_etl::input::read_url_list;
use yelp_reviews_etl::models::{BusinessResult, ReviewRow};
use yelp_reviews_etl::services::{FetchService, HttpPageFetcher, RunOrchestrator};
use yelp_reviews_etl::storage::JsonWriter;
use yelp_reviews_etl::utils::RateLimiter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = Settings::new()?;

    // Filter bounds are the one fatal misconfiguration; checked before any
    // network traffic.
    let filter = FilterSpec::from_settings(&settings.scraper)?;
    let urls = read_url_list(&settings.input.url_file).await?;

    info!(
        businesses = urls.len(),
        concurrency = settings.scraper.concurrency,
        max_pages = filter.max_pages,
        "Starting review extraction run"
    );

    let client_pool = Arc::new(ClientPool::new(&settings)?);
    let fetch = FetchService::new(
        Arc::new(HttpPageFetcher::new(client_pool)),
        Arc::new(RateLimiter::new(Duration::from_millis(
            settings.scraper.min_fetch_interval_ms,
        ))),
        settings.scraper.max_retries,
        settings.scraper.base_delay_ms,
    );
    let parser = Arc::new(PageParser::new()?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight pages then stopping");
            let _ = shutdown_tx.send(true);
        }
    });

    let orchestrator = RunOrchestrator::new(
        fetch,
        parser,
        filter,
        settings.scraper.concurrency,
        shutdown_rx,
    );

    let start = std::time::Instant::now();
    let results = orchestrator.run(urls).await;

    let mut writer =
        JsonWriter::create(&settings.output.directory, &settings.output.file_name).await?;

    let mut completed = 0usize;
    let mut partial = 0usize;
    let mut failed = 0usize;

    for result in &results {
        match result {
            BusinessResult::Completed(outcome) => {
                completed += 1;
                if outcome.partial {
                    partial += 1;
                }
                for review in &outcome.reviews {
                    let row = ReviewRow::from_records(&outcome.business, review);
                    writer.write_row(&row).await?;
                }
            }
            BusinessResult::Failed {
                business_url,
                reason,
            } => {
                failed += 1;
                error!(
                    business_url = business_url,
                    reason = reason,
                    "Business failed"
                );
            }
        }
    }

    writer.finish().await?;

    info!(
        businesses = results.len(),
        completed = completed,
        partial = partial,
        failed = failed,
        rows = writer.get_count(),
        elapsed_secs = start.elapsed().as_secs(),
        output = %writer.path().display(),
        "Run finished"
    );

    if !results.is_empty() && failed == results.len() {
        anyhow::bail!("every business URL failed");
    }

    Ok(())
}
