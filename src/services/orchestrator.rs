use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, watch};
use tracing::{error, info, warn};

use crate::extractors::page::PageParser;
use crate::filters::FilterSpec;
use crate::models::BusinessResult;
use crate::services::fetch::FetchService;
use crate::services::walker::ReviewWalker;

/// Runs every input URL through a walk, with a fixed-width worker pool.
/// Workers drain a shared queue; results are buffered by input index so the
/// output order always matches the input order, whatever order walks finish
/// in. One failed business never aborts its siblings.
pub struct RunOrchestrator {
    fetch: FetchService,
    parser: Arc<PageParser>,
    filter: FilterSpec,
    concurrency: usize,
    shutdown: watch::Receiver<bool>,
}

impl RunOrchestrator {
    pub fn new(
        fetch: FetchService,
        parser: Arc<PageParser>,
        filter: FilterSpec,
        concurrency: usize,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fetch,
            parser,
            filter,
            concurrency: concurrency.max(1),
            shutdown,
        }
    }

    pub async fn run(&self, urls: Vec<String>) -> Vec<BusinessResult> {
        let total = urls.len();
        let queue: Arc<Mutex<VecDeque<(usize, String)>>> =
            Arc::new(Mutex::new(urls.into_iter().enumerate().collect()));
        let results: Arc<Mutex<Vec<Option<BusinessResult>>>> =
            Arc::new(Mutex::new(vec![None; total]));

        info!(
            businesses = total,
            workers = self.concurrency,
            "Starting run"
        );

        let mut workers = Vec::with_capacity(self.concurrency);
        for worker_id in 0..self.concurrency {
            let queue = Arc::clone(&queue);
            let results = Arc::clone(&results);
            let walker = ReviewWalker::new(
                self.fetch.clone(),
                Arc::clone(&self.parser),
                self.filter.clone(),
                self.shutdown.clone(),
            );
            let shutdown = self.shutdown.clone();

            workers.push(tokio::spawn(async move {
                loop {
                    if *shutdown.borrow() {
                        info!(worker_id = worker_id, "Stop signal received, worker exiting");
                        break;
                    }

                    let Some((index, url)) = queue.lock().await.pop_front() else {
                        break;
                    };

                    info!(
                        worker_id = worker_id,
                        business_index = index + 1,
                        businesses = total,
                        business_url = url,
                        "Processing business"
                    );

                    let result = match walker.walk(&url).await {
                        Ok(outcome) => BusinessResult::Completed(outcome),
                        Err(e) => {
                            error!(
                                business_url = url,
                                error = %e,
                                "Business walk failed"
                            );
                            BusinessResult::Failed {
                                business_url: url,
                                reason: e.to_string(),
                            }
                        }
                    };

                    results.lock().await[index] = Some(result);
                }
            }));
        }

        for worker in workers {
            if let Err(e) = worker.await {
                error!(error = %e, "Worker task panicked");
            }
        }

        let results = Arc::try_unwrap(results)
            .expect("workers joined")
            .into_inner();

        results
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.unwrap_or_else(|| {
                    warn!(business_index = index + 1, "Business skipped by shutdown");
                    BusinessResult::Failed {
                        business_url: format!("input #{}", index + 1),
                        reason: "run cancelled before this business started".to_string(),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::services::fetch::PageFetcher;
    use crate::utils::RateLimiter;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::time::Duration;

    /// Maps business slugs to a single page of canned HTML; unknown slugs
    /// always fail.
    struct SlugFetcher {
        pages: HashMap<String, String>,
    }

    #[async_trait]
    impl PageFetcher for SlugFetcher {
        async fn fetch(&self, url: &str) -> Result<String> {
            let slug = url
                .trim_end_matches('/')
                .rsplit('/')
                .next()
                .unwrap_or_default()
                .to_string();
            self.pages
                .get(&slug)
                .cloned()
                .ok_or(Error::UnexpectedStatus {
                    status: 503,
                    url: url.to_string(),
                })
        }
    }

    fn single_review_page(name: &str) -> String {
        format!(
            r#"<html><body><h1>{name}</h1>
               <ul><li data-review-id="r1">
                 <a href="/user_details?userid=u1">Dana K.</a>
                 <div aria-label="5 star rating"></div>
                 <span>Mar 3, 2024</span>
                 <p>Wonderful spot, will absolutely be coming back.</p>
               </li></ul></body></html>"#
        )
    }

    fn filter() -> FilterSpec {
        FilterSpec {
            min_rating: None,
            max_rating: None,
            date_from: None,
            date_to: None,
            sort: None,
            max_pages: 5,
        }
    }

    fn orchestrator(
        pages: HashMap<String, String>,
        concurrency: usize,
    ) -> (RunOrchestrator, watch::Sender<bool>) {
        let fetch = FetchService::new(
            Arc::new(SlugFetcher { pages }),
            Arc::new(RateLimiter::new(Duration::from_millis(1))),
            1,
            10,
        );
        let (tx, rx) = watch::channel(false);
        let orch = RunOrchestrator::new(
            fetch,
            Arc::new(PageParser::new().unwrap()),
            filter(),
            concurrency,
            rx,
        );
        (orch, tx)
    }

    #[tokio::test(start_paused = true)]
    async fn failed_business_does_not_abort_siblings() {
        let mut pages = HashMap::new();
        pages.insert("alpha".to_string(), single_review_page("Alpha"));
        pages.insert("gamma".to_string(), single_review_page("Gamma"));

        let urls = vec![
            "https://www.yelp.com/biz/alpha".to_string(),
            "https://www.yelp.com/biz/beta".to_string(),
            "https://www.yelp.com/biz/gamma".to_string(),
        ];

        let (orch, _tx) = orchestrator(pages, 2);
        let results = orch.run(urls).await;

        assert_eq!(results.len(), 3);
        assert!(matches!(results[0], BusinessResult::Completed(_)));
        assert!(results[1].is_failure());
        assert!(matches!(results[2], BusinessResult::Completed(_)));

        // Input order survives out-of-order worker completion.
        if let BusinessResult::Completed(outcome) = &results[0] {
            assert_eq!(outcome.business.business_url, "https://www.yelp.com/biz/alpha");
        }
        if let BusinessResult::Completed(outcome) = &results[2] {
            assert_eq!(outcome.business.business_url, "https://www.yelp.com/biz/gamma");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_prevents_new_walks() {
        let mut pages = HashMap::new();
        for slug in ["a", "b", "c", "d"] {
            pages.insert(slug.to_string(), single_review_page(slug));
        }
        let urls: Vec<String> = ["a", "b", "c", "d"]
            .iter()
            .map(|s| format!("https://www.yelp.com/biz/{s}"))
            .collect();

        let (orch, tx) = orchestrator(pages, 1);
        tx.send(true).unwrap();

        let results = orch.run(urls).await;
        assert_eq!(results.len(), 4);
        assert!(results.iter().all(BusinessResult::is_failure));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_input_is_an_empty_run() {
        let (orch, _tx) = orchestrator(HashMap::new(), 2);
        let results = orch.run(vec![]).await;
        assert!(results.is_empty());
    }
}
