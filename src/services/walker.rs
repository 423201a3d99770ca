use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::dedup::Deduplicator;
use crate::error::{Error, Result};
use crate::extractors::page::PageParser;
use crate::filters::{self, FilterSpec};
use crate::models::{BusinessRecord, WalkOutcome};
use crate::services::fetch::FetchService;

/// Listing pages carry ten reviews each; page N starts at offset (N-1)*10.
pub const REVIEWS_PER_PAGE: u32 = 10;

/// Drives one business's fetch-parse-filter-dedup cycle from page 1 until a
/// terminal condition: no review nodes, no next-page affordance, the page
/// cap, a provably-exceeded date lower bound, or an exhausted fetch budget.
pub struct ReviewWalker {
    fetch: FetchService,
    parser: Arc<PageParser>,
    filter: FilterSpec,
    shutdown: watch::Receiver<bool>,
}

impl ReviewWalker {
    pub fn new(
        fetch: FetchService,
        parser: Arc<PageParser>,
        filter: FilterSpec,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            fetch,
            parser,
            filter,
            shutdown,
        }
    }

    /// Walks one business to completion. An error here means nothing at all
    /// was extracted (page 1 never arrived or the URL is unusable); partial
    /// outcomes after a mid-walk fetch failure are returned as `Ok` with the
    /// `partial` flag set.
    pub async fn walk(&self, business_url: &str) -> Result<WalkOutcome> {
        let mut business: Option<BusinessRecord> = None;
        let mut admitted = Vec::new();
        let mut dedup = Deduplicator::new();
        let mut partial = false;
        let mut pages_fetched = 0u32;
        let mut page = 1u32;

        loop {
            let page_url = self.page_url(business_url, page)?;
            debug!(business_url = business_url, page = page, url = %page_url, "Fetching page");

            let html = match self.fetch.fetch_page(&page_url).await {
                Ok(html) => html,
                Err(e) => {
                    if page == 1 {
                        // Nothing extracted at all; let the orchestrator
                        // record this URL as failed.
                        return Err(e);
                    }
                    warn!(
                        business_url = business_url,
                        page = page,
                        error = %e,
                        "Page fetch exhausted retries, ending walk with partial results"
                    );
                    partial = true;
                    break;
                }
            };

            pages_fetched += 1;
            let extract = self.parser.parse_page(&html, business_url, page);

            if let Some(record) = extract.business {
                business = Some(record);
            }

            let node_count = extract.reviews.len() as u32 + extract.dropped;
            let oldest_on_page = extract.reviews.iter().map(|r| r.review_date).min();

            for review in extract.reviews {
                if !filters::passes(&review, &self.filter) {
                    continue;
                }
                if dedup.admit(&review) {
                    // The histogram summarizes what page 1 contributes to the
                    // output, so only admitted reviews count toward it.
                    if page == 1 {
                        if let Some(record) = business.as_mut() {
                            record.rating_histogram.record(review.rating);
                        }
                    }
                    admitted.push(review);
                } else {
                    debug!(
                        business_url = business_url,
                        page = page,
                        reviewer = review.reviewer_name,
                        "Duplicate review skipped"
                    );
                }
            }

            if node_count == 0 {
                debug!(business_url = business_url, page = page, "Empty page, walk done");
                break;
            }
            if !extract.has_next {
                debug!(business_url = business_url, page = page, "No next page, walk done");
                break;
            }
            if page >= self.filter.max_pages {
                debug!(
                    business_url = business_url,
                    max_pages = self.filter.max_pages,
                    "Page cap reached, walk done"
                );
                break;
            }
            // Under newest-first order, once a page's oldest review predates
            // the lower bound every later page is older still.
            if let (true, Some(from), Some(oldest)) =
                (self.filter.newest_first(), self.filter.date_from, oldest_on_page)
            {
                if oldest < from {
                    debug!(
                        business_url = business_url,
                        page = page,
                        oldest = %oldest,
                        "Oldest review predates date_from, stopping early"
                    );
                    break;
                }
            }
            if *self.shutdown.borrow() {
                info!(
                    business_url = business_url,
                    page = page,
                    "Stop signal received, finishing walk after current page"
                );
                partial = true;
                break;
            }

            page += 1;
        }

        let business = business.unwrap_or_else(|| BusinessRecord::empty(business_url));

        info!(
            business_url = business_url,
            pages = pages_fetched,
            admitted = admitted.len(),
            partial = partial,
            "Walk complete"
        );

        Ok(WalkOutcome {
            business,
            reviews: admitted,
            pages_fetched,
            partial,
        })
    }

    /// Page N's URL: the business URL with the review offset and requested
    /// sort order appended.
    fn page_url(&self, business_url: &str, page: u32) -> Result<String> {
        let mut url = url::Url::parse(business_url).map_err(|e| Error::InvalidUrl {
            url: business_url.to_string(),
            reason: e.to_string(),
        })?;

        if page > 1 || self.filter.sort.is_some() {
            let mut pairs = url.query_pairs_mut();
            if page > 1 {
                pairs.append_pair("start", &((page - 1) * REVIEWS_PER_PAGE).to_string());
            }
            if let Some(sort) = self.filter.sort {
                pairs.append_pair("sort_by", sort.query_value());
            }
        }

        Ok(url.to_string())
    }
}
