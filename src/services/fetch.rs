use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::clients::ClientPool;
use crate::error::{Error, Result};
use crate::utils::{RateLimiter, retry_with_backoff};

/// The walk's only suspension point. Kept behind a trait so walks can be
/// driven against scripted page sets in tests.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String>;
}

/// Live fetcher: rotates through the emulated client pool.
pub struct HttpPageFetcher {
    client_pool: Arc<ClientPool>,
}

impl HttpPageFetcher {
    pub fn new(client_pool: Arc<ClientPool>) -> Self {
        Self { client_pool }
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String> {
        let client = self.client_pool.next_client();
        let request = client.get(url);
        let response = client.send(request).await?;
        let body = response.text().await?;
        debug!(url = url, bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Centralized fetch policy: every page request passes through the shared
/// rate limiter and the retry/backoff budget, regardless of caller.
#[derive(Clone)]
pub struct FetchService {
    fetcher: Arc<dyn PageFetcher>,
    limiter: Arc<RateLimiter>,
    max_retries: u32,
    base_delay_ms: u64,
}

impl FetchService {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        limiter: Arc<RateLimiter>,
        max_retries: u32,
        base_delay_ms: u64,
    ) -> Self {
        Self {
            fetcher,
            limiter,
            max_retries,
            base_delay_ms,
        }
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        retry_with_backoff(self.max_retries, self.base_delay_ms, || async {
            self.limiter.acquire().await;
            self.fetcher.fetch(url).await
        })
        .await
        .map_err(|e| {
            warn!(url = url, error = %e, "Fetch retries exhausted");
            Error::FetchExhausted {
                url: url.to_string(),
                attempts: self.max_retries + 1,
                source: Box::new(e),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    struct FlakyFetcher {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl PageFetcher for FlakyFetcher {
        async fn fetch(&self, _url: &str) -> Result<String> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(Error::RateLimit)
            } else {
                Ok("<html></html>".to_string())
            }
        }
    }

    fn service(fetcher: Arc<dyn PageFetcher>, retries: u32) -> FetchService {
        FetchService::new(
            fetcher,
            Arc::new(RateLimiter::new(Duration::from_millis(10))),
            retries,
            50,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_within_retry_budget() {
        let fetcher = Arc::new(FlakyFetcher {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let svc = service(fetcher.clone(), 3);

        let body = svc.fetch_page("https://example.com/biz/x").await.unwrap();
        assert_eq!(body, "<html></html>");
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_becomes_typed_error() {
        let fetcher = Arc::new(FlakyFetcher {
            failures: u32::MAX,
            calls: AtomicU32::new(0),
        });
        let svc = service(fetcher, 2);

        let err = svc.fetch_page("https://example.com/biz/x").await.unwrap_err();
        assert!(matches!(err, Error::FetchExhausted { attempts: 3, .. }));
    }
}
