//! Plain HTTP fetching over reqwest, with host politeness built in.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace};

use docmill_shared::{DocmillError, FetchResponse, Fetcher, Result};

/// Identifies Docmill to the sites it crawls.
const USER_AGENT: &str = concat!("Docmill/", env!("CARGO_PKG_VERSION"));

/// Maximum redirects before a fetch is considered broken.
const MAX_REDIRECTS: usize = 5;

/// [`Fetcher`] backed by a shared reqwest client. One instance serves a
/// whole run; the politeness delay is tracked across all callers.
pub struct HttpFetcher {
    client: reqwest::Client,
    last_request: Mutex<Option<Instant>>,
}

impl HttpFetcher {
    /// Build a fetcher with the given per-request timeout.
    pub fn new(timeout_ms: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_millis(timeout_ms))
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| DocmillError::Transport(format!("http client: {e}")))?;

        Ok(Self {
            client,
            last_request: Mutex::new(None),
        })
    }

    /// Sleep until at least `min_delay_ms` has passed since the previous
    /// request issued through this fetcher.
    async fn respect_rate_limit(&self, min_delay_ms: u64) {
        if min_delay_ms == 0 {
            *self.last_request.lock().await = Some(Instant::now());
            return;
        }

        let mut last = self.last_request.lock().await;
        if let Some(prev) = *last {
            let min = Duration::from_millis(min_delay_ms);
            let elapsed = prev.elapsed();
            if elapsed < min {
                trace!(wait_ms = (min - elapsed).as_millis() as u64, "rate limit");
                tokio::time::sleep(min - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str, min_delay_ms: u64) -> Result<FetchResponse> {
        self.respect_rate_limit(min_delay_ms).await;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DocmillError::Transport(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocmillError::Transport(format!("{url}: HTTP {status}")));
        }

        // Repeated response headers collapse to their first value.
        let mut headers: HashMap<String, String> = HashMap::new();
        for (name, value) in response.headers() {
            if let Ok(v) = value.to_str() {
                headers
                    .entry(name.as_str().to_string())
                    .or_insert_with(|| v.to_string());
            }
        }

        let body = response
            .text()
            .await
            .map_err(|e| DocmillError::Transport(format!("{url}: {e}")))?;

        debug!(url, status = status.as_u16(), bytes = body.len(), "fetched");

        Ok(FetchResponse {
            status: status.as_u16(),
            body,
            headers,
        })
    }
}
