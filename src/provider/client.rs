//! HTTP client for the provider REST API
//!
//! Wraps `reqwest` with the shared request budget, bounded-backoff retries,
//! and decoding of the provider's paginated response envelope. The API key is
//! attached as the provider's `api_key` query parameter on every request.

use crate::config::ExhaustionPolicy;
use crate::provider::budget::RateBudget;
use crate::provider::query::QueryRequest;
use crate::provider::ProviderError;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Backoff schedule for retryable failures; a provider Retry-After header
/// overrides the delay for that step
const BACKOFF_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Provider client configuration
#[derive(Debug, Clone)]
pub struct ProviderClientConfig {
    pub api_key: String,
    pub base_url: String,
    pub timeout: Duration,
    pub policy: ExhaustionPolicy,
}

impl Default for ProviderClientConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://www.highergov.com/api-external".to_string(),
            timeout: Duration::from_secs(30),
            policy: ExhaustionPolicy::Wait,
        }
    }
}

/// One decoded page of provider results
#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    /// Raw records in provider order
    pub records: Vec<Value>,
    /// Provider-supplied total count estimate, when present
    pub total_count: Option<u64>,
    /// Page number to fetch next, when more results exist
    pub next_page: Option<u32>,
}

/// All records gathered by a bounded pagination run
#[derive(Debug, Clone, PartialEq)]
pub struct PagedRecords {
    pub records: Vec<Value>,
    pub total_count: Option<u64>,
    /// True when the result cap cut the run short of the full result set
    pub truncated: bool,
}

/// Provider response envelope
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    #[serde(default)]
    meta: ResponseMeta,
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponseMeta {
    total_count: Option<u64>,
}

/// Authenticated client for the provider API
pub struct ProviderClient {
    config: ProviderClientConfig,
    client: reqwest::Client,
    budget: Arc<RateBudget>,
}

impl ProviderClient {
    /// Create a new provider client
    ///
    /// Fails at construction, not call time, when no API key is configured.
    pub fn new(
        config: ProviderClientConfig,
        budget: Arc<RateBudget>,
    ) -> Result<Self, ProviderError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "provider API key is required".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        Ok(Self {
            config,
            client,
            budget,
        })
    }

    /// The shared request budget this client debits
    pub fn budget(&self) -> Arc<RateBudget> {
        self.budget.clone()
    }

    /// Execute a single query, retrying retryable failures
    ///
    /// Budget debits follow provider billing semantics: every attempt the
    /// provider processed costs one debit, while a retry after a transport
    /// failure reuses the slot already paid for.
    pub async fn execute(&self, request: &QueryRequest) -> Result<PageResult, ProviderError> {
        let mut last_error: Option<ProviderError> = None;
        let mut debit = true;

        for (attempt, &delay_ms) in std::iter::once(&0u64)
            .chain(BACKOFF_DELAYS_MS.iter())
            .enumerate()
        {
            if attempt > 0 {
                let delay = match &last_error {
                    Some(ProviderError::RateLimited {
                        retry_after: Some(delay),
                    }) => *delay,
                    _ => Duration::from_millis(delay_ms),
                };
                debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    endpoint = request.endpoint().path(),
                    "retrying provider request"
                );
                tokio::time::sleep(delay).await;
            }

            if debit {
                self.budget.acquire(self.config.policy).await?;
            }

            match self.send_once(request).await {
                Ok(page) => {
                    if attempt > 0 {
                        debug!(attempt, "provider request succeeded after retries");
                    }
                    return Ok(page);
                }
                Err(e) => {
                    // A transport failure never reached the provider, so the
                    // next attempt rides on the debit already taken
                    debit = !matches!(e, ProviderError::Network(_));
                    if !should_retry(&e) {
                        return Err(e);
                    }
                    warn!(attempt, error = %e, "retryable provider failure");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::Network("all retry attempts failed".to_string())))
    }

    /// Fetch pages sequentially until the result cap or the end of the set
    ///
    /// Pagination is stateful on the provider side, so pages are never fetched
    /// in parallel. The loop terminates when there is no next page, when
    /// `max_records` is reached (a labeled truncation), or when a page fetch
    /// fails — in which case nothing is returned.
    pub async fn fetch_pages(
        &self,
        request: &QueryRequest,
        max_records: usize,
    ) -> Result<PagedRecords, ProviderError> {
        let mut records: Vec<Value> = Vec::new();
        let mut total_count = None;
        let mut current = request.clone();

        loop {
            let page = self.execute(&current).await?;
            if page.total_count.is_some() {
                total_count = page.total_count;
            }

            let remaining = max_records.saturating_sub(records.len());
            if page.records.len() > remaining {
                records.extend(page.records.into_iter().take(remaining));
                return Ok(PagedRecords {
                    records,
                    total_count,
                    truncated: true,
                });
            }
            records.extend(page.records);

            match page.next_page {
                Some(next) if records.len() < max_records => {
                    current = current.at_page(next);
                }
                Some(_) => {
                    return Ok(PagedRecords {
                        records,
                        total_count,
                        truncated: true,
                    });
                }
                None => {
                    return Ok(PagedRecords {
                        records,
                        total_count,
                        truncated: false,
                    });
                }
            }
        }
    }

    /// Issue one HTTP request and decode the response
    async fn send_once(&self, request: &QueryRequest) -> Result<PageResult, ProviderError> {
        let url = self.endpoint_url(request)?;

        let response = self
            .client
            .get(url)
            .query(&request.query_pairs())
            .query(&[("api_key", self.config.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                ProviderError::Network(format!(
                    "request failed: {e} (connect: {}, timeout: {})",
                    e.is_connect(),
                    e.is_timeout()
                ))
            })?;

        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = parse_retry_after(response.headers());
            return Err(ProviderError::RateLimited { retry_after });
        }

        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ProviderError::Upstream {
                status: status.as_u16(),
                detail,
            });
        }

        let envelope: ResponseEnvelope = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;

        let next_page = next_page_number(
            request.page_number(),
            request.page_size(),
            envelope.results.len(),
            envelope.meta.total_count,
        );

        Ok(PageResult {
            records: envelope.results,
            total_count: envelope.meta.total_count,
            next_page,
        })
    }

    /// Build the endpoint URL: `<base>/<endpoint>/`
    fn endpoint_url(&self, request: &QueryRequest) -> Result<Url, ProviderError> {
        let raw = format!(
            "{}/{}/",
            self.config.base_url.trim_end_matches('/'),
            request.endpoint().path()
        );
        Url::parse(&raw).map_err(|e| {
            ProviderError::NotConfigured(format!("invalid provider base URL: {e}"))
        })
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("base_url", &self.config.base_url)
            .field("policy", &self.config.policy)
            .finish()
    }
}

/// Whether a failure is worth another attempt
fn should_retry(error: &ProviderError) -> bool {
    match error {
        ProviderError::Network(_) => true,
        ProviderError::RateLimited { .. } => true,
        ProviderError::Upstream { status, .. } => *status >= 500,
        _ => false,
    }
}

/// Parse a Retry-After header given in whole seconds
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

/// Compute the next page number, if any
///
/// Uses the provider count when available; falls back to a full-page
/// heuristic otherwise. An empty page always terminates.
fn next_page_number(
    page_number: u32,
    page_size: u32,
    fetched: usize,
    total_count: Option<u64>,
) -> Option<u32> {
    if fetched == 0 {
        return None;
    }
    match total_count {
        Some(total) => {
            if u64::from(page_number) * u64::from(page_size) < total {
                Some(page_number + 1)
            } else {
                None
            }
        }
        None => {
            if fetched as u32 == page_size {
                Some(page_number + 1)
            } else {
                None
            }
        }
    }
}
