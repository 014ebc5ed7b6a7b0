//! Upstream provider layer
//!
//! Everything that talks to the HigherGov REST API lives here: the shared
//! process-wide rate budget, query construction and validation, and the
//! HTTP client with its retry discipline.

use std::time::Duration;
use thiserror::Error;

pub mod budget;
pub mod client;
pub mod query;

pub use budget::{BudgetSnapshot, Clock, ManualClock, RateBudget, SystemClock};
pub use client::{PageResult, PagedRecords, ProviderClient, ProviderClientConfig};
pub use query::{Endpoint, QueryRequest, ValidationError};

/// Upstream client errors
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    /// Missing or empty API key, detected at client construction
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    /// Local budget exhaustion under fail-fast policy, or a provider 429
    /// that survived all retries
    #[error("Rate limited by request budget or provider")]
    RateLimited { retry_after: Option<Duration> },

    /// Non-retryable provider rejection, or a retryable status that
    /// exhausted its attempts
    #[error("Provider rejected request ({status}): {detail}")]
    Upstream { status: u16, detail: String },

    /// Connection or timeout failure after retries
    #[error("Network error: {0}")]
    Network(String),

    /// A 2xx body that did not decode into the expected envelope
    #[error("Invalid provider response: {0}")]
    InvalidResponse(String),
}
