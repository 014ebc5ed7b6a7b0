//! Process-wide request budget for the upstream provider
//!
//! The provider enforces 10 requests per second and 100,000 requests per day.
//! Both windows are fixed (not sliding): counters reset when the wall clock
//! crosses into the next window. One budget instance is shared by every tool
//! invocation for the lifetime of the process.

use crate::config::ExhaustionPolicy;
use crate::provider::ProviderError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Time source abstraction so window arithmetic is testable
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time source used in production
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().expect("clock lock poisoned");
        *now += ChronoDuration::from_std(by).expect("advance duration in range");
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Counter state for both windows
#[derive(Debug)]
struct WindowState {
    second_start: DateTime<Utc>,
    second_count: u32,
    day_start: DateTime<Utc>,
    day_count: u32,
}

/// Point-in-time view of the budget, served by the quota endpoint
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BudgetSnapshot {
    pub second_used: u32,
    pub second_limit: u32,
    pub day_used: u32,
    pub day_limit: u32,
}

/// Shared request budget with fixed 1-second and 24-hour windows
///
/// All mutation happens under a single mutex; the lock is only ever held to
/// read or bump counters, never across an await point.
pub struct RateBudget {
    per_second: u32,
    per_day: u32,
    state: Mutex<WindowState>,
    clock: Arc<dyn Clock>,
}

impl RateBudget {
    /// Create a budget backed by the system clock
    pub fn new(per_second: u32, per_day: u32) -> Self {
        Self::with_clock(per_second, per_day, Arc::new(SystemClock))
    }

    /// Create a budget with an injected clock
    pub fn with_clock(per_second: u32, per_day: u32, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            per_second,
            per_day,
            state: Mutex::new(WindowState {
                second_start: now,
                second_count: 0,
                day_start: now,
                day_count: 0,
            }),
            clock,
        }
    }

    /// Try to debit one request from both windows
    ///
    /// On success the request is recorded. On failure returns the duration
    /// until the earliest exhausted window reopens; nothing is recorded.
    pub fn try_acquire(&self) -> Result<(), Duration> {
        let now = self.clock.now();
        let mut state = self.state.lock().expect("budget lock poisoned");

        // Roll windows the clock has moved past
        if now - state.second_start >= ChronoDuration::seconds(1) {
            state.second_start = now;
            state.second_count = 0;
        }
        if now - state.day_start >= ChronoDuration::hours(24) {
            state.day_start = now;
            state.day_count = 0;
        }

        if state.day_count >= self.per_day {
            let reopen = state.day_start + ChronoDuration::hours(24) - now;
            return Err(reopen.to_std().unwrap_or(Duration::ZERO));
        }
        if state.second_count >= self.per_second {
            let reopen = state.second_start + ChronoDuration::seconds(1) - now;
            return Err(reopen.to_std().unwrap_or(Duration::ZERO));
        }

        state.second_count += 1;
        state.day_count += 1;
        Ok(())
    }

    /// Debit one request, applying the configured exhaustion policy
    ///
    /// `Wait` sleeps until the blocking window reopens and retries; `FailFast`
    /// surfaces `RateLimited` immediately with the reopen delay attached.
    pub async fn acquire(&self, policy: ExhaustionPolicy) -> Result<(), ProviderError> {
        loop {
            match self.try_acquire() {
                Ok(()) => return Ok(()),
                Err(wait) => match policy {
                    ExhaustionPolicy::FailFast => {
                        return Err(ProviderError::RateLimited {
                            retry_after: Some(wait),
                        });
                    }
                    ExhaustionPolicy::Wait => {
                        tracing::debug!(wait_ms = wait.as_millis() as u64, "request budget exhausted, waiting");
                        // Sleep at least 1ms so a zero-length wait cannot spin
                        tokio::time::sleep(wait.max(Duration::from_millis(1))).await;
                    }
                },
            }
        }
    }

    /// Current usage across both windows
    pub fn snapshot(&self) -> BudgetSnapshot {
        let now = self.clock.now();
        let state = self.state.lock().expect("budget lock poisoned");

        let second_used = if now - state.second_start >= ChronoDuration::seconds(1) {
            0
        } else {
            state.second_count
        };
        let day_used = if now - state.day_start >= ChronoDuration::hours(24) {
            0
        } else {
            state.day_count
        };

        BudgetSnapshot {
            second_used,
            second_limit: self.per_second,
            day_used,
            day_limit: self.per_day,
        }
    }
}

impl std::fmt::Debug for RateBudget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateBudget")
            .field("per_second", &self.per_second)
            .field("per_day", &self.per_day)
            .finish()
    }
}
