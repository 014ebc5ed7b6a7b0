//! Health and quota HTTP endpoint
//!
//! A small warp server for operators and container orchestration. Besides the
//! usual liveness/readiness probes it exposes `/quota`, a live snapshot of
//! the shared provider request budget, so quota exhaustion is observable
//! without grepping logs.

use crate::provider::budget::{BudgetSnapshot, RateBudget};
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use warp::Filter;

/// HTTP health check server
pub struct HealthServer {
    port: u16,
    budget: Arc<RateBudget>,
    started_at: u64,
}

impl HealthServer {
    /// Create new health server
    pub fn new(port: u16, budget: Arc<RateBudget>) -> Self {
        Self {
            port,
            budget,
            started_at: current_timestamp(),
        }
    }

    /// Start the HTTP health server
    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let health_server = self.clone();
        let quota_server = self.clone();

        // GET /health - overall status with budget detail
        let health_route = warp::path("health").and(warp::get()).and_then(move || {
            let server = health_server.clone();
            async move {
                let status = server.get_health_status();
                let status_code = if status.status == "healthy" { 200 } else { 503 };
                Ok::<_, Infallible>(warp::reply::with_status(
                    warp::reply::json(&status),
                    warp::http::StatusCode::from_u16(status_code)
                        .unwrap_or(warp::http::StatusCode::INTERNAL_SERVER_ERROR),
                ))
            }
        });

        // GET /quota - live request budget snapshot
        let quota_route = warp::path("quota").and(warp::get()).and_then(move || {
            let server = quota_server.clone();
            async move {
                let snapshot = server.budget.snapshot();
                Ok::<_, Infallible>(warp::reply::json(&QuotaResponse {
                    quota: snapshot,
                    timestamp: current_timestamp(),
                }))
            }
        });

        // GET /ready - readiness probe
        let ready_route = warp::path("ready").and(warp::get()).and_then(move || async move {
            Ok::<_, Infallible>(warp::reply::json(&ReadinessResponse {
                ready: true,
                timestamp: current_timestamp(),
            }))
        });

        // GET /live - liveness probe
        let live_route = warp::path("live").and(warp::get()).and_then(move || async move {
            Ok::<_, Infallible>(warp::reply::json(&LivenessResponse {
                alive: true,
                timestamp: current_timestamp(),
            }))
        });

        // GET / - endpoint index
        let root_route = warp::path::end().and(warp::get()).and_then(move || async move {
            let mut endpoints = HashMap::new();
            endpoints.insert(
                "/health".to_string(),
                "Overall health status with budget detail".to_string(),
            );
            endpoints.insert(
                "/quota".to_string(),
                "Live provider request budget snapshot".to_string(),
            );
            endpoints.insert("/ready".to_string(), "Readiness probe".to_string());
            endpoints.insert("/live".to_string(), "Liveness probe".to_string());

            Ok::<_, Infallible>(warp::reply::json(&ApiDocumentationResponse { endpoints }))
        });

        let routes = health_route
            .or(quota_route)
            .or(ready_route)
            .or(live_route)
            .or(root_route)
            .with(warp::cors().allow_any_origin());

        tracing::info!("Starting health server on port {}", self.port);

        warp::serve(routes).run(([0, 0, 0, 0], self.port)).await;

        Ok(())
    }

    fn get_health_status(&self) -> HealthStatus {
        let now = current_timestamp();
        let quota = self.budget.snapshot();

        // The day window is the one worth alarming on; the second window
        // clears itself before an operator can look at it
        let status = if quota.day_used >= quota.day_limit {
            "degraded".to_string()
        } else {
            "healthy".to_string()
        };

        HealthStatus {
            status,
            timestamp: now,
            uptime_seconds: now.saturating_sub(self.started_at),
            quota,
        }
    }
}

#[derive(Debug, Serialize)]
struct HealthStatus {
    status: String,
    timestamp: u64,
    uptime_seconds: u64,
    quota: BudgetSnapshot,
}

#[derive(Debug, Serialize)]
struct QuotaResponse {
    quota: BudgetSnapshot,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ReadinessResponse {
    ready: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct LivenessResponse {
    alive: bool,
    timestamp: u64,
}

#[derive(Debug, Serialize)]
struct ApiDocumentationResponse {
    endpoints: HashMap<String, String>,
}

fn current_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
