//! Observability: structured logging and the health/quota HTTP endpoint

pub mod health;
pub mod logging;

pub use health::HealthServer;
pub use logging::{init_default_logging, init_logging, LogFormat};
