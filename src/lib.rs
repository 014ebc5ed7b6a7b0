//! govsearch - Federal procurement search tools
//!
//! A fixed catalog of federal-procurement search and lookup tools
//! (opportunities, contract and grant awards, awardee entities, agencies,
//! contract vehicles, personnel, NAICS/PSC codes, and opportunity documents)
//! served over a line-delimited JSON request/response protocol and backed by
//! the HigherGov REST API.
//!
//! # Overview
//!
//! - [`tools`] - the tool catalog: declared parameter schemas, validation,
//!   dispatch, and the per-invocation deadline
//! - [`provider`] - the upstream client: shared rate budget, query
//!   construction, retries, pagination
//! - [`normalize`] - stable typed output records, enriched entity profiles,
//!   document-link expiry stamping
//! - [`protocol`] - the wire envelope types
//! - [`server`] - the stdio serving loop
//!
//! # Quick Start
//!
//! ```rust
//! use govsearch::provider::query::{Endpoint, QueryRequest};
//!
//! # fn main() -> Result<(), govsearch::provider::ValidationError> {
//! // Queries are validated as they are built: unknown filter fields and
//! // oversized pages never reach the wire
//! let request = QueryRequest::new(Endpoint::Naics)
//!     .with_filter("naics_code", "541512")?
//!     .with_page_size(500); // clamped to the provider maximum of 100
//!
//! assert_eq!(request.page_size(), 100);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod normalize;
pub mod observability;
pub mod protocol;
pub mod provider;
pub mod server;
pub mod tools;

pub use config::{ConfigError, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use protocol::{ErrorCode, ServerMessage, ToolCallRequest, ToolResultMessage};
pub use provider::{ProviderClient, ProviderError, RateBudget};
pub use server::ToolServer;
pub use tools::{ProviderTool, ToolDefinition, ToolError, ToolRegistry};
