//! Error types for the govsearch tool server
//!
//! Lower layers (config, provider, tools) define their own error enums; this
//! module is the single place where failures are given tool-name context and
//! mapped to protocol error codes before leaving the process.

use crate::config::ConfigError;
use crate::protocol::messages::{ErrorCode, ErrorDetails, ErrorMessage};
use crate::provider::ProviderError;
use crate::tools::ToolError;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use uuid::Uuid;

/// Main error type for server operations
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Tool '{tool}' failed: {source}")]
    Tool {
        tool: String,
        #[source]
        source: ToolError,
    },

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ServerError {
    /// Wrap a tool-layer failure with the name of the tool that was invoked
    pub fn for_tool<S: Into<String>>(tool: S, source: ToolError) -> Self {
        Self::Tool {
            tool: tool.into(),
            source,
        }
    }

    /// Convert to a protocol-compliant ErrorMessage for the caller
    pub fn to_error_message(&self, request_id: Uuid) -> ErrorMessage {
        let (tool, code, message) = match self {
            ServerError::Config(e) => (None, ErrorCode::NotConfigured, e.to_string()),
            ServerError::Tool { tool, source } => (
                Some(tool.clone()),
                error_code_for_tool_error(source),
                source.to_string(),
            ),
            ServerError::MalformedRequest(msg) => {
                (None, ErrorCode::ValidationFailed, msg.clone())
            }
            ServerError::Internal(msg) => (None, ErrorCode::InternalError, msg.clone()),
        };

        ErrorMessage {
            request_id,
            tool,
            error: ErrorDetails {
                code,
                message: sanitize_error_message(&message),
            },
        }
    }
}

/// Map a tool-layer error to its protocol error code
fn error_code_for_tool_error(error: &ToolError) -> ErrorCode {
    match error {
        ToolError::UnknownTool(_) => ErrorCode::UnknownTool,
        ToolError::Validation { .. } | ToolError::Schema(_) => ErrorCode::ValidationFailed,
        ToolError::Deadline { .. } => ErrorCode::DeadlineExceeded,
        ToolError::Provider(provider) => match provider {
            ProviderError::NotConfigured(_) => ErrorCode::NotConfigured,
            ProviderError::RateLimited { .. } => ErrorCode::RateLimited,
            ProviderError::Network(_) => ErrorCode::NetworkError,
            ProviderError::Upstream { .. } | ProviderError::InvalidResponse(_) => {
                ErrorCode::UpstreamError
            }
        },
        ToolError::Internal(_) => ErrorCode::InternalError,
    }
}

static CREDENTIAL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(api_key|password|token|key|secret)[=:]\s*[^&\s]+")
        .expect("credential pattern compiles")
});

/// Sanitize error messages before they leave the process
///
/// The provider authenticates with an `api_key` query parameter, so any error
/// text that embeds a request URL would otherwise leak the credential.
pub fn sanitize_error_message(message: &str) -> String {
    let mut sanitized = CREDENTIAL_PATTERN
        .replace_all(message, "${1}=***")
        .to_string();

    // Bound message size for transport
    if sanitized.len() > 500 {
        let truncate_suffix = "...[truncated]";
        let max_content_len = 500 - truncate_suffix.len();
        sanitized = format!("{}{}", &sanitized[..max_content_len], truncate_suffix);
    }

    sanitized
}

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;
