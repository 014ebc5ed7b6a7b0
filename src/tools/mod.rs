//! Tool system for the procurement search catalog
//!
//! Each tool declares a JSON-Schema parameter document and maps a validated
//! call onto one provider query pipeline. The registry owns the fixed tool
//! set, validates parameters before any upstream traffic, and enforces the
//! per-invocation wall-clock ceiling.

use crate::provider::budget::Clock;
use crate::provider::client::ProviderClient;
use crate::provider::query::{QueryRequest, ValidationError};
use crate::provider::ProviderError;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub mod awardees;
pub mod awards;
pub mod codes;
pub mod directory;
pub mod documents;
pub mod opportunities;

/// Tool description exposed for discovery
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// A single procurement search tool
#[async_trait]
pub trait ProviderTool: Send + Sync {
    /// Returns the tool's name, description, and parameter schema
    fn definition(&self) -> ToolDefinition;

    /// Execute with parameters already validated against the schema
    async fn invoke(&self, params: &Value) -> Result<Value, ToolError>;
}

/// Tool system errors
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),
    #[error("Invalid parameter '{field}': {message}")]
    Validation { field: String, message: String },
    #[error("Parameter schema error: {0}")]
    Schema(String),
    #[error(transparent)]
    Provider(#[from] ProviderError),
    #[error("Invocation exceeded the {limit_secs}s deadline")]
    Deadline { limit_secs: u64 },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<ValidationError> for ToolError {
    fn from(error: ValidationError) -> Self {
        ToolError::Validation {
            field: error.field,
            message: error.message,
        }
    }
}

struct RegisteredTool {
    tool: Arc<dyn ProviderTool>,
    definition: ToolDefinition,
    validator: jsonschema::Validator,
}

/// Fixed, ordered tool catalog
///
/// Registration order is the discovery order; it never changes after startup.
pub struct ToolRegistry {
    entries: Vec<RegisteredTool>,
    index: HashMap<String, usize>,
    invocation_timeout: Duration,
}

impl ToolRegistry {
    pub fn new(invocation_timeout: Duration) -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            invocation_timeout,
        }
    }

    /// Build the registry with the full procurement tool catalog
    pub fn with_default_tools(
        client: Arc<ProviderClient>,
        clock: Arc<dyn Clock>,
        invocation_timeout: Duration,
    ) -> Result<Self, ToolError> {
        let mut registry = Self::new(invocation_timeout);

        registry.register(Arc::new(opportunities::OpportunitySearchTool::new(
            client.clone(),
        )))?;
        registry.register(Arc::new(awards::ContractSearchTool::new(client.clone())))?;
        registry.register(Arc::new(awards::GrantSearchTool::new(client.clone())))?;
        registry.register(Arc::new(documents::DocumentsTool::new(
            client.clone(),
            clock,
        )))?;
        registry.register(Arc::new(awardees::AwardeeSearchTool::new(client.clone())))?;
        registry.register(Arc::new(awardees::AwardeeNameSearchTool::new(
            client.clone(),
        )))?;
        registry.register(Arc::new(awardees::AwardeeDetailsTool::new(client.clone())))?;
        registry.register(Arc::new(awardees::AwardeeCertificationsTool::new(
            client.clone(),
        )))?;
        registry.register(Arc::new(directory::AgencySearchTool::new(client.clone())))?;
        registry.register(Arc::new(directory::VehicleSearchTool::new(client.clone())))?;
        registry.register(Arc::new(directory::PeopleSearchTool::new(client.clone())))?;
        registry.register(Arc::new(codes::NaicsLookupTool::new(client.clone())))?;
        registry.register(Arc::new(codes::PscLookupTool::new(client)))?;

        Ok(registry)
    }

    /// Register a tool, compiling its parameter schema once
    pub fn register(&mut self, tool: Arc<dyn ProviderTool>) -> Result<(), ToolError> {
        let definition = tool.definition();
        let validator = jsonschema::validator_for(&definition.parameters)
            .map_err(|e| ToolError::Schema(format!("schema compilation failed: {e}")))?;

        debug_assert!(
            !self.index.contains_key(&definition.name),
            "duplicate tool name"
        );
        self.index
            .insert(definition.name.clone(), self.entries.len());
        self.entries.push(RegisteredTool {
            tool,
            definition,
            validator,
        });
        Ok(())
    }

    /// Tool definitions in registration order
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.entries
            .iter()
            .map(|entry| entry.definition.clone())
            .collect()
    }

    /// Registered tool names in registration order
    pub fn tool_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.definition.name.clone())
            .collect()
    }

    /// Invoke a tool by name
    ///
    /// Parameters are validated against the declared schema before the tool
    /// runs; the whole invocation is bounded by the configured deadline.
    pub async fn invoke(&self, name: &str, params: &Value) -> Result<Value, ToolError> {
        let entry = self
            .index
            .get(name)
            .map(|&i| &self.entries[i])
            .ok_or_else(|| ToolError::UnknownTool(name.to_string()))?;

        if let Err(mut errors) = entry.validator.validate(params) {
            return Err(match errors.next() {
                Some(error) => {
                    let field = error.instance_path.to_string();
                    let field = field.trim_start_matches('/').to_string();
                    ToolError::Validation {
                        field: if field.is_empty() {
                            "params".to_string()
                        } else {
                            field
                        },
                        message: error.to_string(),
                    }
                }
                None => ToolError::Validation {
                    field: "params".to_string(),
                    message: "parameter validation failed".to_string(),
                },
            });
        }

        debug!(tool = name, "invoking tool");
        match tokio::time::timeout(self.invocation_timeout, entry.tool.invoke(params)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::Deadline {
                limit_secs: self.invocation_timeout.as_secs(),
            }),
        }
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tool_names())
            .field("invocation_timeout", &self.invocation_timeout)
            .finish()
    }
}

/// Extract an optional string parameter
pub(crate) fn opt_str_param(params: &Value, name: &str) -> Option<String> {
    params
        .get(name)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Extract an optional unsigned integer parameter
pub(crate) fn opt_u64_param(params: &Value, name: &str) -> Option<u64> {
    params.get(name).and_then(|v| v.as_u64())
}

/// Extract a required string parameter
pub(crate) fn req_str_param(params: &Value, name: &str) -> Result<String, ToolError> {
    opt_str_param(params, name).ok_or_else(|| ToolError::Validation {
        field: name.to_string(),
        message: "required parameter is missing".to_string(),
    })
}

/// Apply the shared pagination parameters to a query
pub(crate) fn apply_paging(
    mut request: QueryRequest,
    params: &Value,
    default_page_size: u32,
) -> Result<QueryRequest, ToolError> {
    let page_size = opt_u64_param(params, "page_size")
        .map(|v| v.min(u64::from(u32::MAX)) as u32)
        .unwrap_or(default_page_size);
    request = request.with_page_size(page_size);

    if let Some(page_number) = opt_u64_param(params, "page_number") {
        let page_number = page_number.min(u64::from(u32::MAX)) as u32;
        request = request.with_page_number(page_number)?;
    }
    Ok(request)
}

/// The caller's result cap: explicit `max_records`, or one page by default
pub(crate) fn result_cap(params: &Value, request: &QueryRequest) -> usize {
    opt_u64_param(params, "max_records").unwrap_or(u64::from(request.page_size())) as usize
}

/// Run a paginated search and package records under the given output key
pub(crate) async fn run_search<T, F>(
    client: &ProviderClient,
    request: QueryRequest,
    max_records: usize,
    output_key: &str,
    normalize_record: F,
) -> Result<Value, ToolError>
where
    T: Serialize,
    F: Fn(&Value) -> T,
{
    let paged = client.fetch_pages(&request, max_records).await?;
    let records: Vec<T> = paged.records.iter().map(normalize_record).collect();

    let mut output = serde_json::Map::new();
    output.insert("total_count".to_string(), serde_json::json!(paged.total_count));
    output.insert(
        "page".to_string(),
        serde_json::json!(request.page_number()),
    );
    output.insert(
        "page_size".to_string(),
        serde_json::json!(request.page_size()),
    );
    output.insert("truncated".to_string(), serde_json::json!(paged.truncated));
    output.insert(
        output_key.to_string(),
        serde_json::to_value(records).map_err(|e| ToolError::Internal(e.to_string()))?,
    );
    Ok(Value::Object(output))
}

/// JSON-Schema fragments shared by the search tools
pub(crate) fn paging_properties(default_page_size: u32) -> Value {
    serde_json::json!({
        "page_number": {
            "type": "integer",
            "minimum": 1,
            "default": 1
        },
        "page_size": {
            "type": "integer",
            "minimum": 1,
            "maximum": 1000,
            "default": default_page_size
        },
        "max_records": {
            "type": "integer",
            "minimum": 1,
            "maximum": 1000
        }
    })
}

/// Build a search tool parameter schema: tool-specific properties plus the
/// shared paging block
pub(crate) fn search_schema(specific: Value, required: &[&str], default_page_size: u32) -> Value {
    let mut properties = specific.as_object().cloned().unwrap_or_default();
    if let Some(paging) = paging_properties(default_page_size).as_object() {
        for (key, prop) in paging {
            properties.insert(key.clone(), prop.clone());
        }
    }
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false
    })
}
