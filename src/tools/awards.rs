//! Contract and grant award search tools

use crate::normalize;
use crate::provider::client::ProviderClient;
use crate::provider::query::{
    validate_date, validate_naics, validate_nonempty, validate_psc, Endpoint, QueryRequest,
    DEFAULT_PAGE_SIZE,
};
use crate::tools::{
    apply_paging, opt_str_param, result_cap, run_search, search_schema, ProviderTool,
    ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Search federal contract awards
pub struct ContractSearchTool {
    client: Arc<ProviderClient>,
}

impl ContractSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for ContractSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_contracts".to_string(),
            description: "Search federal contract awards, updated daily".to_string(),
            parameters: search_schema(
                json!({
                    "search_id": {
                        "type": "string",
                        "description": "Saved-search identifier"
                    },
                    "award_id": {
                        "type": "string",
                        "description": "Specific award ID (e.g. a PIID)"
                    },
                    "awardee_key": {
                        "type": "string",
                        "description": "Filter by awardee key"
                    },
                    "naics_code": {
                        "type": "string",
                        "description": "Filter by NAICS code"
                    },
                    "psc_code": {
                        "type": "string",
                        "description": "Filter by Product/Service Code"
                    },
                    "last_modified_date_min": {
                        "type": "string",
                        "description": "Minimum last modified date (YYYY-MM-DD)"
                    },
                    "ordering": {
                        "type": "string",
                        "description": "Sort order"
                    }
                }),
                &[],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Contract);

        if let Some(value) = opt_str_param(params, "search_id") {
            validate_nonempty("search_id", &value)?;
            request = request.with_filter("search_id", value)?;
        }
        if let Some(value) = opt_str_param(params, "award_id") {
            validate_nonempty("award_id", &value)?;
            request = request.with_filter("award_id", value)?;
        }
        if let Some(value) = opt_str_param(params, "awardee_key") {
            validate_nonempty("awardee_key", &value)?;
            request = request.with_filter("awardee_key", value)?;
        }
        if let Some(value) = opt_str_param(params, "naics_code") {
            validate_naics("naics_code", &value)?;
            request = request.with_filter("naics_code", value)?;
        }
        if let Some(value) = opt_str_param(params, "psc_code") {
            validate_psc("psc_code", &value)?;
            request = request.with_filter("psc_code", value)?;
        }
        if let Some(value) = opt_str_param(params, "last_modified_date_min") {
            validate_date("last_modified_date_min", &value)?;
            request = request.with_filter("last_modified_date__gte", value)?;
        }

        let ordering = opt_str_param(params, "ordering")
            .unwrap_or_else(|| "-last_modified_date".to_string());
        request = request.with_ordering(ordering);
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(&self.client, request, cap, "contracts", normalize::contract).await
    }
}

/// Search federal grant awards
pub struct GrantSearchTool {
    client: Arc<ProviderClient>,
}

impl GrantSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for GrantSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_grants".to_string(),
            description: "Search federal grant awards, updated daily".to_string(),
            parameters: search_schema(
                json!({
                    "search_id": {
                        "type": "string",
                        "description": "Saved-search identifier"
                    },
                    "awardee_key": {
                        "type": "string",
                        "description": "Filter by awardee key"
                    },
                    "cfda_program_number": {
                        "type": "string",
                        "description": "Filter by CFDA/Assistance Listing number"
                    },
                    "last_modified_date_min": {
                        "type": "string",
                        "description": "Minimum last modified date (YYYY-MM-DD)"
                    },
                    "ordering": {
                        "type": "string",
                        "description": "Sort order"
                    }
                }),
                &[],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Grant);

        if let Some(value) = opt_str_param(params, "search_id") {
            validate_nonempty("search_id", &value)?;
            request = request.with_filter("search_id", value)?;
        }
        if let Some(value) = opt_str_param(params, "awardee_key") {
            validate_nonempty("awardee_key", &value)?;
            request = request.with_filter("awardee_key", value)?;
        }
        if let Some(value) = opt_str_param(params, "cfda_program_number") {
            validate_nonempty("cfda_program_number", &value)?;
            request = request.with_filter("cfda_program_number", value)?;
        }
        if let Some(value) = opt_str_param(params, "last_modified_date_min") {
            validate_date("last_modified_date_min", &value)?;
            request = request.with_filter("last_modified_date__gte", value)?;
        }

        let ordering = opt_str_param(params, "ordering")
            .unwrap_or_else(|| "-last_modified_date".to_string());
        request = request.with_ordering(ordering);
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(&self.client, request, cap, "grants", normalize::grant).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::budget::RateBudget;
    use crate::provider::client::ProviderClientConfig;

    fn test_client() -> Arc<ProviderClient> {
        let config = ProviderClientConfig {
            api_key: "test-key".to_string(),
            ..Default::default()
        };
        Arc::new(ProviderClient::new(config, Arc::new(RateBudget::new(10, 100_000))).unwrap())
    }

    #[test]
    fn test_contract_tool_definition() {
        let definition = ContractSearchTool::new(test_client()).definition();
        assert_eq!(definition.name, "search_contracts");
        assert!(definition.parameters["properties"].get("naics_code").is_some());
        assert!(definition.parameters["properties"].get("psc_code").is_some());
    }

    #[test]
    fn test_grant_tool_definition() {
        let definition = GrantSearchTool::new(test_client()).definition();
        assert_eq!(definition.name, "search_grants");
        assert!(definition.parameters["properties"]
            .get("cfda_program_number")
            .is_some());
    }

    #[tokio::test]
    async fn test_contract_rejects_malformed_naics() {
        let tool = ContractSearchTool::new(test_client());
        let result = tool.invoke(&json!({"naics_code": "54A512"})).await;

        match result {
            Err(ToolError::Validation { field, .. }) => assert_eq!(field, "naics_code"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_contract_rejects_malformed_psc() {
        let tool = ContractSearchTool::new(test_client());
        let result = tool.invoke(&json!({"psc_code": "r425x"})).await;
        assert!(matches!(result, Err(ToolError::Validation { .. })));
    }

    #[tokio::test]
    async fn test_grant_rejects_malformed_date() {
        let tool = GrantSearchTool::new(test_client());
        let result = tool
            .invoke(&json!({"last_modified_date_min": "2025-13-40"}))
            .await;
        assert!(matches!(result, Err(ToolError::Validation { .. })));
    }
}
