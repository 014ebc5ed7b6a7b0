//! Opportunity search tool
//!
//! Searches federal contract and grant opportunities captured from SAM.gov,
//! grants.gov, and the other sources the provider aggregates.

use crate::normalize;
use crate::provider::client::ProviderClient;
use crate::provider::query::{
    validate_date, validate_nonempty, Endpoint, QueryRequest, DEFAULT_PAGE_SIZE,
};
use crate::tools::{
    apply_paging, opt_str_param, result_cap, run_search, search_schema, ProviderTool,
    ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct OpportunitySearchTool {
    client: Arc<ProviderClient>,
}

impl OpportunitySearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for OpportunitySearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_opportunities".to_string(),
            description:
                "Search federal contract and grant opportunities, updated continuously from SAM.gov, grants.gov, and other sources"
                    .to_string(),
            parameters: search_schema(
                json!({
                    "search_id": {
                        "type": "string",
                        "description": "Saved-search identifier"
                    },
                    "agency_key": {
                        "type": "string",
                        "description": "Filter by agency key"
                    },
                    "source_type": {
                        "type": "string",
                        "description": "Filter by source (e.g. sam_gov, grants_gov)"
                    },
                    "captured_date_min": {
                        "type": "string",
                        "description": "Minimum captured date (YYYY-MM-DD)"
                    },
                    "captured_date_max": {
                        "type": "string",
                        "description": "Maximum captured date (YYYY-MM-DD)"
                    },
                    "ordering": {
                        "type": "string",
                        "description": "Sort order (e.g. -captured_date for newest first)"
                    }
                }),
                &[],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Opportunity);

        if let Some(value) = opt_str_param(params, "search_id") {
            validate_nonempty("search_id", &value)?;
            request = request.with_filter("search_id", value)?;
        }
        if let Some(value) = opt_str_param(params, "agency_key") {
            validate_nonempty("agency_key", &value)?;
            request = request.with_filter("agency_key", value)?;
        }
        if let Some(value) = opt_str_param(params, "source_type") {
            validate_nonempty("source_type", &value)?;
            request = request.with_filter("source_type", value)?;
        }
        if let Some(value) = opt_str_param(params, "captured_date_min") {
            validate_date("captured_date_min", &value)?;
            request = request.with_filter("captured_date__gte", value)?;
        }
        if let Some(value) = opt_str_param(params, "captured_date_max") {
            validate_date("captured_date_max", &value)?;
            request = request.with_filter("captured_date__lte", value)?;
        }

        let ordering = opt_str_param(params, "ordering")
            .unwrap_or_else(|| "-captured_date".to_string());
        request = request.with_ordering(ordering);
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(
            &self.client,
            request,
            cap,
            "opportunities",
            normalize::opportunity,
        )
        .await
    }
}
