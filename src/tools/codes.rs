//! NAICS and PSC code lookup tools
//!
//! Both lookups accept partial code prefixes the way the provider's catalog
//! endpoints do. Code shapes are validated locally; the full code tables live
//! upstream.

use crate::normalize;
use crate::provider::client::ProviderClient;
use crate::provider::query::{
    validate_naics, validate_psc, Endpoint, QueryRequest, DEFAULT_LOOKUP_PAGE_SIZE,
};
use crate::tools::{
    apply_paging, opt_str_param, result_cap, run_search, search_schema, ProviderTool,
    ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Look up NAICS codes and their descriptions
pub struct NaicsLookupTool {
    client: Arc<ProviderClient>,
}

impl NaicsLookupTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for NaicsLookupTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "lookup_naics".to_string(),
            description: "Look up NAICS codes and descriptions; partial code prefixes match"
                .to_string(),
            parameters: search_schema(
                json!({
                    "naics_code": {
                        "type": "string",
                        "description": "NAICS code or prefix (2-6 digits)"
                    }
                }),
                &[],
                DEFAULT_LOOKUP_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Naics);

        if let Some(value) = opt_str_param(params, "naics_code") {
            validate_naics("naics_code", &value)?;
            request = request.with_filter("naics_code", value)?;
        }
        request = apply_paging(request, params, DEFAULT_LOOKUP_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(
            &self.client,
            request,
            cap,
            "naics_codes",
            normalize::naics_entry,
        )
        .await
    }
}

/// Look up Product/Service Codes and their descriptions
pub struct PscLookupTool {
    client: Arc<ProviderClient>,
}

impl PscLookupTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for PscLookupTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "lookup_psc".to_string(),
            description:
                "Look up Product/Service Codes (PSC) and descriptions; partial code prefixes match"
                    .to_string(),
            parameters: search_schema(
                json!({
                    "psc_code": {
                        "type": "string",
                        "description": "PSC code or prefix (1-4 characters)"
                    }
                }),
                &[],
                DEFAULT_LOOKUP_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Psc);

        if let Some(value) = opt_str_param(params, "psc_code") {
            validate_psc("psc_code", &value)?;
            request = request.with_filter("psc_code", value)?;
        }
        request = apply_paging(request, params, DEFAULT_LOOKUP_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(
            &self.client,
            request,
            cap,
            "psc_codes",
            normalize::psc_entry,
        )
        .await
    }
}
