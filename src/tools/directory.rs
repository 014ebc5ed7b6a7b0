//! Agency, contract vehicle, and personnel search tools

use crate::normalize;
use crate::provider::client::ProviderClient;
use crate::provider::query::{validate_nonempty, Endpoint, QueryRequest, DEFAULT_PAGE_SIZE};
use crate::tools::{
    apply_paging, opt_str_param, result_cap, run_search, search_schema, ProviderTool,
    ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Search federal agencies
pub struct AgencySearchTool {
    client: Arc<ProviderClient>,
}

impl AgencySearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for AgencySearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_agencies".to_string(),
            description: "Search federal agencies".to_string(),
            parameters: search_schema(
                json!({
                    "agency_key": {
                        "type": "string",
                        "description": "Specific agency key"
                    }
                }),
                &[],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let mut request = QueryRequest::new(Endpoint::Agency);

        if let Some(value) = opt_str_param(params, "agency_key") {
            validate_nonempty("agency_key", &value)?;
            request = request.with_filter("agency_key", value)?;
        }
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(&self.client, request, cap, "agencies", normalize::agency).await
    }
}

/// Search government contract vehicles
pub struct VehicleSearchTool {
    client: Arc<ProviderClient>,
}

impl VehicleSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for VehicleSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_contract_vehicles".to_string(),
            description: "Search government contract vehicles (GWACs, BPAs, IDIQs, and similar)"
                .to_string(),
            parameters: search_schema(
                json!({
                    "vehicle_key": {
                        "type": "string",
                        "description": "Specific vehicle key"
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
        let mut request = QueryRequest::new(Endpoint::Vehicle);

        if let Some(value) = opt_str_param(params, "vehicle_key") {
            validate_nonempty("vehicle_key", &value)?;
            request = request.with_filter("vehicle_key", value)?;
        }
        if let Some(ordering) = opt_str_param(params, "ordering") {
            request = request.with_ordering(ordering);
        }
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(&self.client, request, cap, "vehicles", normalize::vehicle).await
    }
}

/// Search government personnel and contacts
pub struct PeopleSearchTool {
    client: Arc<ProviderClient>,
}

impl PeopleSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for PeopleSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_people".to_string(),
            description: "Search government personnel and contacts".to_string(),
            parameters: search_schema(
                json!({
                    "contact_email": {
                        "type": "string",
                        "description": "Filter by email address"
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
        let mut request = QueryRequest::new(Endpoint::People);

        if let Some(value) = opt_str_param(params, "contact_email") {
            validate_nonempty("contact_email", &value)?;
            request = request.with_filter("contact_email", value)?;
        }
        if let Some(ordering) = opt_str_param(params, "ordering") {
            request = request.with_ordering(ordering);
        }
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(&self.client, request, cap, "people", normalize::person).await
    }
}
