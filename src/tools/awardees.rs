//! Awardee (contractor entity) tools
//!
//! Two search views and two lookup views over the awardee endpoint. The
//! lookups return the enriched profile shape: every code assignment, every
//! certification with its SBA-certified vs self-certified tag, parent
//! linkage, and contacts.

use crate::normalize;
use crate::provider::client::ProviderClient;
use crate::provider::query::{
    validate_date, validate_naics, validate_nonempty, Endpoint, QueryRequest, DEFAULT_PAGE_SIZE,
};
use crate::tools::{
    apply_paging, opt_str_param, req_str_param, result_cap, run_search, search_schema,
    ProviderTool, ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

/// Search awardees by registration attributes
pub struct AwardeeSearchTool {
    client: Arc<ProviderClient>,
}

impl AwardeeSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for AwardeeSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_awardees".to_string(),
            description: "Search government contractors and awardees, updated daily".to_string(),
            parameters: search_schema(
                json!({
                    "cage_code": {
                        "type": "string",
                        "description": "CAGE code"
                    },
                    "uei": {
                        "type": "string",
                        "description": "Unique Entity Identifier"
                    },
                    "awardee_key_parent": {
                        "type": "string",
                        "description": "Parent company key"
                    },
                    "primary_naics": {
                        "type": "string",
                        "description": "Primary NAICS code"
                    },
                    "registration_last_update_date_min": {
                        "type": "string",
                        "description": "Minimum SAM registration update date (YYYY-MM-DD)"
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
        let mut request = QueryRequest::new(Endpoint::Awardee);

        if let Some(value) = opt_str_param(params, "cage_code") {
            validate_nonempty("cage_code", &value)?;
            request = request.with_filter("cage_code", value)?;
        }
        if let Some(value) = opt_str_param(params, "uei") {
            validate_nonempty("uei", &value)?;
            request = request.with_filter("uei", value)?;
        }
        if let Some(value) = opt_str_param(params, "awardee_key_parent") {
            validate_nonempty("awardee_key_parent", &value)?;
            request = request.with_filter("awardee_key_parent", value)?;
        }
        if let Some(value) = opt_str_param(params, "primary_naics") {
            validate_naics("primary_naics", &value)?;
            request = request.with_filter("primary_naics", value)?;
        }
        if let Some(value) = opt_str_param(params, "registration_last_update_date_min") {
            validate_date("registration_last_update_date_min", &value)?;
            request = request.with_filter("registration_last_update_date__gte", value)?;
        }
        if let Some(ordering) = opt_str_param(params, "ordering") {
            request = request.with_ordering(ordering);
        }
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(
            &self.client,
            request,
            cap,
            "awardees",
            normalize::awardee_summary,
        )
        .await
    }
}

/// Search awardees by free-text name
pub struct AwardeeNameSearchTool {
    client: Arc<ProviderClient>,
}

impl AwardeeNameSearchTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for AwardeeNameSearchTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "search_awardees_by_name".to_string(),
            description: "Search government contractors and awardees by company name".to_string(),
            parameters: search_schema(
                json!({
                    "name": {
                        "type": "string",
                        "description": "Company name or name fragment"
                    }
                }),
                &["name"],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let name = req_str_param(params, "name")?;
        validate_nonempty("name", &name)?;

        let mut request = QueryRequest::new(Endpoint::Awardee).with_filter("search", name)?;
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        run_search(
            &self.client,
            request,
            cap,
            "awardees",
            normalize::awardee_summary,
        )
        .await
    }
}

/// Fetch the first awardee record matching a key, if any
async fn fetch_awardee(
    client: &ProviderClient,
    awardee_key: String,
) -> Result<Option<Value>, ToolError> {
    let request = QueryRequest::new(Endpoint::Awardee)
        .with_filter("awardee_key", awardee_key)?
        .with_page_size(1);

    let paged = client.fetch_pages(&request, 1).await?;
    Ok(paged.records.into_iter().next())
}

/// Enriched profile lookup for a single awardee
pub struct AwardeeDetailsTool {
    client: Arc<ProviderClient>,
}

impl AwardeeDetailsTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for AwardeeDetailsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_awardee_details".to_string(),
            description:
                "Get the full profile of one awardee: all NAICS/PSC code assignments, certifications, parent company, and contacts"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "awardee_key": {
                        "type": "string",
                        "description": "Awardee key from a search result"
                    }
                },
                "required": ["awardee_key"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let awardee_key = req_str_param(params, "awardee_key")?;
        validate_nonempty("awardee_key", &awardee_key)?;

        let record = fetch_awardee(&self.client, awardee_key).await?;
        match record {
            Some(raw) => {
                let profile = normalize::awardee_profile(&raw);
                Ok(json!({
                    "found": true,
                    "awardee": serde_json::to_value(profile)
                        .map_err(|e| ToolError::Internal(e.to_string()))?,
                }))
            }
            None => Ok(json!({"found": false, "awardee": null})),
        }
    }
}

/// Certification list lookup for a single awardee
pub struct AwardeeCertificationsTool {
    client: Arc<ProviderClient>,
}

impl AwardeeCertificationsTool {
    pub fn new(client: Arc<ProviderClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ProviderTool for AwardeeCertificationsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_awardee_certifications".to_string(),
            description:
                "List every certification held by one awardee, each tagged SBA-certified or self-certified"
                    .to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "awardee_key": {
                        "type": "string",
                        "description": "Awardee key from a search result"
                    }
                },
                "required": ["awardee_key"],
                "additionalProperties": false
            }),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let awardee_key = req_str_param(params, "awardee_key")?;
        validate_nonempty("awardee_key", &awardee_key)?;

        let record = fetch_awardee(&self.client, awardee_key.clone()).await?;
        match record {
            Some(raw) => {
                let certifications = normalize::certifications(&raw);
                Ok(json!({
                    "found": true,
                    "awardee_key": awardee_key,
                    "certifications": serde_json::to_value(certifications)
                        .map_err(|e| ToolError::Internal(e.to_string()))?,
                }))
            }
            None => Ok(json!({
                "found": false,
                "awardee_key": awardee_key,
                "certifications": [],
            })),
        }
    }
}
