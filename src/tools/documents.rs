//! Opportunity document retrieval tool
//!
//! Download URLs returned by the provider stop working 60 minutes after they
//! are issued. Every link in the output carries its issued-at and expires-at
//! timestamps so a caller can detect a dead link without a failed download.

use crate::normalize;
use crate::provider::budget::Clock;
use crate::provider::client::ProviderClient;
use crate::provider::query::{validate_nonempty, Endpoint, QueryRequest, DEFAULT_PAGE_SIZE};
use crate::tools::{
    apply_paging, req_str_param, result_cap, run_search, search_schema, ProviderTool,
    ToolDefinition, ToolError,
};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct DocumentsTool {
    client: Arc<ProviderClient>,
    clock: Arc<dyn Clock>,
}

impl DocumentsTool {
    pub fn new(client: Arc<ProviderClient>, clock: Arc<dyn Clock>) -> Self {
        Self { client, clock }
    }
}

#[async_trait]
impl ProviderTool for DocumentsTool {
    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: "get_documents".to_string(),
            description:
                "Get documents attached to an opportunity; download URLs expire 60 minutes after issuance"
                    .to_string(),
            parameters: search_schema(
                json!({
                    "related_key": {
                        "type": "string",
                        "description": "The opportunity_key or document_path from an opportunity search"
                    }
                }),
                &["related_key"],
                DEFAULT_PAGE_SIZE,
            ),
        }
    }

    async fn invoke(&self, params: &Value) -> Result<Value, ToolError> {
        let related_key = req_str_param(params, "related_key")?;
        validate_nonempty("related_key", &related_key)?;

        let mut request =
            QueryRequest::new(Endpoint::Document).with_filter("related_key", related_key)?;
        request = apply_paging(request, params, DEFAULT_PAGE_SIZE)?;

        let cap = result_cap(params, &request);
        let issued_at = self.clock.now();
        run_search(&self.client, request, cap, "documents", |record| {
            normalize::document(record, issued_at)
        })
        .await
    }
}
