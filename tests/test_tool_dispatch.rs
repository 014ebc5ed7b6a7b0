//! End-to-end dispatch tests: registry -> query builder -> client -> normalizer
//!
//! Each test runs a real tool invocation against a mock provider and checks
//! the declared output contract.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use govsearch::config::ExhaustionPolicy;
use govsearch::provider::budget::{Clock, ManualClock, RateBudget};
use govsearch::provider::client::{ProviderClient, ProviderClientConfig};
use govsearch::tools::{ToolError, ToolRegistry};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn frozen_time() -> DateTime<Utc> {
    "2025-06-01T12:00:00Z".parse().expect("valid timestamp")
}

fn test_registry(base_url: &str, clock: Arc<dyn Clock>) -> ToolRegistry {
    let budget = Arc::new(RateBudget::new(100, 100_000));
    let config = ProviderClientConfig {
        api_key: "test-api-key".to_string(),
        base_url: base_url.to_string(),
        timeout: Duration::from_secs(5),
        policy: ExhaustionPolicy::FailFast,
    };
    let client = Arc::new(ProviderClient::new(config, budget).unwrap());
    ToolRegistry::with_default_tools(client, clock, Duration::from_secs(30)).unwrap()
}

fn envelope(results: Vec<Value>, total_count: u64) -> Value {
    json!({
        "meta": {"total_count": total_count},
        "results": results,
    })
}

#[test]
fn test_catalog_lists_all_tools_in_stable_order() {
    let registry = test_registry("http://127.0.0.1:9", Arc::new(ManualClock::new(frozen_time())));

    assert_eq!(
        registry.tool_names(),
        vec![
            "search_opportunities",
            "search_contracts",
            "search_grants",
            "get_documents",
            "search_awardees",
            "search_awardees_by_name",
            "get_awardee_details",
            "get_awardee_certifications",
            "search_agencies",
            "search_contract_vehicles",
            "search_people",
            "lookup_naics",
            "lookup_psc",
        ]
    );
}

#[tokio::test]
async fn test_unknown_tool_is_rejected_at_dispatch() {
    let registry = test_registry("http://127.0.0.1:9", Arc::new(ManualClock::new(frozen_time())));
    let result = registry.invoke("search_everything", &json!({})).await;
    assert!(matches!(result, Err(ToolError::UnknownTool(_))));
}

#[tokio::test]
async fn test_oversized_page_size_is_clamped_in_the_outgoing_request() {
    let mock_server = MockServer::start().await;

    // The mock only matches the clamped value; an unclamped 500 would 404
    Mock::given(method("GET"))
        .and(path("/contract/"))
        .and(query_param("page_size", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![], 0)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("search_contracts", &json!({"page_size": 500}))
        .await
        .unwrap();

    assert_eq!(output["page_size"], 100);
}

#[tokio::test]
async fn test_lookup_naics_known_code_scenario() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/naics/"))
        .and(query_param("naics_code", "541512"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![json!({
                "naics_code": "541512",
                "title": "Computer Systems Design Services",
                "description": "Establishments primarily engaged in planning and designing computer systems."
            })],
            1,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("lookup_naics", &json!({"naics_code": "541512"}))
        .await
        .unwrap();

    let codes = output["naics_codes"].as_array().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["naics_code"], "541512");
    assert!(!codes[0]["description"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_lookup_naics_malformed_code_never_reaches_the_provider() {
    // No mock server at all: a request would fail loudly
    let registry = test_registry("http://127.0.0.1:9", Arc::new(ManualClock::new(frozen_time())));

    let result = registry
        .invoke("lookup_naics", &json!({"naics_code": "54151A"}))
        .await;

    match result {
        Err(ToolError::Validation { field, .. }) => assert_eq!(field, "naics_code"),
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_schema_rejects_undeclared_parameters() {
    let registry = test_registry("http://127.0.0.1:9", Arc::new(ManualClock::new(frozen_time())));

    let result = registry
        .invoke("search_grants", &json!({"cfda": "93.243"}))
        .await;
    assert!(matches!(result, Err(ToolError::Validation { .. })));
}

#[tokio::test]
async fn test_empty_result_page_is_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/grant/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![], 0)))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry.invoke("search_grants", &json!({})).await.unwrap();

    assert_eq!(output["grants"], json!([]));
    assert_eq!(output["total_count"], 0);
    assert_eq!(output["truncated"], false);
}

#[tokio::test]
async fn test_awardee_details_preserves_every_certification() {
    let mock_server = MockServer::start().await;

    let raw_awardee = json!({
        "awardee_key": "AW-1001",
        "name": "Apex Federal Solutions LLC",
        "uei": "ABCDEFGH1234",
        "primary_naics": "541512",
        "naics_codes": [
            {"code": "541512", "primary": true},
            {"code": "541519"},
            "541611"
        ],
        "psc_codes": ["D302"],
        "certifications": [
            {"name": "8(a)", "sba_certified": true},
            {"name": "WOSB", "sba_certified": false},
            {"name": "HUBZone", "sba_certified": true},
            {"name": "VOSB"}
        ],
        "parent": {"awardee_key": "AW-2000", "name": "Apex Holdings Inc"},
        "contacts": [{"name": "Dana Whitfield", "email": "dana@apexfed.example"}]
    });

    Mock::given(method("GET"))
        .and(path("/awardee/"))
        .and(query_param("awardee_key", "AW-1001"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![raw_awardee], 1)))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("get_awardee_details", &json!({"awardee_key": "AW-1001"}))
        .await
        .unwrap();

    assert_eq!(output["found"], true);
    let awardee = &output["awardee"];

    // Four certifications in, four out, each with a status tag
    let certifications = awardee["certifications"].as_array().unwrap();
    assert_eq!(certifications.len(), 4);
    assert_eq!(certifications[0]["status"], "sba_certified");
    assert_eq!(certifications[1]["status"], "self_certified");
    assert_eq!(certifications[3]["status"], "self_certified");

    // All code assignments enumerated, not just the primary
    let naics = awardee["naics_codes"].as_array().unwrap();
    assert_eq!(naics.len(), 3);
    assert_eq!(naics[0]["primary"], true);
    assert_eq!(naics[1]["primary"], false);

    // Parent linkage surfaced explicitly
    assert_eq!(awardee["parent"]["awardee_key"], "AW-2000");
    assert_eq!(awardee["contacts"][0]["email"], "dana@apexfed.example");
}

#[tokio::test]
async fn test_awardee_certifications_lookup() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/awardee/"))
        .and(query_param("awardee_key", "AW-5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![json!({
                "awardee_key": "AW-5",
                "certifications": [{"name": "8(a)", "sba_certified": true}]
            })],
            1,
        )))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("get_awardee_certifications", &json!({"awardee_key": "AW-5"}))
        .await
        .unwrap();

    assert_eq!(output["found"], true);
    assert_eq!(output["awardee_key"], "AW-5");
    assert_eq!(output["certifications"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_awardee_details_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/awardee/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(vec![], 0)))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("get_awardee_details", &json!({"awardee_key": "AW-404"}))
        .await
        .unwrap();

    assert_eq!(output["found"], false);
    assert_eq!(output["awardee"], Value::Null);
}

#[tokio::test]
async fn test_document_links_expire_exactly_sixty_minutes_after_issuance() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/document/"))
        .and(query_param("related_key", "opp_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![
                json!({
                    "document_key": "doc_1",
                    "filename": "sow.pdf",
                    "file_type": "pdf",
                    "file_size": 120400,
                    "download_url": "https://example.gov/download/doc_1"
                }),
                json!({
                    "document_key": "doc_2",
                    "filename": "attachment_a.docx",
                    "download_url": "https://example.gov/download/doc_2"
                }),
            ],
            2,
        )))
        .mount(&mock_server)
        .await;

    let issued_at = frozen_time();
    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(issued_at)));
    let output = registry
        .invoke("get_documents", &json!({"related_key": "opp_1"}))
        .await
        .unwrap();

    let documents = output["documents"].as_array().unwrap();
    assert_eq!(documents.len(), 2);

    for document in documents {
        let link = &document["link"];
        let issued: DateTime<Utc> = link["issued_at"].as_str().unwrap().parse().unwrap();
        let expires: DateTime<Utc> = link["expires_at"].as_str().unwrap().parse().unwrap();
        assert_eq!(issued, issued_at);
        assert_eq!(expires - issued, ChronoDuration::minutes(60));
    }
}

#[tokio::test]
async fn test_search_results_labeled_truncated_at_result_cap() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/opportunity/"))
        .and(query_param("page_number", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![
                json!({"opportunity_key": "o1"}),
                json!({"opportunity_key": "o2"}),
            ],
            50,
        )))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/opportunity/"))
        .and(query_param("page_number", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![
                json!({"opportunity_key": "o3"}),
                json!({"opportunity_key": "o4"}),
            ],
            50,
        )))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke(
            "search_opportunities",
            &json!({"page_size": 2, "max_records": 3}),
        )
        .await
        .unwrap();

    assert_eq!(output["opportunities"].as_array().unwrap().len(), 3);
    assert_eq!(output["truncated"], true);
}

#[tokio::test]
async fn test_search_awardees_by_name_maps_to_text_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/awardee/"))
        .and(query_param("search", "Apex Federal"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(
            vec![json!({"awardee_key": "AW-1001", "name": "Apex Federal Solutions LLC"})],
            1,
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let output = registry
        .invoke("search_awardees_by_name", &json!({"name": "Apex Federal"}))
        .await
        .unwrap();

    let awardees = output["awardees"].as_array().unwrap();
    assert_eq!(awardees.len(), 1);
    assert_eq!(awardees[0]["name"], "Apex Federal Solutions LLC");
}

#[tokio::test]
async fn test_upstream_rejection_carries_provider_detail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/people/"))
        .respond_with(ResponseTemplate::new(403).set_body_string("api key revoked"))
        .mount(&mock_server)
        .await;

    let registry = test_registry(&mock_server.uri(), Arc::new(ManualClock::new(frozen_time())));
    let result = registry.invoke("search_people", &json!({})).await;

    match result {
        Err(ToolError::Provider(govsearch::ProviderError::Upstream { status, detail })) => {
            assert_eq!(status, 403);
            assert!(detail.contains("api key revoked"));
        }
        other => panic!("expected upstream error, got {other:?}"),
    }
}
