//! Response normalization
//!
//! Reshapes raw provider records into each tool's declared output type. The
//! simple search tools only rename and type fields; entity lookups get the
//! full flattening treatment in [`entity`]; document retrieval stamps every
//! link with its 60-minute validity window.
//!
//! All extraction is lenient: a missing or mistyped provider field becomes
//! `None` rather than a failure, so upstream schema drift degrades a record
//! instead of killing the whole page.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod entity;

pub use entity::{
    awardee_profile, awardee_summary, certifications, AwardeeProfile, AwardeeSummary,
    Certification, CertificationStatus, CodeAssignment, ParentReference, PointOfContact,
};

/// Fixed validity window the provider grants download URLs, in minutes
pub const DOCUMENT_LINK_VALIDITY_MINUTES: i64 = 60;

/// Extract a string field
pub(crate) fn str_field(record: &Value, field: &str) -> Option<String> {
    record
        .get(field)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
}

/// Extract a numeric field, accepting number-shaped strings
pub(crate) fn num_field(record: &Value, field: &str) -> Option<f64> {
    match record.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract an unsigned integer field, accepting number-shaped strings
pub(crate) fn int_field(record: &Value, field: &str) -> Option<u64> {
    match record.get(field) {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Extract a boolean field, accepting "true"/"false" strings
pub(crate) fn bool_field(record: &Value, field: &str) -> Option<bool> {
    match record.get(field) {
        Some(Value::Bool(b)) => Some(*b),
        Some(Value::String(s)) => match s.to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// Extract a list of strings from an array or a comma-separated string
pub(crate) fn string_list(record: &Value, field: &str) -> Vec<String> {
    match record.get(field) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Object(_) => item
                    .get("code")
                    .and_then(|c| c.as_str())
                    .map(|s| s.to_string()),
                _ => None,
            })
            .collect(),
        Some(Value::String(s)) => s
            .split(',')
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

/// A federal contract or grant opportunity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub opportunity_key: Option<String>,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub source_type: Option<String>,
    pub posted_date: Option<String>,
    pub due_date: Option<String>,
    pub naics_codes: Vec<String>,
    pub psc_codes: Vec<String>,
    pub set_aside: Option<String>,
    pub place_of_performance: Option<String>,
    pub estimated_value: Option<f64>,
    pub url: Option<String>,
    pub document_path: Option<String>,
}

pub fn opportunity(record: &Value) -> Opportunity {
    Opportunity {
        opportunity_key: str_field(record, "opportunity_key"),
        title: str_field(record, "title"),
        agency: str_field(record, "agency_name"),
        source_type: str_field(record, "source_type"),
        posted_date: str_field(record, "posted_date"),
        due_date: str_field(record, "due_date"),
        naics_codes: string_list(record, "naics_codes"),
        psc_codes: string_list(record, "psc_codes"),
        set_aside: str_field(record, "set_aside"),
        place_of_performance: str_field(record, "place_of_performance"),
        estimated_value: num_field(record, "estimated_value"),
        url: str_field(record, "url"),
        document_path: str_field(record, "document_path"),
    }
}

/// A federal contract award
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractAward {
    pub contract_key: Option<String>,
    pub award_id: Option<String>,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub awardee_name: Option<String>,
    pub awardee_cage: Option<String>,
    pub awardee_uei: Option<String>,
    pub obligated_amount: Option<f64>,
    pub potential_value: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub naics_code: Option<String>,
    pub psc_code: Option<String>,
    pub place_of_performance: Option<String>,
    pub contract_type: Option<String>,
    pub set_aside: Option<String>,
}

pub fn contract(record: &Value) -> ContractAward {
    ContractAward {
        contract_key: str_field(record, "contract_key"),
        award_id: str_field(record, "award_id"),
        title: str_field(record, "title"),
        agency: str_field(record, "agency_name"),
        awardee_name: str_field(record, "awardee_name"),
        awardee_cage: str_field(record, "awardee_cage"),
        awardee_uei: str_field(record, "awardee_uei"),
        obligated_amount: num_field(record, "obligated_amount"),
        potential_value: num_field(record, "potential_value"),
        start_date: str_field(record, "start_date"),
        end_date: str_field(record, "end_date"),
        naics_code: str_field(record, "naics_code"),
        psc_code: str_field(record, "psc_code"),
        place_of_performance: str_field(record, "place_of_performance_state"),
        contract_type: str_field(record, "contract_type"),
        set_aside: str_field(record, "set_aside"),
    }
}

/// A federal grant award
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrantAward {
    pub grant_key: Option<String>,
    pub award_id: Option<String>,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub awardee_name: Option<String>,
    pub awardee_uei: Option<String>,
    pub obligated_amount: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub cfda_number: Option<String>,
    pub cfda_title: Option<String>,
    pub place_of_performance: Option<String>,
}

pub fn grant(record: &Value) -> GrantAward {
    GrantAward {
        grant_key: str_field(record, "grant_key"),
        award_id: str_field(record, "award_id"),
        title: str_field(record, "title"),
        agency: str_field(record, "agency_name"),
        awardee_name: str_field(record, "awardee_name"),
        awardee_uei: str_field(record, "awardee_uei"),
        obligated_amount: num_field(record, "obligated_amount"),
        start_date: str_field(record, "start_date"),
        end_date: str_field(record, "end_date"),
        cfda_number: str_field(record, "cfda_program_number"),
        cfda_title: str_field(record, "cfda_program_title"),
        place_of_performance: str_field(record, "place_of_performance_state"),
    }
}

/// A federal agency
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Agency {
    pub agency_key: Option<String>,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub parent_agency: Option<String>,
    pub agency_type: Option<String>,
}

pub fn agency(record: &Value) -> Agency {
    Agency {
        agency_key: str_field(record, "agency_key"),
        name: str_field(record, "name"),
        abbreviation: str_field(record, "abbreviation"),
        parent_agency: str_field(record, "parent_agency_name"),
        agency_type: str_field(record, "agency_type"),
    }
}

/// A government contract vehicle (GWAC, BPA, IDIQ, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContractVehicle {
    pub vehicle_key: Option<String>,
    pub name: Option<String>,
    pub abbreviation: Option<String>,
    pub agency: Option<String>,
    pub vehicle_type: Option<String>,
    pub ceiling: Option<f64>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub naics_codes: Vec<String>,
    pub psc_codes: Vec<String>,
}

pub fn vehicle(record: &Value) -> ContractVehicle {
    ContractVehicle {
        vehicle_key: str_field(record, "vehicle_key"),
        name: str_field(record, "name"),
        abbreviation: str_field(record, "abbreviation"),
        agency: str_field(record, "agency_name"),
        vehicle_type: str_field(record, "vehicle_type"),
        ceiling: num_field(record, "ceiling"),
        start_date: str_field(record, "start_date"),
        end_date: str_field(record, "end_date"),
        naics_codes: string_list(record, "naics_codes"),
        psc_codes: string_list(record, "psc_codes"),
    }
}

/// A government point of contact
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub people_key: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub agency: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn person(record: &Value) -> Person {
    Person {
        people_key: str_field(record, "people_key"),
        name: str_field(record, "name"),
        title: str_field(record, "title"),
        agency: str_field(record, "agency_name"),
        email: str_field(record, "email"),
        phone: str_field(record, "phone"),
    }
}

/// A NAICS code catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NaicsEntry {
    pub naics_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

pub fn naics_entry(record: &Value) -> NaicsEntry {
    NaicsEntry {
        naics_code: str_field(record, "naics_code"),
        title: str_field(record, "title"),
        description: str_field(record, "description"),
    }
}

/// A Product/Service Code catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PscEntry {
    pub psc_code: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
}

pub fn psc_entry(record: &Value) -> PscEntry {
    PscEntry {
        psc_code: str_field(record, "psc_code"),
        title: str_field(record, "title"),
        description: str_field(record, "description"),
    }
}

/// A download URL with its validity window
///
/// The provider invalidates download URLs 60 minutes after issuance. Both
/// timestamps are surfaced so a caller can detect a dead link without asking.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentLink {
    pub url: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl DocumentLink {
    /// Stamp a freshly issued link
    pub fn issue(url: String, issued_at: DateTime<Utc>) -> Self {
        Self {
            url,
            issued_at,
            expires_at: issued_at + ChronoDuration::minutes(DOCUMENT_LINK_VALIDITY_MINUTES),
        }
    }

    /// Whether the link is still usable at the given instant
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// An opportunity attachment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentEntry {
    pub document_key: Option<String>,
    pub filename: Option<String>,
    pub file_type: Option<String>,
    pub file_size: Option<u64>,
    pub link: Option<DocumentLink>,
}

pub fn document(record: &Value, issued_at: DateTime<Utc>) -> DocumentEntry {
    DocumentEntry {
        document_key: str_field(record, "document_key"),
        filename: str_field(record, "filename"),
        file_type: str_field(record, "file_type"),
        file_size: int_field(record, "file_size"),
        link: str_field(record, "download_url").map(|url| DocumentLink::issue(url, issued_at)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_opportunity_field_projection() {
        let raw = json!({
            "opportunity_key": "opp_1",
            "title": "Network modernization",
            "agency_name": "Department of the Navy",
            "source_type": "sam_gov",
            "posted_date": "2025-05-01",
            "due_date": "2025-06-15",
            "naics_codes": ["541512", "541519"],
            "psc_codes": ["D302"],
            "set_aside": "SBA",
            "estimated_value": 2500000,
            "url": "https://example.gov/opp_1",
            "unrelated_field": "ignored"
        });

        let opp = opportunity(&raw);
        assert_eq!(opp.opportunity_key.as_deref(), Some("opp_1"));
        assert_eq!(opp.agency.as_deref(), Some("Department of the Navy"));
        assert_eq!(opp.naics_codes, vec!["541512", "541519"]);
        assert_eq!(opp.psc_codes, vec!["D302"]);
        assert_eq!(opp.estimated_value, Some(2_500_000.0));
        assert_eq!(opp.place_of_performance, None);
    }

    #[test]
    fn test_contract_renames_place_of_performance() {
        let raw = json!({
            "contract_key": "c_9",
            "award_id": "W91QV1-25-C-0001",
            "place_of_performance_state": "VA",
            "obligated_amount": "1250000.50"
        });

        let award = contract(&raw);
        assert_eq!(award.award_id.as_deref(), Some("W91QV1-25-C-0001"));
        assert_eq!(award.place_of_performance.as_deref(), Some("VA"));
        assert_eq!(award.obligated_amount, Some(1_250_000.5));
    }

    #[test]
    fn test_grant_cfda_fields() {
        let raw = json!({
            "grant_key": "g_4",
            "cfda_program_number": "93.243",
            "cfda_program_title": "Substance Abuse and Mental Health Services"
        });

        let award = grant(&raw);
        assert_eq!(award.cfda_number.as_deref(), Some("93.243"));
        assert!(award.cfda_title.is_some());
    }

    #[test]
    fn test_missing_fields_become_none_not_errors() {
        let empty = json!({});
        let opp = opportunity(&empty);
        assert_eq!(opp.title, None);
        assert!(opp.naics_codes.is_empty());

        let entry = naics_entry(&empty);
        assert_eq!(entry.naics_code, None);
    }

    #[test]
    fn test_string_list_accepts_comma_separated_form() {
        let raw = json!({"naics_codes": "541511, 541512,541519"});
        assert_eq!(
            string_list(&raw, "naics_codes"),
            vec!["541511", "541512", "541519"]
        );
    }

    #[test]
    fn test_string_list_accepts_object_entries() {
        let raw = json!({"naics_codes": [{"code": "541511", "primary": true}, "541512"]});
        assert_eq!(string_list(&raw, "naics_codes"), vec!["541511", "541512"]);
    }

    #[test]
    fn test_document_link_expires_exactly_sixty_minutes_after_issue() {
        let issued: DateTime<Utc> = "2025-06-01T12:00:00Z".parse().unwrap();
        let link = DocumentLink::issue("https://example.gov/doc.pdf".to_string(), issued);

        assert_eq!(link.expires_at - link.issued_at, ChronoDuration::minutes(60));
        assert!(link.is_usable(issued));
        assert!(link.is_usable(issued + ChronoDuration::minutes(59)));
        assert!(!link.is_usable(issued + ChronoDuration::minutes(60)));
        assert!(!link.is_usable(issued + ChronoDuration::minutes(61)));
    }

    #[test]
    fn test_document_without_url_has_no_link() {
        let issued: DateTime<Utc> = "2025-06-01T12:00:00Z".parse().unwrap();
        let raw = json!({"document_key": "doc_1", "filename": "sow.pdf"});

        let entry = document(&raw, issued);
        assert_eq!(entry.document_key.as_deref(), Some("doc_1"));
        assert!(entry.link.is_none());
    }

    #[test]
    fn test_document_projection_with_link() {
        let issued: DateTime<Utc> = "2025-06-01T12:00:00Z".parse().unwrap();
        let raw = json!({
            "document_key": "doc_2",
            "filename": "attachment_a.docx",
            "file_type": "docx",
            "file_size": 18234,
            "download_url": "https://example.gov/download/doc_2"
        });

        let entry = document(&raw, issued);
        assert_eq!(entry.file_size, Some(18234));
        let link = entry.link.unwrap();
        assert_eq!(link.url, "https://example.gov/download/doc_2");
        assert_eq!(link.issued_at, issued);
    }

    #[test]
    fn test_numeric_coercions() {
        let raw = json!({"a": 5, "b": "5", "c": "not a number", "d": true});
        assert_eq!(num_field(&raw, "a"), Some(5.0));
        assert_eq!(num_field(&raw, "b"), Some(5.0));
        assert_eq!(num_field(&raw, "c"), None);
        assert_eq!(num_field(&raw, "d"), None);
        assert_eq!(int_field(&raw, "a"), Some(5));
        assert_eq!(bool_field(&raw, "d"), Some(true));
    }
}
