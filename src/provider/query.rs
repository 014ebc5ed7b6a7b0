//! Query construction for the provider REST API
//!
//! Each tool maps its parameters onto one of the provider's endpoints here.
//! Filters are checked against the endpoint's supported field list, dates and
//! classification codes are shape-validated before anything goes on the wire,
//! and page sizes are clamped to the provider maximum rather than rejected.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use thiserror::Error;

/// Provider maximum page size; larger requests are clamped
pub const MAX_PAGE_SIZE: u32 = 100;
/// Provider recommended page size for search endpoints
pub const DEFAULT_PAGE_SIZE: u32 = 25;
/// Default page size for NAICS/PSC code lookups
pub const DEFAULT_LOOKUP_PAGE_SIZE: u32 = 50;

/// Caller input that failed validation, naming the offending field
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Provider REST endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    Opportunity,
    Contract,
    Grant,
    Awardee,
    Document,
    Agency,
    Vehicle,
    People,
    Naics,
    Psc,
}

impl Endpoint {
    /// URL path segment for this endpoint
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Opportunity => "opportunity",
            Endpoint::Contract => "contract",
            Endpoint::Grant => "grant",
            Endpoint::Awardee => "awardee",
            Endpoint::Document => "document",
            Endpoint::Agency => "agency",
            Endpoint::Vehicle => "vehicle",
            Endpoint::People => "people",
            Endpoint::Naics => "naics",
            Endpoint::Psc => "psc",
        }
    }

    /// Filter fields this endpoint accepts
    pub fn supported_fields(&self) -> &'static [&'static str] {
        match self {
            Endpoint::Opportunity => &[
                "search_id",
                "agency_key",
                "source_type",
                "captured_date__gte",
                "captured_date__lte",
            ],
            Endpoint::Contract => &[
                "search_id",
                "award_id",
                "awardee_key",
                "naics_code",
                "psc_code",
                "last_modified_date__gte",
            ],
            Endpoint::Grant => &[
                "search_id",
                "awardee_key",
                "cfda_program_number",
                "last_modified_date__gte",
            ],
            Endpoint::Awardee => &[
                "awardee_key",
                "cage_code",
                "uei",
                "awardee_key_parent",
                "primary_naics",
                "registration_last_update_date__gte",
                "search",
            ],
            Endpoint::Document => &["related_key"],
            Endpoint::Agency => &["agency_key"],
            Endpoint::Vehicle => &["vehicle_key"],
            Endpoint::People => &["contact_email"],
            Endpoint::Naics => &["naics_code"],
            Endpoint::Psc => &["psc_code"],
        }
    }
}

/// A validated, ready-to-send provider query
///
/// Filters are kept in a BTreeMap so the rendered query string is
/// deterministic for a given parameter set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRequest {
    endpoint: Endpoint,
    filters: BTreeMap<&'static str, String>,
    page_number: u32,
    page_size: u32,
    ordering: Option<String>,
}

impl QueryRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            filters: BTreeMap::new(),
            page_number: 1,
            page_size: DEFAULT_PAGE_SIZE,
            ordering: None,
        }
    }

    pub fn endpoint(&self) -> Endpoint {
        self.endpoint
    }

    pub fn page_number(&self) -> u32 {
        self.page_number
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// Attach a filter; the field must be in the endpoint's supported list
    pub fn with_filter<V: Into<String>>(
        mut self,
        field: &'static str,
        value: V,
    ) -> Result<Self, ValidationError> {
        if !self.endpoint.supported_fields().contains(&field) {
            return Err(ValidationError::new(
                field,
                format!("not a supported filter for {}", self.endpoint.path()),
            ));
        }
        self.filters.insert(field, value.into());
        Ok(self)
    }

    /// Set the 1-based page number
    pub fn with_page_number(mut self, page_number: u32) -> Result<Self, ValidationError> {
        if page_number == 0 {
            return Err(ValidationError::new("page_number", "pages are numbered from 1"));
        }
        self.page_number = page_number;
        Ok(self)
    }

    /// Set the page size, clamping to the provider maximum
    pub fn with_page_size(mut self, requested: u32) -> Self {
        self.page_size = requested.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_ordering<S: Into<String>>(mut self, ordering: S) -> Self {
        self.ordering = Some(ordering.into());
        self
    }

    /// Same query pointed at a different page
    pub fn at_page(&self, page_number: u32) -> Self {
        let mut next = self.clone();
        next.page_number = page_number;
        next
    }

    /// Render the query string pairs, excluding the credential
    pub fn query_pairs(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = self
            .filters
            .iter()
            .map(|(field, value)| ((*field).to_string(), value.clone()))
            .collect();
        if let Some(ordering) = &self.ordering {
            pairs.push(("ordering".to_string(), ordering.clone()));
        }
        pairs.push(("page_number".to_string(), self.page_number.to_string()));
        pairs.push(("page_size".to_string(), self.page_size.to_string()));
        pairs
    }
}

static NAICS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{2,6}$").expect("NAICS pattern compiles"));
static PSC_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z0-9]{1,4}$").expect("PSC pattern compiles"));

/// Validate a `YYYY-MM-DD` date parameter
pub fn validate_date(field: &str, value: &str) -> Result<(), ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|_| ValidationError::new(field, format!("'{value}' is not a YYYY-MM-DD date")))
}

/// Validate a NAICS code: 2 to 6 digits (partial prefixes allowed)
pub fn validate_naics(field: &str, value: &str) -> Result<(), ValidationError> {
    if NAICS_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("'{value}' is not a NAICS code (2-6 digits)"),
        ))
    }
}

/// Validate a PSC code: 1 to 4 uppercase alphanumerics (partial prefixes allowed)
pub fn validate_psc(field: &str, value: &str) -> Result<(), ValidationError> {
    if PSC_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("'{value}' is not a PSC code (1-4 uppercase alphanumerics)"),
        ))
    }
}

/// Validate an opaque key parameter (agency, awardee, vehicle, search keys)
pub fn validate_nonempty(field: &str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new(field, "must not be empty"))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_filter_must_be_supported_by_endpoint() {
        let result = QueryRequest::new(Endpoint::Agency).with_filter("naics_code", "541512");
        let err = result.unwrap_err();
        assert_eq!(err.field, "naics_code");

        let ok = QueryRequest::new(Endpoint::Agency).with_filter("agency_key", "DOD-1234");
        assert!(ok.is_ok());
    }

    #[test]
    fn test_page_size_clamped_not_rejected() {
        let request = QueryRequest::new(Endpoint::Contract).with_page_size(500);
        assert_eq!(request.page_size(), MAX_PAGE_SIZE);

        let request = QueryRequest::new(Endpoint::Contract).with_page_size(0);
        assert_eq!(request.page_size(), 1);
    }

    #[test]
    fn test_page_number_zero_rejected() {
        let result = QueryRequest::new(Endpoint::Grant).with_page_number(0);
        assert_eq!(result.unwrap_err().field, "page_number");
    }

    #[test]
    fn test_query_pairs_deterministic_and_complete() {
        let request = QueryRequest::new(Endpoint::Contract)
            .with_filter("naics_code", "541512")
            .unwrap()
            .with_filter("awardee_key", "AW-77")
            .unwrap()
            .with_ordering("-last_modified_date")
            .with_page_size(10);

        let pairs = request.query_pairs();
        assert_eq!(
            pairs,
            vec![
                ("awardee_key".to_string(), "AW-77".to_string()),
                ("naics_code".to_string(), "541512".to_string()),
                ("ordering".to_string(), "-last_modified_date".to_string()),
                ("page_number".to_string(), "1".to_string()),
                ("page_size".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_at_page_preserves_everything_else() {
        let request = QueryRequest::new(Endpoint::Opportunity)
            .with_filter("agency_key", "NASA")
            .unwrap()
            .with_page_size(50);
        let next = request.at_page(3);

        assert_eq!(next.page_number(), 3);
        assert_eq!(next.page_size(), 50);
        assert_eq!(next.endpoint(), Endpoint::Opportunity);
    }

    #[test]
    fn test_validate_date_accepts_iso_dates() {
        assert!(validate_date("captured_date_min", "2025-01-31").is_ok());
        assert!(validate_date("captured_date_min", "2025-02-30").is_err());
        assert!(validate_date("captured_date_min", "01/31/2025").is_err());
        assert!(validate_date("captured_date_min", "yesterday").is_err());
    }

    #[test]
    fn test_validate_naics_shapes() {
        assert!(validate_naics("naics_code", "54").is_ok());
        assert!(validate_naics("naics_code", "541512").is_ok());
        assert!(validate_naics("naics_code", "5").is_err());
        assert!(validate_naics("naics_code", "5415123").is_err());
        assert!(validate_naics("naics_code", "54A512").is_err());
    }

    #[test]
    fn test_validate_psc_shapes() {
        assert!(validate_psc("psc_code", "R425").is_ok());
        assert!(validate_psc("psc_code", "7030").is_ok());
        assert!(validate_psc("psc_code", "R").is_ok());
        assert!(validate_psc("psc_code", "r425").is_err());
        assert!(validate_psc("psc_code", "R4255").is_err());
        assert!(validate_psc("psc_code", "").is_err());
    }

    #[test]
    fn test_validate_nonempty() {
        assert!(validate_nonempty("related_key", "opp_123").is_ok());
        assert!(validate_nonempty("related_key", "   ").is_err());
    }

    proptest! {
        #[test]
        fn prop_page_size_always_within_provider_bounds(requested in 0u32..10_000) {
            let request = QueryRequest::new(Endpoint::Contract).with_page_size(requested);
            prop_assert!(request.page_size() >= 1);
            prop_assert!(request.page_size() <= MAX_PAGE_SIZE);
        }

        #[test]
        fn prop_filters_are_subset_of_supported_fields(
            value in "[a-z0-9]{1,12}",
            pick in 0usize..6,
        ) {
            let endpoint = Endpoint::Contract;
            let field = endpoint.supported_fields()[pick % endpoint.supported_fields().len()];
            let request = QueryRequest::new(endpoint).with_filter(field, value).unwrap();
            for (key, _) in request.query_pairs() {
                prop_assert!(
                    endpoint.supported_fields().contains(&key.as_str())
                        || key == "page_number"
                        || key == "page_size"
                        || key == "ordering"
                );
            }
        }
    }
}
