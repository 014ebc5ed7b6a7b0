//! Entity (awardee) normalization
//!
//! The awardee endpoint returns the most deeply nested records in the API:
//! certification arrays, NAICS/PSC assignment arrays, contact lists, and
//! parent-company linkage. Lookup tools get a fully flattened view — every
//! code assignment is enumerated (never collapsed to the primary), and every
//! certification keeps its SBA-certified vs self-certified distinction.

use super::{bool_field, num_field, str_field, string_list};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Whether a certification was validated by the SBA or self-asserted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    SbaCertified,
    SelfCertified,
}

/// One certification held by an awardee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certification {
    pub name: Option<String>,
    pub status: CertificationStatus,
    pub active: Option<bool>,
    pub expiration_date: Option<String>,
}

/// One NAICS or PSC code assignment
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CodeAssignment {
    pub code: String,
    pub description: Option<String>,
    pub primary: bool,
}

/// Link to a parent company
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentReference {
    pub awardee_key: String,
    pub name: Option<String>,
}

/// A point of contact listed on the entity registration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PointOfContact {
    pub name: Option<String>,
    pub title: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Flat awardee view returned by the search tools
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardeeSummary {
    pub awardee_key: Option<String>,
    pub name: Option<String>,
    pub cage_code: Option<String>,
    pub uei: Option<String>,
    pub duns: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub primary_naics: Option<String>,
    pub naics_codes: Vec<String>,
    pub small_business: Option<bool>,
    pub woman_owned: Option<bool>,
    pub veteran_owned: Option<bool>,
    pub minority_owned: Option<bool>,
    pub eight_a_certified: Option<bool>,
    pub hubzone: Option<bool>,
    pub sdvosb: Option<bool>,
    pub total_awards: Option<f64>,
    pub total_obligated: Option<f64>,
}

/// Enriched awardee view returned by the detail lookup
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AwardeeProfile {
    pub awardee_key: Option<String>,
    pub name: Option<String>,
    pub cage_code: Option<String>,
    pub uei: Option<String>,
    pub duns: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub website: Option<String>,
    pub registration_date: Option<String>,
    pub primary_naics: Option<String>,
    pub naics_codes: Vec<CodeAssignment>,
    pub psc_codes: Vec<CodeAssignment>,
    pub certifications: Vec<Certification>,
    pub parent: Option<ParentReference>,
    pub contacts: Vec<PointOfContact>,
    pub total_awards: Option<f64>,
    pub total_obligated: Option<f64>,
}

pub fn awardee_summary(record: &Value) -> AwardeeSummary {
    AwardeeSummary {
        awardee_key: str_field(record, "awardee_key"),
        name: str_field(record, "name"),
        cage_code: str_field(record, "cage_code"),
        uei: str_field(record, "uei"),
        duns: str_field(record, "duns"),
        address: str_field(record, "address"),
        city: str_field(record, "city"),
        state: str_field(record, "state"),
        country: str_field(record, "country"),
        primary_naics: str_field(record, "primary_naics"),
        naics_codes: string_list(record, "naics_codes"),
        small_business: bool_field(record, "small_business"),
        woman_owned: bool_field(record, "woman_owned"),
        veteran_owned: bool_field(record, "veteran_owned"),
        minority_owned: bool_field(record, "minority_owned"),
        eight_a_certified: bool_field(record, "8a_certified"),
        hubzone: bool_field(record, "hubzone"),
        sdvosb: bool_field(record, "sdvosb"),
        total_awards: num_field(record, "total_awards"),
        total_obligated: num_field(record, "total_obligated"),
    }
}

pub fn awardee_profile(record: &Value) -> AwardeeProfile {
    AwardeeProfile {
        awardee_key: str_field(record, "awardee_key"),
        name: str_field(record, "name"),
        cage_code: str_field(record, "cage_code"),
        uei: str_field(record, "uei"),
        duns: str_field(record, "duns"),
        address: str_field(record, "address"),
        city: str_field(record, "city"),
        state: str_field(record, "state"),
        country: str_field(record, "country"),
        website: str_field(record, "website"),
        registration_date: str_field(record, "registration_date"),
        primary_naics: str_field(record, "primary_naics"),
        naics_codes: code_assignments(record, "naics_codes", "primary_naics"),
        psc_codes: code_assignments(record, "psc_codes", "primary_psc"),
        certifications: certifications(record),
        parent: parent_reference(record),
        contacts: contacts(record),
        total_awards: num_field(record, "total_awards"),
        total_obligated: num_field(record, "total_obligated"),
    }
}

/// Flatten every certification entry, preserving cardinality
///
/// The SBA-certified flag comes from the provider's `sba_certified` boolean;
/// anything the SBA has not validated is reported as self-certified.
pub fn certifications(record: &Value) -> Vec<Certification> {
    let Some(entries) = record.get("certifications").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    entries
        .iter()
        .map(|entry| match entry {
            Value::String(name) => Certification {
                name: Some(name.clone()),
                status: CertificationStatus::SelfCertified,
                active: None,
                expiration_date: None,
            },
            _ => Certification {
                name: str_field(entry, "name").or_else(|| str_field(entry, "certification")),
                status: if bool_field(entry, "sba_certified").unwrap_or(false) {
                    CertificationStatus::SbaCertified
                } else {
                    CertificationStatus::SelfCertified
                },
                active: bool_field(entry, "active"),
                expiration_date: str_field(entry, "expiration_date"),
            },
        })
        .collect()
}

/// Enumerate every code assignment for the given field
///
/// Entries may be plain code strings or objects with code/description/primary
/// members. A record-level primary field marks the matching entry when the
/// entries themselves carry no primary flag.
fn code_assignments(record: &Value, field: &str, primary_field: &str) -> Vec<CodeAssignment> {
    let record_primary = str_field(record, primary_field);
    let Some(entries) = record.get(field).and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::String(code) => Some(CodeAssignment {
                code: code.clone(),
                description: None,
                primary: record_primary.as_deref() == Some(code.as_str()),
            }),
            Value::Object(_) => {
                let code = str_field(entry, "code")?;
                let primary = bool_field(entry, "primary")
                    .unwrap_or_else(|| record_primary.as_deref() == Some(code.as_str()));
                Some(CodeAssignment {
                    code,
                    description: str_field(entry, "description"),
                    primary,
                })
            }
            _ => None,
        })
        .collect()
}

/// Surface parent-company linkage as an explicit reference
fn parent_reference(record: &Value) -> Option<ParentReference> {
    if let Some(parent) = record.get("parent").filter(|v| v.is_object()) {
        let awardee_key = str_field(parent, "awardee_key")?;
        return Some(ParentReference {
            awardee_key,
            name: str_field(parent, "name"),
        });
    }

    str_field(record, "awardee_key_parent").map(|awardee_key| ParentReference {
        awardee_key,
        name: str_field(record, "parent_name"),
    })
}

fn contacts(record: &Value) -> Vec<PointOfContact> {
    let Some(entries) = record.get("contacts").and_then(|v| v.as_array()) else {
        return Vec::new();
    };

    entries
        .iter()
        .filter(|entry| entry.is_object())
        .map(|entry| PointOfContact {
            name: str_field(entry, "name"),
            title: str_field(entry, "title"),
            email: str_field(entry, "email"),
            phone: str_field(entry, "phone"),
        })
        .collect()
}
