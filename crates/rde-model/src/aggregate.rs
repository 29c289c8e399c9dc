//! Hierarchical read-side result types.
//!
//! These are what the aggregation fold produces from denormalized join rows:
//! one entry per set, with related codes, persons, and organizations
//! deduplicated and role lists accumulated across rows. All lists are empty,
//! never absent, when a set has no cross-references.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::SetId;

/// One aggregated element set with its cross-referenced entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSetDetails {
    pub id: SetId,
    pub name: String,
    pub description: String,
    pub contact_name: String,
    pub parent_id: Option<SetId>,
    pub status: String,
    pub status_date: NaiveDate,
    pub version: String,
    pub index_codes: Vec<IndexCodeSummary>,
    pub persons: Vec<PersonAttributes>,
    pub organizations: Vec<OrganizationAttributes>,
}

/// A terminology code attached to a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCodeSummary {
    pub id: u32,
    pub code: String,
    pub system: String,
    pub display: String,
    pub url: String,
}

/// A person attached to a set, with every distinct role found across the
/// join rows for that person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonAttributes {
    pub id: u32,
    pub name: String,
    pub orcid: String,
    pub url: String,
    pub roles: Vec<String>,
}

/// An organization attached to a set, role-annotated like persons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizationAttributes {
    pub id: u32,
    pub name: String,
    pub abbreviation: String,
    pub url: String,
    pub roles: Vec<String>,
}
