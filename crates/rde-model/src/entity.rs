//! Relational row types for the catalog.
//!
//! One struct per table. The ingestion pipeline owns Element/ElementValue/
//! ElementSet/ElementSetRef rows outright; the cross-reference rows link a
//! set to standalone Person/Organization/IndexCode rows, optionally tagged
//! with a single role string per row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::ids::{ElementId, SetId};
use crate::value_type::ValueType;

/// One answerable data field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub name: String,
    pub short_name: String,
    pub definition: String,
    pub question: String,
    pub instructions: String,
    pub value_type: ValueType,
    /// Lower value bound, meaningful only for integer/float kinds.
    pub value_min: Option<f64>,
    pub value_max: Option<f64>,
    pub step_value: Option<f64>,
    pub min_cardinality: u32,
    pub max_cardinality: u32,
    pub unit: String,
    pub source: String,
    pub status: String,
    pub status_date: NaiveDate,
    pub version: String,
    pub version_date: NaiveDate,
    pub editor: String,
}

/// One selectable option of a valueSet-typed element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementValue {
    pub id: u32,
    pub element_id: ElementId,
    pub value: String,
    pub name: String,
    pub definition: String,
}

/// A named reporting module owning elements through [`ElementSetRef`] rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementSet {
    pub id: SetId,
    pub name: String,
    pub description: String,
    pub contact_name: String,
    pub parent_id: Option<SetId>,
    pub status: String,
    pub status_date: NaiveDate,
    pub version: String,
}

/// Membership link between a set and an element. Its existence is the sole
/// evidence that the element belongs to the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSetRef {
    pub id: u32,
    pub element_id: ElementId,
    pub set_id: SetId,
}

/// A person that can be cross-referenced from a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: u32,
    pub name: String,
    pub orcid: String,
    pub url: String,
}

/// An organization that can be cross-referenced from a set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: u32,
    pub name: String,
    pub abbreviation: String,
    pub url: String,
}

/// A literature reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reference {
    pub id: u32,
    pub citation: String,
    pub doi_uri: String,
    pub pubmed_id: String,
    pub url: String,
}

/// An external terminology code (RadLex, SNOMED, LOINC, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexCode {
    pub id: u32,
    pub code: String,
    pub system: String,
    pub display: String,
    pub url: String,
}

/// Links a set to one terminology code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexCodeSetRef {
    pub id: u32,
    pub code_id: u32,
    pub set_id: SetId,
}

/// Links a set to one person, contributing one role string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonRoleSetRef {
    pub id: u32,
    pub person_id: u32,
    pub set_id: SetId,
    pub role: Option<String>,
}

/// Links a set to one organization, contributing one role string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationRoleSetRef {
    pub id: u32,
    pub organization_id: u32,
    pub set_id: SetId,
    pub role: Option<String>,
}
