//! Tests for rde-model types.

use chrono::NaiveDate;
use rde_model::{
    ElementId, ElementSetDetails, PersonAttributes, SetId, ValueType,
};

#[test]
fn value_type_round_trips_through_str() {
    for vt in [
        ValueType::Integer,
        ValueType::Float,
        ValueType::ValueSet,
        ValueType::Date,
        ValueType::String,
    ] {
        let parsed: ValueType = vt.as_str().parse().expect("parse value type");
        assert_eq!(parsed, vt);
    }
    assert!("decimal".parse::<ValueType>().is_err());
}

#[test]
fn only_value_set_carries_options() {
    assert!(ValueType::ValueSet.has_values());
    assert!(!ValueType::Integer.has_values());
    assert!(!ValueType::String.has_values());
}

#[test]
fn formatted_identifiers() {
    assert_eq!(ElementId(307).to_string(), "RDE307");
    assert_eq!(SetId(66).to_string(), "RDES66");
}

#[test]
fn set_details_serializes() {
    let details = ElementSetDetails {
        id: SetId(12),
        name: "Pulmonary Embolism".to_string(),
        description: "CTPA findings".to_string(),
        contact_name: "Imaging Informatics".to_string(),
        parent_id: None,
        status: "Proposed".to_string(),
        status_date: NaiveDate::from_ymd_opt(2024, 3, 1).expect("valid date"),
        version: "1".to_string(),
        index_codes: vec![],
        persons: vec![PersonAttributes {
            id: 4,
            name: "A. Reader".to_string(),
            orcid: String::new(),
            url: String::new(),
            roles: vec!["author".to_string()],
        }],
        organizations: vec![],
    };
    let json = serde_json::to_string(&details).expect("serialize details");
    let round: ElementSetDetails = serde_json::from_str(&json).expect("deserialize details");
    assert_eq!(round, details);
    assert!(round.index_codes.is_empty());
}
