pub mod aggregate;
pub mod entity;
pub mod error;
pub mod ids;
pub mod value_type;

pub use aggregate::{
    ElementSetDetails, IndexCodeSummary, OrganizationAttributes, PersonAttributes,
};
pub use entity::{
    Element, ElementSet, ElementSetRef, ElementValue, IndexCode, IndexCodeSetRef, Organization,
    OrganizationRoleSetRef, Person, PersonRoleSetRef, Reference,
};
pub use error::ModelError;
pub use ids::{ElementId, SetId};
pub use value_type::ValueType;
