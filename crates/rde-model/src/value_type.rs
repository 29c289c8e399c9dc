use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Storage type tag for an element's answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    Integer,
    Float,
    ValueSet,
    Date,
    String,
}

impl ValueType {
    /// Returns true for the types that carry a list of selectable options.
    pub fn has_values(&self) -> bool {
        matches!(self, ValueType::ValueSet)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValueType::Integer => "integer",
            ValueType::Float => "float",
            ValueType::ValueSet => "valueSet",
            ValueType::Date => "date",
            ValueType::String => "string",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ValueType {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "integer" => Ok(ValueType::Integer),
            "float" => Ok(ValueType::Float),
            "valueSet" => Ok(ValueType::ValueSet),
            "date" => Ok(ValueType::Date),
            "string" => Ok(ValueType::String),
            other => Err(ModelError::UnknownValueType(other.to_string())),
        }
    }
}
