//! External identifier encoding for elements and element sets.
//!
//! Elements are addressed externally as `RDE<decimal>` and sets as
//! `RDES<decimal>`. The prefix match is case-insensitive and nothing may
//! trail the number; parse and format round-trip without loss.

use std::fmt;
use std::str::FromStr;

use crate::error::ModelError;

const ELEMENT_PREFIX: &str = "RDE";
const SET_PREFIX: &str = "RDES";

fn parse_prefixed(input: &str, prefix: &str) -> Option<u32> {
    if input.len() <= prefix.len() {
        return None;
    }
    let (head, tail) = input.split_at(prefix.len());
    if !head.eq_ignore_ascii_case(prefix) {
        return None;
    }
    // Reject signs, whitespace, and anything else u32::from_str would not.
    if !tail.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    tail.parse().ok()
}

/// Internal id of an element, rendered externally as `RDE<id>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ElementId(pub u32);

impl ElementId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ELEMENT_PREFIX}{}", self.0)
    }
}

impl FromStr for ElementId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // "RDES1" must not parse as an element id with a trailing "S1".
        parse_prefixed(s, ELEMENT_PREFIX)
            .map(Self)
            .ok_or_else(|| ModelError::InvalidElementId(s.to_string()))
    }
}

/// Internal id of an element set, rendered externally as `RDES<id>`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct SetId(pub u32);

impl SetId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SET_PREFIX}{}", self.0)
    }
}

impl FromStr for SetId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_prefixed(s, SET_PREFIX)
            .map(Self)
            .ok_or_else(|| ModelError::InvalidSetId(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_id_round_trips() {
        let id: ElementId = "RDE307".parse().expect("valid id");
        assert_eq!(id.as_u32(), 307);
        assert_eq!(id.to_string(), "RDE307");
        assert_eq!(id.to_string().parse::<ElementId>().expect("round trip"), id);
    }

    #[test]
    fn element_id_prefix_is_case_insensitive() {
        assert_eq!("rde42".parse::<ElementId>().expect("lowercase"), ElementId(42));
        assert_eq!("Rde42".parse::<ElementId>().expect("mixed case"), ElementId(42));
    }

    #[test]
    fn malformed_element_ids_rejected() {
        for input in ["RD307", "RDEabc", "RDE", "RDE 307", "RDE-1", "RDE3x", ""] {
            assert!(input.parse::<ElementId>().is_err(), "{input:?} should fail");
        }
    }

    #[test]
    fn set_id_round_trips() {
        let id: SetId = "RDES66".parse().expect("valid id");
        assert_eq!(id.to_string(), "RDES66");
    }

    #[test]
    fn set_prefix_does_not_parse_as_element() {
        assert!("RDES66".parse::<ElementId>().is_err());
        assert!("RDE66".parse::<SetId>().is_err());
    }
}
