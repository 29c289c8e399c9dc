//! Shared CLI infrastructure for the catalog binary.

pub mod logging;
