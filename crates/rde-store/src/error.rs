use thiserror::Error;

/// Store-level outcome categories.
///
/// Every caller sees exactly one of these per call: a validation failure
/// reported before any persistence, a not-found after a positive existence
/// check, or an unexpected storage fault. Parse errors from the document
/// stage are folded into `Validation` rather than propagated raw.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failure: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl From<rde_ingest::ParseError> for StoreError {
    fn from(err: rde_ingest::ParseError) -> Self {
        StoreError::Validation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
