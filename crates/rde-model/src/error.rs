use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("invalid element identifier: {0}")]
    InvalidElementId(String),
    #[error("invalid element set identifier: {0}")]
    InvalidSetId(String),
    #[error("unknown value type: {0}")]
    UnknownValueType(String),
}
