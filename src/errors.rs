use thiserror::Error;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("{0} statements must contain a query")]
    MissingQuery(String),

    #[error("Update statements must contain a modifier")]
    MissingModifier,

    #[error("Data extraction error: {0}")]
    DataExtraction(String),

    #[error("No result available")]
    NoResult,

    #[error("Invalid operand: {0}")]
    InvalidOperand(String),

    #[error("Collection already exists: {0}")]
    CollectionAlreadyExists(String),

    #[error("Execution error: {0}")]
    Execution(String),

    #[error("Serde JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("BSON: {0}")]
    Bson(#[from] bson::error::Error),
}
