use thiserror::Error;

#[derive(Debug, Error)]
pub enum HealthRiskError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Registry lookup failed for '{identifier}': {reason}")]
    Registry { identifier: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for HealthRiskError {
    fn from(e: serde_json::Error) -> Self {
        HealthRiskError::SerializationError(e.to_string())
    }
}
