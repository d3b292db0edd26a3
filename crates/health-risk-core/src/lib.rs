pub mod classification;
pub mod config;
pub mod entity;
pub mod error;
pub mod indicators;
pub mod pipeline;
pub mod registry;
pub mod risk;
pub mod types;

#[cfg(feature = "reporting")]
pub mod reporting;

pub use error::HealthRiskError;
pub use types::*;

/// Standard result type for all health-risk operations
pub type CoreResult<T> = Result<T, HealthRiskError>;
