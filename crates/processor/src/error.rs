//! Error types for the analytic pipeline

use thiserror::Error;

/// Main processor error type
///
/// Rejected records and anomalous orderings are recovered locally and
/// expressed as absence in the data model; they never appear here. Only
/// configuration mistakes surface as hard failures.
#[derive(Error, Debug)]
pub enum ProcessorError {
    /// The stage table, SLA threshold, or group key is structurally invalid
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<delivery_kpi_config::ConfigError> for ProcessorError {
    fn from(err: delivery_kpi_config::ConfigError) -> Self {
        ProcessorError::Configuration(err.to_string())
    }
}

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, ProcessorError>;
