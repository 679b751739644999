//! Error types for analytics operations

use crate::error::AppError;

/// Result type for analytics operations
pub type AnalyticsResult<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur in analytics operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AnalyticsError {
    /// An input event cannot be placed on a case timeline
    #[error("Malformed event: {0}")]
    MalformedEvent(String),

    /// A step has no qualifying groups to work from
    #[error("Insufficient data for analysis: {0}")]
    InsufficientData(String),

    /// Thresholds or projection parameters are out of range
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// Export failed
    #[error("Export failed: {0}")]
    ExportFailed(String),
}

impl AnalyticsError {
    /// Whether the run can still produce a (partial) report
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AnalyticsError::InsufficientData(_))
    }
}

impl From<AnalyticsError> for AppError {
    fn from(err: AnalyticsError) -> Self {
        match err {
            AnalyticsError::Configuration(msg) => AppError::Configuration(msg),
            AnalyticsError::MalformedEvent(msg) => AppError::Ingest(msg),
            AnalyticsError::ExportFailed(msg) => AppError::Serialization(msg),
            other => AppError::Analytics(other),
        }
    }
}
