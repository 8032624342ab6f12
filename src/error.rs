//! Error types for trendwatch
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur in trendwatch
#[derive(Debug, Error)]
pub enum TrendError {
    /// Invalid policy or scheduler configuration (fatal at construction, never retried)
    #[error("Invalid configuration: {0}")]
    Validation(String),

    /// No scheduler registered under the given id
    #[error("Scheduler not found: {0}")]
    NotFound(String),

    /// Lifecycle operation not valid from the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Item source call failed
    #[error("Source error: {0}")]
    Source(String),

    /// Persistence sink call failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Analysis stage failed
    #[error("Analysis error: {0}")]
    Analysis(String),

    /// A stage exceeded its execution limit
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Side-effect hook failed
    #[error("Hook error: {0}")]
    Hook(String),

    /// Observer handler failed
    #[error("Observer error: {0}")]
    Observer(String),

    /// Any other failure of a manager or scheduler operation
    #[error("Operation failed: {0}")]
    Operational(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl TrendError {
    /// True when the error names an unknown scheduler id
    pub fn is_not_found(&self) -> bool {
        matches!(self, TrendError::NotFound(_))
    }

    /// True for failures inside collector/analyzer I/O that the scheduler recovers from
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TrendError::Source(_)
                | TrendError::Persistence(_)
                | TrendError::Analysis(_)
                | TrendError::Timeout(_)
                | TrendError::Io(_)
        )
    }
}

/// Result type alias for trendwatch operations
pub type Result<T> = std::result::Result<T, TrendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let err = TrendError::Validation("weights must sum to 1.0".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: weights must sum to 1.0");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_not_found_error() {
        let err = TrendError::NotFound("s1".to_string());
        assert_eq!(err.to_string(), "Scheduler not found: s1");
        assert!(err.is_not_found());
    }

    #[test]
    fn test_operational_error_is_not_not_found() {
        let err = TrendError::Operational("start failed".to_string());
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_transient_errors() {
        assert!(TrendError::Source("quota".into()).is_transient());
        assert!(TrendError::Timeout("collect".into()).is_transient());
        assert!(!TrendError::Observer("boom".into()).is_transient());
        assert!(!TrendError::InvalidState("paused".into()).is_transient());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "feed missing");
        let err: TrendError = io_err.into();
        assert!(matches!(err, TrendError::Io(_)));
        assert!(err.to_string().contains("feed missing"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: TrendError = json_err.into();
        assert!(matches!(err, TrendError::Json(_)));
    }
}
