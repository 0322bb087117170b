//! Error types for the tagtune crate

use thiserror::Error;

/// Result type alias for tuning operations
pub type Result<T> = std::result::Result<T, TagTuneError>;

/// Main error type for the tuning pipeline.
///
/// Every variant is fatal: a tuning run aborts on the first error, and a
/// partially written report must not be trusted for downstream selection.
#[derive(Error, Debug)]
pub enum TagTuneError {
    /// Invalid or missing configuration: bad hyperparameter lists, an
    /// unrecognized target statistic, a fold count out of range. Raised
    /// before any training starts.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Corpus, model artifact, or report destination unreachable or
    /// unwritable. Never retried.
    #[error("Data access error: {0}")]
    DataAccessError(String),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// A winning parameter combination could not be matched back to its
    /// recorded round count. Signals a grid/selection bookkeeping bug.
    #[error("Internal consistency error: {0}")]
    InternalConsistencyError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TagTuneError::ConfigError("bad fold count".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad fold count");
    }
}
