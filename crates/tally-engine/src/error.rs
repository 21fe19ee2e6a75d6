//! Custom error types for the analysis engine.
//!
//! This module provides the error hierarchy using `thiserror` for better
//! error handling and context throughout the engine.
//!
//! Errors are serializable as `{code, message}` so the CLI can emit them in
//! machine-readable output alongside the analysis report.
//!
//! Data-quality findings (malformed values, duplicate join keys) are NOT
//! errors: they become nulls and report counts. Only structural failures —
//! missing file, missing required column, engine-level failures — surface
//! through this type.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for the analysis engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// An input table is missing required columns (fatal at load time).
    #[error("table '{table}' is missing required column(s) {missing:?}; found {found:?}")]
    MissingColumns {
        table: String,
        missing: Vec<String>,
        found: Vec<String>,
    },

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Normalization of a raw table failed.
    #[error("Failed to normalize table '{table}': {reason}")]
    NormalizationFailed { table: String, reason: String },

    /// Profiling a table failed.
    #[error("Failed to profile table: {0}")]
    ProfilingFailed(String),

    /// Building the joined view failed.
    #[error("Failed to build joined view: {0}")]
    JoinFailed(String),

    /// A catalog query failed.
    #[error("Query '{query}' failed: {reason}")]
    QueryFailed { query: String, reason: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<EngineError>,
    },
}

impl EngineError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        EngineError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Get a stable error code for machine-readable output.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingColumns { .. } => "SCHEMA_MISMATCH",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::NormalizationFailed { .. } => "NORMALIZATION_FAILED",
            Self::ProfilingFailed(_) => "PROFILING_FAILED",
            Self::JoinFailed(_) => "JOIN_FAILED",
            Self::QueryFailed { .. } => "QUERY_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Check if this error is a load-time schema mismatch.
    pub fn is_schema_mismatch(&self) -> bool {
        match self {
            Self::MissingColumns { .. } => true,
            Self::WithContext { source, .. } => source.is_schema_mismatch(),
            _ => false,
        }
    }
}

/// Errors are serialized as a struct with `code` and `message` fields,
/// making them easy to consume from report output.
impl Serialize for EngineError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("EngineError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| EngineError::Polars(e).with_context(context))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let err = EngineError::MissingColumns {
            table: "products".to_string(),
            missing: vec!["product_code".to_string()],
            found: vec!["brand".to_string()],
        };
        assert_eq!(err.error_code(), "SCHEMA_MISMATCH");
        assert_eq!(
            EngineError::InvalidConfig("bad".to_string()).error_code(),
            "INVALID_CONFIG"
        );
    }

    #[test]
    fn test_is_schema_mismatch() {
        let err = EngineError::MissingColumns {
            table: "users".to_string(),
            missing: vec!["id".to_string()],
            found: vec![],
        };
        assert!(err.is_schema_mismatch());
        assert!(err.with_context("loading users").is_schema_mismatch());
        assert!(!EngineError::InvalidConfig("bad".to_string()).is_schema_mismatch());
    }

    #[test]
    fn test_error_serialization() {
        let error = EngineError::ProfilingFailed("brand column vanished".to_string());
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("PROFILING_FAILED"));
        assert!(json.contains("brand"));
    }

    #[test]
    fn test_with_context() {
        let error =
            EngineError::ProfilingFailed("test".to_string()).with_context("profiling products");
        assert!(error.to_string().contains("profiling products"));
        assert_eq!(error.error_code(), "PROFILING_FAILED"); // Preserves original code
    }
}
