//! Error types for the auto-detection engine.
//!
//! Only input errors are meant to reach the caller of the coordinator.
//! Everything else (a method that cannot be scored, a module that fails)
//! is absorbed into the recommendation structures, so these variants mostly
//! travel inside `Result`s between components.
//!
//! Errors are serializable so that an HTTP layer can forward them as-is.

use serde::Serialize;
use serde::ser::SerializeStruct;
use thiserror::Error;

/// The main error type for profiling, detection and coordination.
#[derive(Error, Debug)]
pub enum AnalysisError {
    /// Input is not tabular or cannot be read.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Input has no columns, so nothing can be profiled.
    #[error("Dataset has no columns to analyze")]
    EmptyDataset,

    /// A method name that is not in any module's catalog.
    #[error("Unknown analysis method '{0}'")]
    UnknownMethod(String),

    /// An `analysis_type` value the coordinator does not understand.
    #[error("Unknown analysis type '{0}' (expected auto, comprehensive, descriptive, inferential or qualitative)")]
    UnknownAnalysisType(String),

    /// A whole detector failed.
    #[error("Module '{module}' failed: {reason}")]
    ModuleFailed { module: String, reason: String },

    /// An optional resource (e.g. a text lexicon) is not available.
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

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
        source: Box<AnalysisError>,
    },
}

impl AnalysisError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        AnalysisError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code for API consumers.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::EmptyDataset => "EMPTY_DATASET",
            Self::UnknownMethod(_) => "UNKNOWN_METHOD",
            Self::UnknownAnalysisType(_) => "UNKNOWN_ANALYSIS_TYPE",
            Self::ModuleFailed { .. } => "MODULE_FAILED",
            Self::ResourceUnavailable(_) => "RESOURCE_UNAVAILABLE",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether this error is the caller's fault (4xx-style) rather than an
    /// internal failure.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InvalidInput(_)
            | Self::EmptyDataset
            | Self::UnknownMethod(_)
            | Self::UnknownAnalysisType(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

impl Serialize for AnalysisError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("AnalysisError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;

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
        self.map_err(|e| AnalysisError::Polars(e).with_context(context))
    }
}
