//! Error types for the regression pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for this crate
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Failures that abort a pipeline run (or a single prediction call)
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Input file does not exist
    #[error("Input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// Input file exists but cannot be read as CSV
    #[error("Unreadable input {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// No usable rows or columns
    #[error("Empty dataset: {0}")]
    EmptyDataset(String),

    /// A configured column is absent from the table schema
    #[error("Column not found: {0}")]
    MissingColumn(String),

    /// Zero-variance column, cannot be standardized
    #[error("Column '{column}' is constant (standard deviation is 0)")]
    ConstantColumn { column: String },

    /// Not enough rows for the requested operation
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Design matrix is not of full column rank
    #[error("Design matrix is rank deficient: term '{term}' is collinear with earlier terms")]
    RankDeficiency { term: String },

    /// Matrix or record width does not match the model
    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Prediction record lacks a model feature
    #[error("Missing feature in prediction record: {0}")]
    MissingFeature(String),

    /// Prediction record carries a column the model does not use
    #[error("Unknown column in prediction record: {0}")]
    UnknownColumn(String),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error
    #[error("TOML serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),
}

impl PipelineError {
    /// Create a new insufficient data error
    pub fn insufficient_data(msg: impl Into<String>) -> Self {
        Self::InsufficientData(msg.into())
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_column() {
        let err = PipelineError::ConstantColumn {
            column: "Volume".into(),
        };
        assert!(err.to_string().contains("Volume"));
    }
}
