//! # Closing Price Regression
//!
//! A reproducible batch pipeline that fits an ordinary least squares
//! model to tabular market data and predicts a closing price (or any
//! other numeric target) from the remaining columns.
//!
//! ## Modules
//!
//! - `data` - CSV loading, cleaning, descriptive statistics, normalization and splitting
//! - `models` - OLS fitting, residual diagnostics, persisted models and prediction
//! - `metrics` - Test-set evaluation metrics
//! - `report` - Text report and artifact writing
//! - `pipeline` - End-to-end orchestration
//! - `utils` - Configuration

pub mod data;
pub mod error;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod report;
pub mod utils;

pub use data::{Cleaner, DataLoader, DescriptiveStats, Frame, NormalizationParams, Normalizer, Splitter, Table};
pub use error::{PipelineError, Result};
pub use metrics::{EvaluationResult, Evaluator, RegressionMetrics};
pub use models::{FeatureRecord, LinearRegression, ModelArtifact, OlsModel, Predictor};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use report::{Report, ReportWriter};
pub use utils::PipelineConfig;
