//! Model evaluation metrics

pub mod regression;

pub use regression::{EvaluationResult, Evaluator, PredictionRow, RegressionMetrics};
