//! Regression model, residual diagnostics and prediction

pub mod artifact;
pub mod diagnostics;
pub mod linear;
pub mod predictor;

pub use artifact::{ModelArtifact, TermEstimate};
pub use diagnostics::{ResidualDiagnostics, TestResult};
pub use linear::{Coefficient, LinearRegression, OlsModel, INTERCEPT};
pub use predictor::{FeatureRecord, Predictor};
