//! Run report and artifact writing

pub mod summary;
pub mod writer;

pub use summary::{FitStatistics, Report, SplitSummary};
pub use writer::{ReportWriter, WrittenArtifacts};
