//! Loading, cleaning, describing, scaling and splitting tabular data

pub mod cleaner;
pub mod loader;
pub mod normalizer;
pub mod splitter;
pub mod stats;
pub mod table;

pub use cleaner::{Cleaner, CleaningSummary, QualityWarning};
pub use loader::{DataLoader, LoadSummary};
pub use normalizer::{ColumnScale, NormalizationParams, Normalizer};
pub use splitter::{Split, Splitter};
pub use stats::{ColumnSummary, DescriptiveStats};
pub use table::{Frame, Table};
