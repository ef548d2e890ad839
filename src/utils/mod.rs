//! Utility modules.

pub mod config;

pub use config::{DataConfig, OutputConfig, PipelineConfig, SplitConfig};
