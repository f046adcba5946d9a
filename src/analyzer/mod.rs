// Analyzer module: one submodule per analytics stage, merged by the pipeline.

pub mod pipeline;
pub mod probability;
pub mod statistics;
pub mod trend;
pub mod volatility;
pub mod windows;

// Re-export the main Analyzer implementation for ease of use.
pub use pipeline::{Analyzer, AnalyzerImpl};
