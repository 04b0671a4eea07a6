//! Spread summary module.
//!
//! Provides:
//! - Descriptive statistics of each final spread series
//! - Per-index and per-run reports (text and JSON)

pub mod summary;

pub use summary::{IndexReport, PipelineReport, SpreadSummary};
