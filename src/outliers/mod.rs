//! Outlier screening for arbitrage spread series.
//!
//! Provides:
//! - Date-indexed centered rolling median and mean
//! - MAD-based outlier flags with null-safe ratios
//! - Nulling of the annualized forward rate and spread recomputation

pub mod mad_filter;
pub mod rolling;

pub use mad_filter::{FilterOutcome, MadStatistics, OutlierFilter, OutlierFilterConfig};
pub use rolling::RollingWindow;
