//! Forward-rate and arbitrage spread module.
//!
//! Provides:
//! - Dividend-adjusted implied forward rate between two futures expiries
//! - Parameterized annualization (simple, compounded, continuous)
//! - Arbitrage spread against the OIS 3-month rate, in basis points

pub mod annualize;
pub mod calculator;

pub use annualize::{Annualization, DayCount};
pub use calculator::{ForwardCalculator, ForwardInputs, ForwardOutput, BPS_PER_UNIT};
