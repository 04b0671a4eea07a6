//! Dividend projection module.
//!
//! Provides:
//! - Contract window detection from futures identifiers
//! - Near-horizon expected dividends (τ1) and daily dividend rate
//! - Deferred-horizon increment used to build τ2

pub mod projector;

pub use projector::{ContractWindow, DividendProjector, NearProjection};
