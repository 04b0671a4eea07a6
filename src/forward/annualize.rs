//! Day counts and annualization conventions for the implied forward rate.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::data::nullable;

/// How a period rate over the near-to-far horizon becomes an annual rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Annualization {
    /// `f / T`
    #[default]
    Simple,
    /// `(1 + f)^(1/T) - 1`
    Compounded,
    /// `ln(1 + f) / T`
    Continuous,
}

impl Annualization {
    /// Annualize `period_rate` earned over `horizon_years`.
    ///
    /// Non-positive horizons and non-finite results give `None`.
    pub fn annualize(&self, period_rate: f64, horizon_years: f64) -> Option<f64> {
        if !horizon_years.is_finite() || horizon_years <= 0.0 {
            return None;
        }
        let value = match self {
            Self::Simple => period_rate / horizon_years,
            Self::Compounded => (1.0 + period_rate).powf(1.0 / horizon_years) - 1.0,
            Self::Continuous => (1.0 + period_rate).ln() / horizon_years,
        };
        nullable::finite(value)
    }
}

/// Actual-day count over a fixed basis (ACT/360 by default, matching OIS).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DayCount {
    pub basis: f64,
}

impl Default for DayCount {
    fn default() -> Self {
        Self::ACT_360
    }
}

impl DayCount {
    pub const ACT_360: DayCount = DayCount { basis: 360.0 };
    pub const ACT_365: DayCount = DayCount { basis: 365.0 };

    pub fn new(basis: f64) -> Self {
        Self { basis }
    }

    pub fn year_fraction(&self, start: NaiveDate, end: NaiveDate) -> f64 {
        (end - start).num_days() as f64 / self.basis
    }
}
