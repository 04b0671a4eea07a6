//! Implied forward rate and arbitrage spread.
//!
//! For each date:
//!
//! ```text
//! 1 + f = (F_far + E[D_far]) / (F_near + E[D_near])
//! annualized_bps = 10_000 * annualize(f, T)
//! spread = annualized_bps - OIS_bps
//! ```
//!
//! `T` is the year fraction between the near and far contract expiries.
//! Every step follows the null rules in [`crate::data::nullable`]: a missing
//! price, a zero denominator or an unresolvable contract gives `None` for
//! that date and nothing else.

use chrono::NaiveDate;
use tracing::{debug, warn};

use crate::data::nullable;
use crate::data::ExpiryCalendar;
use crate::error::{SpreadError, SpreadResult};

use super::annualize::{Annualization, DayCount};

pub const BPS_PER_UNIT: f64 = 10_000.0;

/// Aligned input columns for one index.
#[derive(Debug, Clone, Copy)]
pub struct ForwardInputs<'a> {
    pub dates: &'a [NaiveDate],
    pub near_price: &'a [Option<f64>],
    pub far_price: &'a [Option<f64>],
    pub exp_tau1: &'a [Option<f64>],
    pub exp_tau2: &'a [Option<f64>],
    pub ois_bps: &'a [Option<f64>],
    pub near_ids: &'a [Option<String>],
    pub far_ids: &'a [Option<String>],
}

impl ForwardInputs<'_> {
    fn check_aligned(&self) -> SpreadResult<()> {
        let n = self.dates.len();
        let lengths = [
            self.near_price.len(),
            self.far_price.len(),
            self.exp_tau1.len(),
            self.exp_tau2.len(),
            self.ois_bps.len(),
            self.near_ids.len(),
            self.far_ids.len(),
        ];
        if lengths.iter().any(|&len| len != n) {
            return Err(SpreadError::InvalidData(format!(
                "forward inputs misaligned: {} dates, column lengths {:?}",
                n, lengths
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct ForwardOutput {
    /// Near-to-far horizon in years.
    pub horizon_years: Vec<Option<f64>>,
    pub annualized_forward_bps: Vec<Option<f64>>,
    pub arb_spread: Vec<Option<f64>>,
    /// Rows whose contract identifiers could not be resolved to expiries.
    pub unresolved_contracts: usize,
}

/// Computes implied forward rates and spreads.
#[derive(Debug, Clone, Default)]
pub struct ForwardCalculator {
    annualization: Annualization,
    day_count: DayCount,
    calendar: ExpiryCalendar,
}

impl ForwardCalculator {
    pub fn new(annualization: Annualization, day_count: DayCount, calendar: ExpiryCalendar) -> Self {
        Self {
            annualization,
            day_count,
            calendar,
        }
    }

    pub fn annualization(&self) -> Annualization {
        self.annualization
    }

    /// Dividend-adjusted period forward rate `f`.
    pub fn implied_forward(
        near_price: Option<f64>,
        far_price: Option<f64>,
        exp_tau1: Option<f64>,
        exp_tau2: Option<f64>,
    ) -> Option<f64> {
        let ratio = nullable::div(
            nullable::add(far_price, exp_tau2),
            nullable::add(near_price, exp_tau1),
        );
        nullable::sub(ratio, Some(1.0))
    }

    /// Annualized forward rate in basis points.
    pub fn annualized_bps(&self, forward: Option<f64>, horizon_years: Option<f64>) -> Option<f64> {
        let annual = self.annualization.annualize(forward?, horizon_years?)?;
        nullable::finite(annual * BPS_PER_UNIT)
    }

    pub fn spread(annualized_bps: Option<f64>, ois_bps: Option<f64>) -> Option<f64> {
        nullable::sub(annualized_bps, ois_bps)
    }

    /// Year fraction between the expiries of the near and far contracts.
    pub fn horizon(&self, as_of: NaiveDate, near_id: &str, far_id: &str) -> Option<f64> {
        let near = self.calendar.resolve(near_id, as_of)?;
        let far = self.calendar.resolve(far_id, as_of)?;
        Some(self.day_count.year_fraction(near, far))
    }

    pub fn compute(&self, inputs: &ForwardInputs<'_>) -> SpreadResult<ForwardOutput> {
        inputs.check_aligned()?;
        let n = inputs.dates.len();

        let mut output = ForwardOutput {
            horizon_years: Vec::with_capacity(n),
            annualized_forward_bps: Vec::with_capacity(n),
            arb_spread: Vec::with_capacity(n),
            unresolved_contracts: 0,
        };

        for row in 0..n {
            let horizon = match (inputs.near_ids[row].as_deref(), inputs.far_ids[row].as_deref()) {
                (Some(near), Some(far)) => {
                    let h = self.horizon(inputs.dates[row], near, far);
                    if h.is_none() {
                        output.unresolved_contracts += 1;
                    }
                    h
                }
                _ => None,
            };

            let forward = Self::implied_forward(
                inputs.near_price[row],
                inputs.far_price[row],
                inputs.exp_tau1[row],
                inputs.exp_tau2[row],
            );
            let annualized = self.annualized_bps(forward, horizon);

            output.horizon_years.push(horizon);
            output.annualized_forward_bps.push(annualized);
            output.arb_spread.push(Self::spread(annualized, inputs.ois_bps[row]));
        }

        if output.unresolved_contracts > 0 {
            warn!(
                "{} rows have contract identifiers that do not resolve to an expiry",
                output.unresolved_contracts
            );
        }
        let valid = output.arb_spread.iter().filter(|s| s.is_some()).count();
        debug!("Computed {} of {} spreads ({:?})", valid, n, self.annualization);

        Ok(output)
    }
}
