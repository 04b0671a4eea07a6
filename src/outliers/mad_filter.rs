//! Rolling MAD outlier screen for arbitrage spread series.
//!
//! For each spread value:
//! - `median`: centered rolling median of the spread
//! - `mad`: centered rolling mean of `|spread - median|` (a MAD proxy)
//! - outlier when `|spread - median| / mad >= threshold`
//!
//! Flagged dates lose their annualized forward rate, and the spread is then
//! recomputed from `annualized - OIS` so both columns agree. A null or zero
//! MAD never flags.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::nullable;
use crate::error::{SpreadError, SpreadResult};

use super::rolling::RollingWindow;

/// Outlier filter configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutlierFilterConfig {
    /// Rolling window length in calendar days.
    pub window_days: i64,
    /// Deviation / MAD ratio at or above which a value is an outlier.
    pub threshold: f64,
    /// Minimum non-null observations per window.
    pub min_observations: usize,
    /// Leave series edges unscreened until a full window is available.
    pub require_full_coverage: bool,
}

impl Default for OutlierFilterConfig {
    fn default() -> Self {
        Self {
            window_days: 45,
            threshold: 5.0,
            min_observations: 10,
            require_full_coverage: true,
        }
    }
}

/// Longest accepted window, in calendar days (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

impl OutlierFilterConfig {
    pub fn window(&self) -> RollingWindow {
        RollingWindow {
            days: self.window_days,
            min_observations: self.min_observations,
            require_full_coverage: self.require_full_coverage,
        }
    }

    pub fn validate(&self) -> SpreadResult<()> {
        if !(1..=MAX_WINDOW_DAYS).contains(&self.window_days) {
            return Err(SpreadError::InvalidConfig(format!(
                "outlier window must be between 1 and {} days, got {}",
                MAX_WINDOW_DAYS, self.window_days
            )));
        }
        if !self.threshold.is_finite() || self.threshold <= 0.0 {
            return Err(SpreadError::InvalidConfig(format!(
                "outlier threshold must be positive, got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

/// Rolling statistics behind the screen.
#[derive(Debug, Clone, Default)]
pub struct MadStatistics {
    pub median: Vec<Option<f64>>,
    pub mad: Vec<Option<f64>>,
}

impl MadStatistics {
    /// `|value - median| / mad`, if defined.
    pub fn ratio(&self, row: usize, value: Option<f64>) -> Option<f64> {
        let deviation = nullable::map(nullable::sub(value, self.median[row]), f64::abs);
        nullable::div(deviation, self.mad[row])
    }
}

/// Result of filtering one index.
#[derive(Debug, Clone, Default)]
pub struct FilterOutcome {
    pub annualized_forward_bps: Vec<Option<f64>>,
    pub arb_spread: Vec<Option<f64>>,
    pub flagged: Vec<bool>,
}

impl FilterOutcome {
    pub fn flagged_count(&self) -> usize {
        self.flagged.iter().filter(|&&f| f).count()
    }

    pub fn flagged_dates(&self, dates: &[NaiveDate]) -> Vec<NaiveDate> {
        self.flagged
            .iter()
            .zip(dates)
            .filter_map(|(&f, &d)| f.then_some(d))
            .collect()
    }
}

pub struct OutlierFilter {
    config: OutlierFilterConfig,
}

impl Default for OutlierFilter {
    fn default() -> Self {
        Self::new(OutlierFilterConfig::default())
    }
}

impl OutlierFilter {
    pub fn new(config: OutlierFilterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &OutlierFilterConfig {
        &self.config
    }

    pub fn statistics(&self, dates: &[NaiveDate], values: &[Option<f64>]) -> MadStatistics {
        let window = self.config.window();
        let median = window.median(dates, values);
        let abs_dev: Vec<Option<f64>> = values
            .iter()
            .zip(&median)
            .map(|(&v, &m)| nullable::map(nullable::sub(v, m), f64::abs))
            .collect();
        let mad = window.mean(dates, &abs_dev);
        MadStatistics { median, mad }
    }

    /// Outlier flags for a series; nulls are never flagged.
    pub fn flag(&self, dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<bool> {
        let stats = self.statistics(dates, values);
        values
            .iter()
            .enumerate()
            .map(|(row, &v)| {
                stats
                    .ratio(row, v)
                    .is_some_and(|ratio| ratio >= self.config.threshold)
            })
            .collect()
    }

    /// Screen `spread`, null the annualized rate on flagged dates and
    /// recompute the spread from what is left.
    pub fn apply(
        &self,
        dates: &[NaiveDate],
        annualized_forward_bps: &[Option<f64>],
        ois_bps: &[Option<f64>],
        spread: &[Option<f64>],
    ) -> SpreadResult<FilterOutcome> {
        let n = dates.len();
        if annualized_forward_bps.len() != n || ois_bps.len() != n || spread.len() != n {
            return Err(SpreadError::InvalidData(format!(
                "outlier filter inputs misaligned: {} dates, {}/{}/{} values",
                n,
                annualized_forward_bps.len(),
                ois_bps.len(),
                spread.len()
            )));
        }

        let flagged = self.flag(dates, spread);
        let annualized: Vec<Option<f64>> = annualized_forward_bps
            .iter()
            .zip(&flagged)
            .map(|(&a, &f)| if f { None } else { a })
            .collect();
        let arb_spread = nullable::sub_columns(&annualized, ois_bps);

        let outcome = FilterOutcome {
            annualized_forward_bps: annualized,
            arb_spread,
            flagged,
        };
        debug!(
            "Outlier filter flagged {} of {} rows (window {}d, threshold {})",
            outcome.flagged_count(),
            n,
            self.config.window_days,
            self.config.threshold
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    /// Repeating -2, 0, 2, -1, 1 pattern: median 0, mean abs deviation 1.2.
    fn noise(n: usize) -> Vec<Option<f64>> {
        (0..n).map(|i| Some(((i * 7) % 5) as f64 - 2.0)).collect()
    }

    #[test]
    fn test_spike_is_flagged_and_neighbours_are_not() {
        let d = dates(120);
        let mut values = noise(120);
        values[60] = Some(500.0);

        let filter = OutlierFilter::default();
        let stats = filter.statistics(&d, &values);
        let ratio = stats.ratio(60, values[60]).unwrap();
        assert!(ratio >= 10.0, "ratio {ratio}");

        let flags = filter.flag(&d, &values);
        assert!(flags[60]);
        assert_eq!(flags.iter().filter(|&&f| f).count(), 1);
        assert!(!flags[59] && !flags[61]);
    }

    #[test]
    fn test_zero_mad_never_flags() {
        let d = dates(90);
        let values = vec![Some(3.0); 90];

        let filter = OutlierFilter::default();
        let stats = filter.statistics(&d, &values);
        assert_eq!(stats.mad[45], Some(0.0));
        assert_eq!(stats.ratio(45, values[45]), None);
        assert!(filter.flag(&d, &values).iter().all(|&f| !f));
    }

    #[test]
    fn test_edges_are_not_screened() {
        let d = dates(120);
        let mut values = noise(120);
        values[5] = Some(500.0);
        values[115] = Some(-500.0);

        let flags = OutlierFilter::default().flag(&d, &values);
        assert!(!flags[5]);
        assert!(!flags[115]);
    }

    #[test]
    fn test_apply_nulls_annualized_and_recomputes_spread() {
        let d = dates(120);
        let ois = vec![Some(100.0); 120];
        let mut annualized: Vec<Option<f64>> =
            noise(120).iter().map(|v| v.map(|x| x + 100.0)).collect();
        annualized[60] = Some(600.0);
        annualized[70] = None;
        let spread = nullable::sub_columns(&annualized, &ois);

        let outcome = OutlierFilter::default()
            .apply(&d, &annualized, &ois, &spread)
            .unwrap();

        assert_eq!(outcome.flagged_count(), 1);
        assert_eq!(outcome.flagged_dates(&d), vec![d[60]]);
        assert_eq!(outcome.annualized_forward_bps[60], None);
        assert_eq!(outcome.arb_spread[60], None);
        assert_eq!(outcome.arb_spread[70], None);
        assert_eq!(outcome.arb_spread[61], spread[61]);
    }

    #[test]
    fn test_unvalidated_huge_window_flags_nothing() {
        let d = dates(120);
        let mut values = noise(120);
        values[60] = Some(500.0);

        let filter = OutlierFilter::new(OutlierFilterConfig {
            window_days: 1_000_000_000_000,
            ..Default::default()
        });
        assert!(filter.flag(&d, &values).iter().all(|&f| !f));
    }

    #[test]
    fn test_apply_rejects_misaligned() {
        let d = dates(3);
        let result = OutlierFilter::default().apply(&d, &[None; 3], &[None; 2], &[None; 3]);
        assert!(matches!(result, Err(SpreadError::InvalidData(_))));
    }

    #[test]
    fn test_config_validation() {
        assert!(OutlierFilterConfig::default().validate().is_ok());
        let bad_window = OutlierFilterConfig {
            window_days: 0,
            ..Default::default()
        };
        assert!(bad_window.validate().is_err());
        let huge_window = OutlierFilterConfig {
            window_days: 1_000_000_000_000,
            ..Default::default()
        };
        assert!(matches!(
            huge_window.validate(),
            Err(SpreadError::InvalidConfig(_))
        ));
        let bad_threshold = OutlierFilterConfig {
            threshold: -1.0,
            ..Default::default()
        };
        assert!(bad_threshold.validate().is_err());
    }
}
