//! Centered rolling statistics over a date index.
//!
//! A window is defined in calendar days, not rows: the window around a date
//! holds every row within `days / 2` days on either side. Null values are
//! skipped. A statistic is null when the window has too few observations or,
//! with full coverage required, when it reaches past either end of the
//! series.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::data::nullable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollingWindow {
    /// Total window length in calendar days.
    pub days: i64,
    /// Minimum non-null observations for a statistic.
    pub min_observations: usize,
    /// Null out windows that extend past the series' first or last date.
    pub require_full_coverage: bool,
}

impl RollingWindow {
    /// `None` when the window is too long to express as a duration.
    pub fn half_width(&self) -> Option<Duration> {
        Duration::try_days(self.days / 2)
    }

    /// Half-open row range `[lo, hi)` of each row's window, or `None` when
    /// coverage is required and missing.
    pub fn bounds(&self, dates: &[NaiveDate]) -> Vec<Option<(usize, usize)>> {
        let n = dates.len();
        if n == 0 {
            return Vec::new();
        }
        let (first, last) = (dates[0], dates[n - 1]);
        let half = self.half_width();

        let mut out = Vec::with_capacity(n);
        let mut lo = 0;
        let mut hi = 0;
        for &centre in dates {
            // Past the calendar range the window spans the whole series.
            let start = half.and_then(|h| centre.checked_sub_signed(h));
            let end = half.and_then(|h| centre.checked_add_signed(h));
            while start.is_some_and(|s| dates[lo] < s) {
                lo += 1;
            }
            while hi < n && end.map_or(true, |e| dates[hi] <= e) {
                hi += 1;
            }
            let covered = start.is_some_and(|s| s >= first) && end.is_some_and(|e| e <= last);
            out.push((covered || !self.require_full_coverage).then_some((lo, hi)));
        }
        out
    }

    pub fn median(&self, dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.apply(dates, values, |window| Data::new(window).median())
    }

    pub fn mean(&self, dates: &[NaiveDate], values: &[Option<f64>]) -> Vec<Option<f64>> {
        self.apply(dates, values, |window| window.iter().mean())
    }

    fn apply(
        &self,
        dates: &[NaiveDate],
        values: &[Option<f64>],
        stat: impl Fn(Vec<f64>) -> f64,
    ) -> Vec<Option<f64>> {
        self.bounds(dates)
            .into_iter()
            .map(|bounds| {
                let (lo, hi) = bounds?;
                let window: Vec<f64> = values[lo..hi].iter().flatten().copied().collect();
                if window.is_empty() || window.len() < self.min_observations {
                    return None;
                }
                nullable::finite(stat(window))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dates(n: usize) -> Vec<NaiveDate> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        (0..n).map(|i| start + Duration::days(i as i64)).collect()
    }

    fn window(days: i64, min_observations: usize, full: bool) -> RollingWindow {
        RollingWindow {
            days,
            min_observations,
            require_full_coverage: full,
        }
    }

    #[test]
    fn test_bounds_are_date_based() {
        let mut d = dates(10);
        // Gap: drop days 3 and 4.
        d.drain(3..5);
        let bounds = window(5, 1, false).bounds(&d);
        // Centre on day 5 (row 3): window days 3..=7 -> rows 3..6 (days 5, 6, 7).
        assert_eq!(bounds[3], Some((3, 6)));
        // Centre on day 0: window days -2..=2 -> rows 0..3.
        assert_eq!(bounds[0], Some((0, 3)));
    }

    #[test]
    fn test_full_coverage_nulls_edges() {
        let d = dates(10);
        let bounds = window(5, 1, true).bounds(&d);
        assert_eq!(bounds[0], None);
        assert_eq!(bounds[1], None);
        assert_eq!(bounds[2], Some((0, 5)));
        assert_eq!(bounds[7], Some((5, 10)));
        assert_eq!(bounds[8], None);
    }

    #[test]
    fn test_median_and_mean_skip_nulls() {
        let d = dates(5);
        let values = vec![Some(1.0), None, Some(9.0), Some(3.0), Some(5.0)];
        let w = window(100, 1, false);
        let median = w.median(&d, &values);
        let mean = w.mean(&d, &values);
        // Every window spans the whole series: {1, 9, 3, 5}.
        assert!((mean[2].unwrap() - 4.5).abs() < 1e-12);
        assert!(median[2].unwrap() >= 3.0 && median[2].unwrap() <= 5.0);
    }

    #[test]
    fn test_min_observations() {
        let d = dates(5);
        let values = vec![Some(1.0), None, None, None, Some(2.0)];
        let w = window(3, 2, false);
        let mean = w.mean(&d, &values);
        assert_eq!(mean[0], None);
        assert_eq!(mean[2], None);

        let all_null = vec![None; 5];
        assert!(window(100, 0, false).median(&d, &all_null).iter().all(Option::is_none));
    }

    #[test]
    fn test_oversized_window_does_not_overflow() {
        let d = dates(5);
        let values = vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0)];

        let full = window(1_000_000_000_000, 1, true);
        assert!(full.bounds(&d).iter().all(Option::is_none));

        let partial = window(1_000_000_000_000, 1, false);
        assert!(partial.bounds(&d).iter().all(|b| *b == Some((0, 5))));
        assert_eq!(partial.median(&d, &values)[0], Some(3.0));
    }

    #[test]
    fn test_odd_window_median() {
        let d = dates(3);
        let values = vec![Some(10.0), Some(-4.0), Some(2.0)];
        let median = window(3, 3, true).median(&d, &values);
        assert_eq!(median, vec![None, Some(2.0), None]);
    }
}
