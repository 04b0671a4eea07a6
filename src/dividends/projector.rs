//! Expected dividends over futures contract windows.
//!
//! Realized dividends are split into contract windows: contiguous runs of
//! rows that share the same near-contract identifier. Within a window the
//! expected dividend for a date is the sum of realized dividends from that
//! date (inclusive) to the window's last row. This is a perfect-foresight
//! proxy bounded by the data: the last, still open window only sees the
//! dividends already in the dataset.
//!
//! The deferred horizon adds the full dividend of the window in which the
//! row's deferred contract becomes the near contract.

use chrono::NaiveDate;
use tracing::debug;

use crate::error::{SpreadError, SpreadResult};

/// One contiguous run of rows sharing a contract identifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractWindow {
    pub contract: String,
    /// First row (inclusive).
    pub start: usize,
    /// Last row (inclusive).
    pub end: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub total_dividend: f64,
}

impl ContractWindow {
    /// Calendar days spanned, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.last_date - self.first_date).num_days() + 1
    }

    /// Average dividend per calendar day over the window.
    pub fn daily_rate(&self) -> f64 {
        self.total_dividend / self.len_days() as f64
    }

    pub fn contains(&self, row: usize) -> bool {
        (self.start..=self.end).contains(&row)
    }
}

/// Output of the near-contract projection.
#[derive(Debug, Clone, Default)]
pub struct NearProjection {
    /// Dividend expected from each date to the end of its window.
    pub exp_tau1: Vec<Option<f64>>,
    /// Window total divided by window length in days.
    pub daily_div: Vec<Option<f64>>,
    pub windows: Vec<ContractWindow>,
}

/// Projects realized dividends onto futures contract windows.
pub struct DividendProjector;

impl DividendProjector {
    /// Split rows into contiguous windows of identical identifier.
    ///
    /// Rows with no identifier belong to no window. Missing dividends count
    /// as zero (no payment that day).
    pub fn contract_windows(
        dates: &[NaiveDate],
        dividends: &[Option<f64>],
        ids: &[Option<String>],
    ) -> SpreadResult<Vec<ContractWindow>> {
        check_aligned(dates.len(), dividends.len(), ids.len())?;

        let mut windows: Vec<ContractWindow> = Vec::new();
        let mut previous: Option<&str> = None;

        for (row, id) in ids.iter().enumerate() {
            let dividend = dividends[row].unwrap_or(0.0);
            match id.as_deref() {
                Some(id) if previous == Some(id) => {
                    if let Some(window) = windows.last_mut() {
                        window.end = row;
                        window.last_date = dates[row];
                        window.total_dividend += dividend;
                    }
                }
                Some(id) => windows.push(ContractWindow {
                    contract: id.to_string(),
                    start: row,
                    end: row,
                    first_date: dates[row],
                    last_date: dates[row],
                    total_dividend: dividend,
                }),
                None => {}
            }
            previous = id.as_deref();
        }

        debug!("Built {} contract windows over {} rows", windows.len(), ids.len());
        Ok(windows)
    }

    /// Near-contract projection: τ1 and the per-day dividend rate.
    pub fn project(
        dates: &[NaiveDate],
        dividends: &[Option<f64>],
        near_ids: &[Option<String>],
    ) -> SpreadResult<NearProjection> {
        let windows = Self::contract_windows(dates, dividends, near_ids)?;
        let mut exp_tau1 = vec![None; dates.len()];
        let mut daily_div = vec![None; dates.len()];

        for window in &windows {
            let rate = window.daily_rate();
            let mut remaining = 0.0;
            for row in (window.start..=window.end).rev() {
                remaining += dividends[row].unwrap_or(0.0);
                exp_tau1[row] = Some(remaining);
                daily_div[row] = Some(rate);
            }
        }

        Ok(NearProjection {
            exp_tau1,
            daily_div,
            windows,
        })
    }

    /// Deferred-contract increment of τ2.
    ///
    /// For each row, the total dividend of the first window at or after the
    /// row's own window whose near identifier equals the row's deferred
    /// identifier. A deferred window that starts past the end of the data
    /// contributes zero; a partially observed one contributes what is there.
    pub fn project_deferred(
        dates: &[NaiveDate],
        dividends: &[Option<f64>],
        near_ids: &[Option<String>],
        far_ids: &[Option<String>],
    ) -> SpreadResult<Vec<Option<f64>>> {
        check_aligned(dates.len(), far_ids.len(), near_ids.len())?;
        let windows = Self::contract_windows(dates, dividends, near_ids)?;

        let mut increments = Vec::with_capacity(dates.len());
        // Index of the first window that does not end before the current row.
        let mut cursor = 0;
        let mut beyond_data = 0usize;

        for (row, far) in far_ids.iter().enumerate() {
            while cursor < windows.len() && windows[cursor].end < row {
                cursor += 1;
            }
            let Some(far) = far.as_deref() else {
                increments.push(None);
                continue;
            };

            let search_from = match windows.get(cursor) {
                Some(w) if w.contains(row) => cursor + 1,
                _ => cursor,
            };
            let increment = windows[search_from.min(windows.len())..]
                .iter()
                .find(|w| w.contract == far)
                .map(|w| w.total_dividend);

            if increment.is_none() {
                beyond_data += 1;
            }
            increments.push(Some(increment.unwrap_or(0.0)));
        }

        if beyond_data > 0 {
            debug!(
                "{} rows have a deferred contract window beyond the data; using zero",
                beyond_data
            );
        }
        Ok(increments)
    }
}

fn check_aligned(dates: usize, a: usize, b: usize) -> SpreadResult<()> {
    if dates != a || dates != b {
        return Err(SpreadError::InvalidData(format!(
            "misaligned series: {} dates, {} and {} values",
            dates, a, b
        )));
    }
    Ok(())
}
