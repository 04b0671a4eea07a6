//! The in-memory spread table.
//!
//! Wraps the joined `DataFrame` together with its parsed date index. Stages
//! pull columns out as `Vec<Option<f64>>` / `Vec<Option<String>>`, compute,
//! and write whole columns back. Nulls and NaNs both come out as `None`.

use std::collections::HashSet;

use chrono::NaiveDate;
use polars::prelude::*;

use crate::error::{SpreadError, SpreadResult};

/// Joined dataset indexed by unique, strictly increasing dates.
#[derive(Debug, Clone)]
pub struct SpreadTable {
    frame: DataFrame,
    date_column: String,
    dates: Vec<NaiveDate>,
}

impl SpreadTable {
    /// Wrap a DataFrame, parsing and validating its date column.
    pub fn new(frame: DataFrame, date_column: &str) -> SpreadResult<Self> {
        if frame.height() == 0 {
            return Err(SpreadError::InvalidData("table has no rows".to_string()));
        }
        let column = frame
            .column(date_column)
            .map_err(|_| SpreadError::ColumnNotFound(date_column.to_string()))?;
        let dates = parse_dates(column)?;

        if let Some(w) = dates.windows(2).find(|w| w[1] <= w[0]) {
            return Err(SpreadError::InvalidData(format!(
                "dates must be unique and increasing: {} followed by {}",
                w[0], w[1]
            )));
        }

        Ok(Self {
            frame,
            date_column: date_column.to_string(),
            dates,
        })
    }

    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn into_frame(self) -> DataFrame {
        self.frame
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn height(&self) -> usize {
        self.dates.len()
    }

    pub fn column_names(&self) -> HashSet<String> {
        self.frame
            .get_column_names()
            .into_iter()
            .map(|name| name.to_string())
            .collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.frame.get_column_names().iter().any(|c| c.as_str() == name)
    }

    fn column(&self, name: &str) -> SpreadResult<&Column> {
        if !self.has_column(name) {
            return Err(SpreadError::ColumnNotFound(name.to_string()));
        }
        Ok(self.frame.column(name)?)
    }

    /// Numeric column as nullable floats (integers are widened).
    pub fn f64_column(&self, name: &str) -> SpreadResult<Vec<Option<f64>>> {
        let casted = self.column(name)?.cast(&DataType::Float64)?;
        let values = casted
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| x.is_finite()))
            .collect();
        Ok(values)
    }

    /// Text column as nullable trimmed strings; blanks become `None`.
    pub fn str_column(&self, name: &str) -> SpreadResult<Vec<Option<String>>> {
        let casted = self.column(name)?.cast(&DataType::String)?;
        let values = casted
            .str()?
            .into_iter()
            .map(|v| {
                v.map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();
        Ok(values)
    }

    /// Insert or replace a float column.
    pub fn set_f64_column(&mut self, name: &str, values: Vec<Option<f64>>) -> SpreadResult<()> {
        if values.len() != self.height() {
            return Err(SpreadError::InvalidData(format!(
                "column {} has {} values, table has {} rows",
                name,
                values.len(),
                self.height()
            )));
        }
        self.frame.with_column(Series::new(name.into(), values))?;
        Ok(())
    }
}

/// Convert days since Unix epoch to NaiveDate.
fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + 719163)
}

/// Parse a date column stored either as `YYYY-MM-DD` strings or as a
/// date/datetime dtype.
fn parse_dates(column: &Column) -> SpreadResult<Vec<NaiveDate>> {
    let name = column.name().to_string();
    let null_date = |row: usize| {
        SpreadError::InvalidData(format!("null or unparseable date in {} at row {}", name, row))
    };

    if let Ok(str_col) = column.str() {
        return str_col
            .into_iter()
            .enumerate()
            .map(|(row, s)| {
                s.and_then(|s| NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok())
                    .ok_or_else(|| null_date(row))
            })
            .collect();
    }

    let days = column
        .cast(&DataType::Date)
        .and_then(|c| c.cast(&DataType::Int32))
        .map_err(|_| {
            SpreadError::InvalidData(format!("{} column has unexpected type {}", name, column.dtype()))
        })?;

    days.i32()?
        .into_iter()
        .enumerate()
        .map(|(row, d)| d.and_then(date_from_days).ok_or_else(|| null_date(row)))
        .collect()
}
