//! Spread series summary statistics and pipeline reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use statrs::statistics::{Data, Median, Statistics};

use crate::data::nullable;
use crate::data::IndexSymbol;

/// Descriptive statistics of one spread series, in basis points.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpreadSummary {
    pub observations: usize,
    pub valid: usize,
    pub nulls: usize,
    pub mean: Option<f64>,
    pub std_dev: Option<f64>,
    pub min: Option<f64>,
    pub median: Option<f64>,
    pub max: Option<f64>,
    pub first_valid: Option<NaiveDate>,
    pub last_valid: Option<NaiveDate>,
}

impl SpreadSummary {
    pub fn from_series(dates: &[NaiveDate], values: &[Option<f64>]) -> Self {
        let valid: Vec<f64> = values.iter().flatten().copied().collect();
        let observations = values.len();

        let mut valid_dates = dates
            .iter()
            .zip(values)
            .filter(|(_, v)| v.is_some())
            .map(|(&d, _)| d);
        let first_valid = valid_dates.next();
        let last_valid = valid_dates.last().or(first_valid);

        if valid.is_empty() {
            return Self {
                observations,
                nulls: observations,
                ..Default::default()
            };
        }

        Self {
            observations,
            valid: valid.len(),
            nulls: observations - valid.len(),
            mean: nullable::finite(valid.iter().mean()),
            // Sample standard deviation; undefined for a single value.
            std_dev: nullable::finite(valid.iter().std_dev()),
            min: nullable::finite(Statistics::min(valid.iter())),
            median: nullable::finite(Data::new(valid.clone()).median()),
            max: nullable::finite(Statistics::max(valid.iter())),
            first_valid,
            last_valid,
        }
    }
}

/// Outcome of the pipeline for one index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexReport {
    pub index: IndexSymbol,
    pub rows: usize,
    pub outliers_removed: usize,
    pub unresolved_contracts: usize,
    pub spread: SpreadSummary,
}

impl IndexReport {
    pub fn new(index: IndexSymbol, rows: usize) -> Self {
        Self {
            index,
            rows,
            outliers_removed: 0,
            unresolved_contracts: 0,
            spread: SpreadSummary::default(),
        }
    }
}

/// Per-index reports from one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineReport {
    pub indices: Vec<IndexReport>,
}

impl PipelineReport {
    pub fn get(&self, index: IndexSymbol) -> Option<&IndexReport> {
        self.indices.iter().find(|r| r.index == index)
    }

    pub fn total_outliers(&self) -> usize {
        self.indices.iter().map(|r| r.outliers_removed).sum()
    }

    /// Generate a summary report.
    pub fn summary(&self) -> String {
        let fmt = |v: Option<f64>| v.map(|x| format!("{:.1}", x)).unwrap_or_else(|| "-".into());
        let mut out = String::from(
            "Arbitrage Spread Summary (bps)\n\
             ==============================\n",
        );
        for r in &self.indices {
            let s = &r.spread;
            out.push_str(&format!(
                "\n{} ({})\n\
                 \x20 Rows: {} (valid: {}, null: {})\n\
                 \x20 Outliers removed: {}\n\
                 \x20 Mean: {}  Std: {}\n\
                 \x20 Min: {}  Median: {}  Max: {}\n",
                r.index,
                r.index.description(),
                r.rows,
                s.valid,
                s.nulls,
                r.outliers_removed,
                fmt(s.mean),
                fmt(s.std_dev),
                fmt(s.min),
                fmt(s.median),
                fmt(s.max),
            ));
            if r.unresolved_contracts > 0 {
                out.push_str(&format!(
                    "  Unresolved contracts: {}\n",
                    r.unresolved_contracts
                ));
            }
        }
        out
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
