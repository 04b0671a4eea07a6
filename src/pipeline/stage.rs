//! Pipeline stages.
//!
//! Each stage declares the columns it reads and writes for an index so the
//! pipeline can check the whole plan before touching the table.

use tracing::{debug, info};

use crate::data::nullable;
use crate::data::{IndexColumns, SpreadTable};
use crate::dividends::DividendProjector;
use crate::error::SpreadResult;
use crate::forward::{ForwardCalculator, ForwardInputs};
use crate::metrics::IndexReport;
use crate::outliers::OutlierFilter;

pub trait Stage {
    fn name(&self) -> &str;

    /// Columns that must exist before the stage runs.
    fn reads(&self, cols: &IndexColumns) -> Vec<String>;

    /// Columns the stage inserts or replaces.
    fn writes(&self, cols: &IndexColumns) -> Vec<String>;

    fn run(
        &self,
        table: &mut SpreadTable,
        cols: &IndexColumns,
        report: &mut IndexReport,
    ) -> SpreadResult<()>;
}

/// Expected dividends: τ1, τ2 and the daily dividend rate.
pub struct DividendStage;

impl Stage for DividendStage {
    fn name(&self) -> &str {
        "dividends"
    }

    fn reads(&self, cols: &IndexColumns) -> Vec<String> {
        vec![
            cols.dividend.clone(),
            cols.contract.clone(),
            cols.deferred_contract.clone(),
        ]
    }

    fn writes(&self, cols: &IndexColumns) -> Vec<String> {
        vec![
            cols.exp_tau1.clone(),
            cols.exp_tau2.clone(),
            cols.daily_div.clone(),
        ]
    }

    fn run(
        &self,
        table: &mut SpreadTable,
        cols: &IndexColumns,
        _report: &mut IndexReport,
    ) -> SpreadResult<()> {
        let dividends = table.f64_column(&cols.dividend)?;
        let near_ids = table.str_column(&cols.contract)?;
        let far_ids = table.str_column(&cols.deferred_contract)?;
        let dates = table.dates();

        let near = DividendProjector::project(dates, &dividends, &near_ids)?;
        let increment = DividendProjector::project_deferred(dates, &dividends, &near_ids, &far_ids)?;
        let exp_tau2 = nullable::add_columns(&near.exp_tau1, &increment);

        debug!(
            "{}: {} contract windows",
            cols.index,
            near.windows.len()
        );

        table.set_f64_column(&cols.exp_tau1, near.exp_tau1)?;
        table.set_f64_column(&cols.exp_tau2, exp_tau2)?;
        table.set_f64_column(&cols.daily_div, near.daily_div)?;
        Ok(())
    }
}

/// Implied forward rate and arbitrage spread.
pub struct ForwardStage {
    calculator: ForwardCalculator,
}

impl ForwardStage {
    pub fn new(calculator: ForwardCalculator) -> Self {
        Self { calculator }
    }
}

impl Stage for ForwardStage {
    fn name(&self) -> &str {
        "forward"
    }

    fn reads(&self, cols: &IndexColumns) -> Vec<String> {
        vec![
            cols.near_price.clone(),
            cols.far_price.clone(),
            cols.exp_tau1.clone(),
            cols.exp_tau2.clone(),
            cols.ois_bps.clone(),
            cols.contract.clone(),
            cols.deferred_contract.clone(),
        ]
    }

    fn writes(&self, cols: &IndexColumns) -> Vec<String> {
        vec![cols.annualized_forward_bps.clone(), cols.arb_spread.clone()]
    }

    fn run(
        &self,
        table: &mut SpreadTable,
        cols: &IndexColumns,
        report: &mut IndexReport,
    ) -> SpreadResult<()> {
        let near_price = table.f64_column(&cols.near_price)?;
        let far_price = table.f64_column(&cols.far_price)?;
        let exp_tau1 = table.f64_column(&cols.exp_tau1)?;
        let exp_tau2 = table.f64_column(&cols.exp_tau2)?;
        let ois_bps = table.f64_column(&cols.ois_bps)?;
        let near_ids = table.str_column(&cols.contract)?;
        let far_ids = table.str_column(&cols.deferred_contract)?;

        let output = self.calculator.compute(&ForwardInputs {
            dates: table.dates(),
            near_price: &near_price,
            far_price: &far_price,
            exp_tau1: &exp_tau1,
            exp_tau2: &exp_tau2,
            ois_bps: &ois_bps,
            near_ids: &near_ids,
            far_ids: &far_ids,
        })?;

        report.unresolved_contracts = output.unresolved_contracts;
        table.set_f64_column(&cols.annualized_forward_bps, output.annualized_forward_bps)?;
        table.set_f64_column(&cols.arb_spread, output.arb_spread)?;
        Ok(())
    }
}

/// Rolling MAD screen over the spread; always the last stage.
pub struct OutlierStage {
    filter: OutlierFilter,
}

impl OutlierStage {
    pub fn new(filter: OutlierFilter) -> Self {
        Self { filter }
    }
}

impl Stage for OutlierStage {
    fn name(&self) -> &str {
        "outliers"
    }

    fn reads(&self, cols: &IndexColumns) -> Vec<String> {
        vec![
            cols.annualized_forward_bps.clone(),
            cols.ois_bps.clone(),
            cols.arb_spread.clone(),
        ]
    }

    fn writes(&self, cols: &IndexColumns) -> Vec<String> {
        vec![cols.annualized_forward_bps.clone(), cols.arb_spread.clone()]
    }

    fn run(
        &self,
        table: &mut SpreadTable,
        cols: &IndexColumns,
        report: &mut IndexReport,
    ) -> SpreadResult<()> {
        let annualized = table.f64_column(&cols.annualized_forward_bps)?;
        let ois_bps = table.f64_column(&cols.ois_bps)?;
        let spread = table.f64_column(&cols.arb_spread)?;

        let outcome = self
            .filter
            .apply(table.dates(), &annualized, &ois_bps, &spread)?;

        report.outliers_removed = outcome.flagged_count();
        if report.outliers_removed > 0 {
            info!(
                "{}: removed {} outliers",
                cols.index, report.outliers_removed
            );
            debug!(
                "{}: outlier dates {:?}",
                cols.index,
                outcome.flagged_dates(table.dates())
            );
        }

        table.set_f64_column(&cols.annualized_forward_bps, outcome.annualized_forward_bps)?;
        table.set_f64_column(&cols.arb_spread, outcome.arb_spread)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use polars::prelude::*;

    use super::*;
    use crate::data::IndexSymbol;

    fn table() -> SpreadTable {
        let df = DataFrame::new(vec![
            Series::new("Date".into(), ["2024-01-02", "2024-01-03", "2024-01-04"]).into(),
            Series::new("SPX_Div".into(), [Some(1.0), None, Some(2.0)]).into(),
            Series::new("SPX_Contract".into(), ["ESH4", "ESH4", "ESM4"]).into(),
            Series::new("SPX_Contract2".into(), ["ESM4", "ESM4", "ESU4"]).into(),
            Series::new("SPX_OIS_bps".into(), [500.0, 500.0, 500.0]).into(),
            Series::new("SPX_Fut_Near".into(), [4800.0, 4810.0, 4900.0]).into(),
            Series::new("SPX_Fut_Far".into(), [4860.0, 4870.0, 4960.0]).into(),
        ])
        .unwrap();
        SpreadTable::new(df, "Date").unwrap()
    }

    #[test]
    fn test_dividend_stage_writes_taus() {
        let cols = IndexColumns::for_index(IndexSymbol::Spx);
        let mut table = table();
        let mut report = IndexReport::new(IndexSymbol::Spx, table.height());

        DividendStage.run(&mut table, &cols, &mut report).unwrap();

        assert_eq!(
            table.f64_column(&cols.exp_tau1).unwrap(),
            vec![Some(1.0), Some(0.0), Some(2.0)]
        );
        // ESM4 window (row 2) holds 2.0; ESU4 never becomes the near contract.
        assert_eq!(
            table.f64_column(&cols.exp_tau2).unwrap(),
            vec![Some(3.0), Some(2.0), Some(2.0)]
        );
        assert_eq!(table.f64_column(&cols.daily_div).unwrap()[0], Some(0.5));
    }

    #[test]
    fn test_forward_stage_after_dividends() {
        let cols = IndexColumns::for_index(IndexSymbol::Spx);
        let mut table = table();
        let mut report = IndexReport::new(IndexSymbol::Spx, table.height());

        DividendStage.run(&mut table, &cols, &mut report).unwrap();
        ForwardStage::new(ForwardCalculator::default())
            .run(&mut table, &cols, &mut report)
            .unwrap();

        let annualized = table.f64_column(&cols.annualized_forward_bps).unwrap();
        let spread = table.f64_column(&cols.arb_spread).unwrap();
        // Row 0: (4860 + 3) / (4800 + 1) - 1 over 98/360 years.
        let f = 4863.0 / 4801.0 - 1.0;
        let expected = f / (98.0 / 360.0) * 10_000.0;
        assert!((annualized[0].unwrap() - expected).abs() < 1e-9);
        assert!((spread[0].unwrap() - (expected - 500.0)).abs() < 1e-9);
        assert_eq!(report.unresolved_contracts, 0);
    }

    #[test]
    fn test_declared_columns() {
        let cols = IndexColumns::for_index(IndexSymbol::Ndx);
        let outliers = OutlierStage::new(OutlierFilter::default());
        assert_eq!(outliers.name(), "outliers");
        assert!(outliers.reads(&cols).contains(&"NDX_arb_spread".to_string()));
        assert_eq!(
            DividendStage.writes(&cols),
            vec!["NDX_exp_tau1", "NDX_exp_tau2", "NDX_daily_div"]
        );
    }
}
