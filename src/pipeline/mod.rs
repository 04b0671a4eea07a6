//! End-to-end spread pipeline.
//!
//! Runs, for each configured index and in this order:
//! 1. Dividend projection (τ1, τ2, daily rate)
//! 2. Implied forward rate and arbitrage spread
//! 3. Outlier screen
//!
//! All required columns for every index are checked before any stage
//! runs. Stages then work on a copy of the table, which replaces the
//! caller's table only once every index has succeeded, so a failed run
//! leaves the table untouched.

pub mod config;
pub mod stage;

use std::collections::HashSet;

use polars::prelude::DataFrame;
use tracing::{info, warn};

use crate::data::{IndexColumns, SpreadTable};
use crate::error::{SpreadError, SpreadResult};
use crate::metrics::{IndexReport, PipelineReport, SpreadSummary};

pub use config::PipelineConfig;
pub use stage::{DividendStage, ForwardStage, OutlierStage, Stage};

pub struct SpreadPipeline {
    config: PipelineConfig,
    stages: Vec<Box<dyn Stage>>,
}

impl Default for SpreadPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl SpreadPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let stages: Vec<Box<dyn Stage>> = vec![
            Box::new(DividendStage),
            Box::new(ForwardStage::new(config.forward_calculator())),
            Box::new(OutlierStage::new(config.outlier_filter())),
        ];
        Self::with_stages(config, stages)
    }

    /// Pipeline with a custom stage list, run in the given order.
    pub fn with_stages(config: PipelineConfig, stages: Vec<Box<dyn Stage>>) -> Self {
        Self { config, stages }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn stages(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.name())
    }

    /// Verify every stage will find its inputs, for every index.
    ///
    /// Columns written by earlier stages count as available to later ones.
    pub fn check_columns(&self, table: &SpreadTable) -> SpreadResult<()> {
        let present = table.column_names();
        for &index in &self.config.indices {
            let cols = IndexColumns::for_index(index);
            let mut available: HashSet<String> = present.clone();
            for stage in &self.stages {
                if let Some(column) = stage
                    .reads(&cols)
                    .into_iter()
                    .find(|c| !available.contains(c))
                {
                    return Err(SpreadError::MissingColumn { index, column });
                }
                available.extend(stage.writes(&cols));
            }
        }
        Ok(())
    }

    pub fn run(&self, table: &mut SpreadTable) -> SpreadResult<PipelineReport> {
        self.config.validate()?;
        self.check_columns(table)?;

        let mut work = table.clone();
        let mut report = PipelineReport::default();
        for &index in &self.config.indices {
            let cols = IndexColumns::for_index(index);
            let mut index_report = IndexReport::new(index, work.height());

            for stage in &self.stages {
                info!("{}: running {} stage", index, stage.name());
                stage.run(&mut work, &cols, &mut index_report)?;
            }

            let spread = work.f64_column(&cols.arb_spread)?;
            index_report.spread = SpreadSummary::from_series(work.dates(), &spread);
            if index_report.spread.valid == 0 {
                warn!("{}: no valid arbitrage spread values", index);
            } else {
                info!(
                    "{}: {} valid spreads, {} outliers removed",
                    index, index_report.spread.valid, index_report.outliers_removed
                );
            }
            report.indices.push(index_report);
        }

        *table = work;
        Ok(report)
    }

    /// Wrap `frame`, run the pipeline and hand back the enriched frame.
    pub fn run_frame(&self, frame: DataFrame) -> SpreadResult<(DataFrame, PipelineReport)> {
        let mut table = SpreadTable::new(frame, &self.config.date_column)?;
        let report = self.run(&mut table)?;
        Ok((table.into_frame(), report))
    }
}
