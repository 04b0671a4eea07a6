//! Pipeline configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! indices = ["SPX", "NDX"]
//! date_column = "Date"
//! day_count_basis = 360.0
//! annualization = "simple"
//! holidays = ["2026-06-19"]
//!
//! [outliers]
//! window_days = 45
//! threshold = 5.0
//! ```

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{ExpiryCalendar, IndexSymbol};
use crate::error::{SpreadError, SpreadResult};
use crate::forward::{Annualization, DayCount, ForwardCalculator};
use crate::outliers::{OutlierFilter, OutlierFilterConfig};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Indices to process, in order.
    #[serde(default = "default_indices")]
    pub indices: Vec<IndexSymbol>,

    /// Name of the date column in the joined table.
    #[serde(default = "default_date_column")]
    pub date_column: String,

    /// Day-count basis for the near-to-far horizon (360 = ACT/360).
    #[serde(default = "default_day_count_basis")]
    pub day_count_basis: f64,

    #[serde(default)]
    pub annualization: Annualization,

    /// Exchange holidays on which a contract cannot expire.
    #[serde(default)]
    pub holidays: Vec<NaiveDate>,

    #[serde(default)]
    pub outliers: OutlierFilterConfig,
}

fn default_indices() -> Vec<IndexSymbol> {
    IndexSymbol::ALL.to_vec()
}

fn default_date_column() -> String {
    "Date".to_string()
}

fn default_day_count_basis() -> f64 {
    360.0
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            indices: default_indices(),
            date_column: default_date_column(),
            day_count_basis: default_day_count_basis(),
            annualization: Annualization::default(),
            holidays: Vec::new(),
            outliers: OutlierFilterConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load from TOML file
    pub fn load(path: impl AsRef<Path>) -> SpreadResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        debug!("Loaded pipeline config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(contents: &str) -> SpreadResult<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save to TOML file
    pub fn save(&self, path: impl AsRef<Path>) -> SpreadResult<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    pub fn validate(&self) -> SpreadResult<()> {
        if self.indices.is_empty() {
            return Err(SpreadError::InvalidConfig(
                "at least one index is required".to_string(),
            ));
        }
        if self.date_column.trim().is_empty() {
            return Err(SpreadError::InvalidConfig(
                "date column name is empty".to_string(),
            ));
        }
        if !self.day_count_basis.is_finite() || self.day_count_basis <= 0.0 {
            return Err(SpreadError::InvalidConfig(format!(
                "day count basis must be positive, got {}",
                self.day_count_basis
            )));
        }
        self.outliers.validate()
    }

    pub fn calendar(&self) -> ExpiryCalendar {
        ExpiryCalendar::with_holidays(self.holidays.iter().copied())
    }

    pub fn forward_calculator(&self) -> ForwardCalculator {
        ForwardCalculator::new(
            self.annualization,
            DayCount::new(self.day_count_basis),
            self.calendar(),
        )
    }

    pub fn outlier_filter(&self) -> OutlierFilter {
        OutlierFilter::new(self.outliers.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_gives_defaults() {
        let config = PipelineConfig::from_toml_str("").unwrap();
        assert_eq!(config, PipelineConfig::default());
        assert_eq!(config.indices, IndexSymbol::ALL.to_vec());
        assert_eq!(config.outliers.window_days, 45);
        assert_eq!(config.outliers.threshold, 5.0);
    }

    #[test]
    fn test_partial_document() {
        let config = PipelineConfig::from_toml_str(
            r#"
            indices = ["SPX", "DJI"]
            annualization = "continuous"
            holidays = ["2026-06-19"]

            [outliers]
            threshold = 4.0
            "#,
        )
        .unwrap();

        assert_eq!(config.indices, vec![IndexSymbol::Spx, IndexSymbol::Dji]);
        assert_eq!(config.annualization, Annualization::Continuous);
        assert_eq!(config.outliers.threshold, 4.0);
        assert_eq!(config.outliers.window_days, 45);
        assert_eq!(config.date_column, "Date");

        let calendar = config.calendar();
        assert!(!calendar.is_trading_day(NaiveDate::from_ymd_opt(2026, 6, 19).unwrap()));
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PipelineConfig::from_toml_str("indices = []"),
            Err(SpreadError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("day_count_basis = 0.0"),
            Err(SpreadError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[outliers]\nwindow_days = 0"),
            Err(SpreadError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("[outliers]\nwindow_days = 1000000000000"),
            Err(SpreadError::InvalidConfig(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("indices = [\"FTSE\"]"),
            Err(SpreadError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!(
            "segmented_arb_config_{}.toml",
            std::process::id()
        ));
        let mut config = PipelineConfig::default();
        config.day_count_basis = 365.0;
        config.holidays = vec![NaiveDate::from_ymd_opt(2024, 3, 29).unwrap()];

        config.save(&path).unwrap();
        let loaded = PipelineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }
}
