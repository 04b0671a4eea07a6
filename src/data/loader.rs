//! Loader for the joined spot/futures/dividend/OIS dataset.
//!
//! The dataset arrives already joined: one row per date, `{IDX}_...` columns
//! for every index. Files are CSV or Parquet, picked by extension. Cleaning
//! and joining the raw vendor pulls happens upstream of this crate.

use std::fs;
use std::path::{Path, PathBuf};

use polars::prelude::*;
use thiserror::Error;
use tracing::{debug, info};

use super::table::SpreadTable;

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk table format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Parquet,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoaderError> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" | "pq" => Ok(Self::Parquet),
            _ => Err(LoaderError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// Reads and writes the joined dataset.
pub struct TableLoader {
    date_column: String,
}

impl TableLoader {
    pub fn new(date_column: &str) -> Self {
        Self {
            date_column: date_column.to_string(),
        }
    }

    pub fn date_column(&self) -> &str {
        &self.date_column
    }

    /// Load a file as a raw DataFrame.
    pub fn load_dataframe(&self, path: impl AsRef<Path>) -> Result<DataFrame, LoaderError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoaderError::FileNotFound(path.display().to_string()));
        }

        let df = match TableFormat::from_path(path)? {
            TableFormat::Csv => CsvReadOptions::default()
                .with_has_header(true)
                .with_infer_schema_length(Some(10_000))
                .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
                .finish()?,
            TableFormat::Parquet => {
                LazyFrame::scan_parquet(path, ScanArgsParquet::default())?.collect()?
            }
        };

        info!(
            "Loaded {} rows x {} columns from {}",
            df.height(),
            df.width(),
            path.display()
        );
        Ok(df)
    }

    /// Load a file and validate its date index.
    pub fn load(&self, path: impl AsRef<Path>) -> Result<SpreadTable, crate::SpreadError> {
        let df = self.load_dataframe(path)?;
        SpreadTable::new(df, &self.date_column)
    }

    /// Write a DataFrame to CSV or Parquet (chosen by extension).
    pub fn write_dataframe(
        &self,
        df: &mut DataFrame,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, LoaderError> {
        let path = path.as_ref();
        let format = TableFormat::from_path(path)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        match format {
            TableFormat::Csv => {
                CsvWriter::new(&mut file).include_header(true).finish(df)?;
            }
            TableFormat::Parquet => {
                ParquetWriter::new(file)
                    .with_compression(ParquetCompression::Zstd(Some(ZstdLevel::try_new(3)?)))
                    .finish(df)?;
            }
        }

        debug!("Wrote {} rows to {}", df.height(), path.display());
        Ok(path.to_path_buf())
    }

    pub fn write(
        &self,
        table: &SpreadTable,
        path: impl AsRef<Path>,
    ) -> Result<PathBuf, LoaderError> {
        let mut df = table.frame().clone();
        self.write_dataframe(&mut df, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("segmented_arb_{}_{}", std::process::id(), name))
    }

    fn sample_frame() -> DataFrame {
        DataFrame::new(vec![
            Series::new("Date".into(), ["2024-01-02", "2024-01-03", "2024-01-04"]).into(),
            Series::new("SPX_Div".into(), [0.0, 1.25, 0.0]).into(),
            Series::new("SPX_Contract".into(), ["ESH4", "ESH4", "ESH4"]).into(),
        ])
        .unwrap()
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a/b.csv")).unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("b.PARQUET")).unwrap(), TableFormat::Parquet);
        assert!(matches!(
            TableFormat::from_path(Path::new("b.xlsx")),
            Err(LoaderError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let loader = TableLoader::new("Date");
        let result = loader.load_dataframe("does/not/exist.csv");
        assert!(matches!(result, Err(LoaderError::FileNotFound(_))));
    }

    #[test]
    fn test_csv_write_then_load() {
        let loader = TableLoader::new("Date");
        let path = temp_path("roundtrip.csv");
        let mut df = sample_frame();
        loader.write_dataframe(&mut df, &path).unwrap();

        let table = loader.load(&path).unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(table.f64_column("SPX_Div").unwrap()[1], Some(1.25));
        assert_eq!(
            table.str_column("SPX_Contract").unwrap()[0].as_deref(),
            Some("ESH4")
        );
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_parquet_write_then_load() {
        let loader = TableLoader::new("Date");
        let path = temp_path("roundtrip.parquet");
        let mut df = sample_frame();
        loader.write_dataframe(&mut df, &path).unwrap();

        let table = loader.load(&path).unwrap();
        assert_eq!(table.height(), 3);
        assert_eq!(table.dates()[2], chrono::NaiveDate::from_ymd_opt(2024, 1, 4).unwrap());
        fs::remove_file(&path).ok();
    }
}
