//! Crate-wide error type.
//!
//! Only structural problems are errors: absent columns, malformed dates,
//! unreadable files and bad configuration. Numeric degeneracies inside the
//! spread calculation are never errors; they surface as `None` values.

use polars::prelude::PolarsError;
use thiserror::Error;

use crate::data::loader::LoaderError;
use crate::data::IndexSymbol;

#[derive(Error, Debug)]
pub enum SpreadError {
    #[error("Missing required column `{column}` for {index}")]
    MissingColumn { index: IndexSymbol, column: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Loader error: {0}")]
    Loader(#[from] LoaderError),

    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Config serialize error: {0}")]
    ConfigSerialize(#[from] toml::ser::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpreadResult<T> = Result<T, SpreadError>;
