pub mod data;
pub mod dividends;
pub mod error;
pub mod forward;
pub mod metrics;
pub mod outliers;
pub mod pipeline;

// Re-export commonly used types
pub use data::{ExpiryCalendar, IndexColumns, IndexSymbol, SpreadTable, TableLoader};
pub use dividends::{ContractWindow, DividendProjector, NearProjection};
pub use error::{SpreadError, SpreadResult};
pub use forward::{Annualization, DayCount, ForwardCalculator, ForwardInputs, ForwardOutput};
pub use metrics::{IndexReport, PipelineReport, SpreadSummary};
pub use outliers::{FilterOutcome, OutlierFilter, OutlierFilterConfig};
pub use pipeline::{PipelineConfig, SpreadPipeline};
