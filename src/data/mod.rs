pub mod contract;
pub mod loader;
pub mod nullable;
pub mod table;
pub mod types;

pub use contract::{ContractId, ContractMonth, ExpiryCalendar};
pub use loader::{LoaderError, TableFormat, TableLoader};
pub use table::SpreadTable;
pub use types::{IndexColumns, IndexSymbol};
