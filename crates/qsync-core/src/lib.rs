//! Core logic for qsync.
//!
//! - `PortfolioTable`: curated portfolio CSV, builds the symbol → units map
//! - `QuantityMap`: trading symbol → integer units
//! - `OrderDocument`: broker order template (JSON array, key order preserved)
//! - `synchronize`: rewrites `params.quantity` of matched order entries
//! - `process_batch`: one table applied to many templates with per-file isolation

pub mod batch;
pub mod error;
pub mod order;
pub mod portfolio;
pub mod quantity;
pub mod sync;

pub use batch::{
    base_name, output_name, process_batch, process_template, BatchReport, FailedFile,
    FileResult, SyncedFile, TemplateFile, OUTPUT_PREFIX,
};
pub use error::{CoreError, Result};
pub use order::{trading_symbol, EntryShapeError, OrderDocument};
pub use portfolio::{PortfolioTable, QuantityMapBuild, TablePreview, UnitsWarning, PREVIEW_ROWS};
pub use quantity::{parse_units, QuantityMap, UnitsValue};
pub use sync::{synchronize, EntryWarning, SyncOutcome};
