//! Error types for qsync-core.

use thiserror::Error;

use crate::portfolio::TablePreview;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The portfolio table lacks `symbol` and/or `units`. Fatal to the whole run.
    #[error("CSV format incorrect. Missing required column(s): {}", .missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        /// First rows of the offending table, for diagnosis.
        preview: TablePreview,
    },

    #[error("CSV read error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Order template must be a JSON array, found {0}")]
    NotAnArray(&'static str),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
