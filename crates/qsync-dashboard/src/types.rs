//! Dashboard API types.
//!
//! These types are used for JSON serialization in the REST API.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use qsync_core::{BatchReport, EntryWarning, FileResult, TablePreview, UnitsWarning};

/// Response of `POST /api/sync` and `GET /api/runs/{run_id}`.
#[derive(Debug, Clone, Serialize)]
pub struct RunResponse {
    pub run_id: Uuid,
    pub processed_at: DateTime<Utc>,
    /// Symbols found in the portfolio table.
    pub symbol_count: usize,
    /// First rows of the source map data.
    pub map_preview: TablePreview,
    pub units_warnings: Vec<UnitsWarning>,
    /// Entries updated across every template.
    pub total_updated: usize,
    pub files: Vec<FileSummary>,
}

/// Per-template outcome.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileSummary {
    Synced {
        source_name: String,
        /// Name to request from `/api/runs/{run_id}/files/{output_name}`.
        output_name: String,
        updated_count: usize,
        entry_count: usize,
        warnings: Vec<EntryWarning>,
    },
    Failed {
        source_name: String,
        error: String,
    },
}

impl RunResponse {
    pub fn from_report(run_id: Uuid, processed_at: DateTime<Utc>, report: &BatchReport) -> Self {
        let files = report
            .files
            .iter()
            .map(|f| match f {
                FileResult::Synced(s) => FileSummary::Synced {
                    source_name: s.source_name.clone(),
                    output_name: s.output_name.clone(),
                    updated_count: s.updated_count,
                    entry_count: s.entry_count,
                    warnings: s.warnings.clone(),
                },
                FileResult::Failed(e) => FileSummary::Failed {
                    source_name: e.source_name.clone(),
                    error: e.error.clone(),
                },
            })
            .collect();

        Self {
            run_id,
            processed_at,
            symbol_count: report.symbol_count,
            map_preview: report.map_preview.clone(),
            units_warnings: report.units_warnings.clone(),
            total_updated: report.total_updated(),
            files,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_columns: Option<Vec<String>>,
    /// First rows of a rejected portfolio table.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<TablePreview>,
}

impl ErrorBody {
    pub fn message(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            missing_columns: None,
            preview: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}
