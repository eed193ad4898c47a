//! One portfolio table applied to several order templates.
//!
//! A malformed table aborts the whole batch. A malformed template only fails
//! its own file.

use std::collections::HashSet;
use std::time::Instant;

use qsync_telemetry::Metrics;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::order::OrderDocument;
use crate::portfolio::{PortfolioTable, TablePreview, UnitsWarning, PREVIEW_ROWS};
use crate::quantity::QuantityMap;
use crate::sync::{synchronize, EntryWarning};

/// Prefix of every generated file name.
pub const OUTPUT_PREFIX: &str = "updated_";

/// An uploaded (or on-disk) order template.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    pub name: String,
    pub contents: Vec<u8>,
}

impl TemplateFile {
    pub fn new(name: impl Into<String>, contents: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            contents: contents.into(),
        }
    }
}

/// A template that was synchronised successfully.
#[derive(Debug, Clone, Serialize)]
pub struct SyncedFile {
    pub source_name: String,
    pub output_name: String,
    pub updated_count: usize,
    pub entry_count: usize,
    pub warnings: Vec<EntryWarning>,
    /// Re-serialised template, 4-space indent.
    #[serde(skip)]
    pub contents: String,
}

/// A template that could not be read.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub source_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileResult {
    Synced(SyncedFile),
    Failed(FailedFile),
}

impl FileResult {
    pub fn source_name(&self) -> &str {
        match self {
            Self::Synced(f) => &f.source_name,
            Self::Failed(f) => &f.source_name,
        }
    }

    pub fn as_synced(&self) -> Option<&SyncedFile> {
        match self {
            Self::Synced(f) => Some(f),
            Self::Failed(_) => None,
        }
    }
}

/// Everything produced by one batch.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Distinct symbols in the quantity map.
    pub symbol_count: usize,
    /// First rows of `symbol`/`units`/`weightage_pct`.
    pub map_preview: TablePreview,
    pub units_warnings: Vec<UnitsWarning>,
    pub files: Vec<FileResult>,
}

impl BatchReport {
    pub fn synced(&self) -> impl Iterator<Item = &SyncedFile> {
        self.files.iter().filter_map(FileResult::as_synced)
    }

    pub fn failed_count(&self) -> usize {
        self.files
            .iter()
            .filter(|f| matches!(f, FileResult::Failed(_)))
            .count()
    }

    pub fn total_updated(&self) -> usize {
        self.synced().map(|f| f.updated_count).sum()
    }

    pub fn total_warnings(&self) -> usize {
        self.synced().map(|f| f.warnings.len()).sum()
    }

    /// Generated file by output name.
    pub fn find_output(&self, output_name: &str) -> Option<&SyncedFile> {
        self.synced().find(|f| f.output_name == output_name)
    }
}

/// Final path component of an uploaded name (browsers and CLIs may pass paths).
pub fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// `updated_<file name>`.
pub fn output_name(source_name: &str) -> String {
    format!("{OUTPUT_PREFIX}{}", base_name(source_name))
}

/// Make `name` unique among `taken` by numbering repeats:
/// `updated_ETF.json`, `updated_ETF (2).json`, `updated_ETF (3).json`.
fn claim_output_name(name: String, taken: &mut HashSet<String>) -> String {
    if taken.insert(name.clone()) {
        return name;
    }

    let (stem, ext) = match name.rfind('.') {
        Some(dot) if dot > OUTPUT_PREFIX.len() => name.split_at(dot),
        _ => (name.as_str(), ""),
    };
    let mut n = 2;
    loop {
        let candidate = format!("{stem} ({n}){ext}");
        if taken.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

/// Synchronise one template against an already-built quantity map.
pub fn process_template(file: &TemplateFile, quantities: &QuantityMap) -> Result<SyncedFile> {
    let document = OrderDocument::from_slice(&file.contents)?;
    let outcome = synchronize(&document, quantities);
    let contents = outcome.document.to_pretty_string()?;
    let source_name = base_name(&file.name).to_string();

    Ok(SyncedFile {
        output_name: output_name(&source_name),
        source_name,
        updated_count: outcome.updated_count,
        entry_count: outcome.document.len(),
        warnings: outcome.warnings,
        contents,
    })
}

/// Build the quantity map from `table` and apply it to every template in order.
///
/// Returns `Err(CoreError::MissingColumns)` without touching any template when
/// the table lacks required columns.
pub fn process_batch(table: &PortfolioTable, templates: &[TemplateFile]) -> Result<BatchReport> {
    let started = Instant::now();
    let build = table.quantity_map().inspect_err(|e| {
        warn!(error = %e, "Portfolio table rejected");
        Metrics::run_rejected();
    })?;
    Metrics::units_coerced(build.warnings.len());
    info!(
        symbols = build.map.len(),
        templates = templates.len(),
        "Quantity map loaded"
    );

    let mut taken = HashSet::new();
    let files = templates
        .iter()
        .map(|file| match process_template(file, &build.map) {
            Ok(mut synced) => {
                let unique = claim_output_name(synced.output_name.clone(), &mut taken);
                if unique != synced.output_name {
                    debug!(file = %synced.source_name, output = %unique, "Output name taken, numbered");
                    synced.output_name = unique;
                }
                info!(
                    file = %synced.source_name,
                    output = %synced.output_name,
                    updated = synced.updated_count,
                    warnings = synced.warnings.len(),
                    "Template synchronized"
                );
                Metrics::template_synced(synced.updated_count, synced.warnings.len());
                FileResult::Synced(synced)
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Template failed");
                Metrics::template_failed();
                FileResult::Failed(FailedFile {
                    source_name: base_name(&file.name).to_string(),
                    error: format!("Error reading {}: {e}", base_name(&file.name)),
                })
            }
        })
        .collect();

    Metrics::run_completed(started.elapsed().as_secs_f64() * 1000.0);
    Ok(BatchReport {
        symbol_count: build.map.len(),
        map_preview: table.map_preview(PREVIEW_ROWS),
        units_warnings: build.warnings,
        files,
    })
}
