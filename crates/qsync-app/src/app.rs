//! Main application orchestration.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use qsync_core::{
    base_name, process_batch, BatchReport, FailedFile, FileResult, PortfolioTable, TemplateFile,
};
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, AppResult};

/// Files to synchronize from disk.
#[derive(Debug, Clone)]
pub struct SyncRequest {
    pub portfolio: PathBuf,
    pub templates: Vec<PathBuf>,
    /// Overrides `sync.output_dir`.
    pub out_dir: Option<PathBuf>,
}

/// Result of a file-based sync.
#[derive(Debug)]
pub struct SyncSummary {
    pub report: BatchReport,
    /// Output directory actually used.
    pub out_dir: PathBuf,
    /// Generated files, in template order.
    pub written: Vec<PathBuf>,
}

/// Main application.
pub struct Application {
    config: AppConfig,
}

impl Application {
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Run the upload dashboard until Ctrl-C.
    pub async fn serve(&self) -> AppResult<()> {
        qsync_dashboard::run_server(self.config.dashboard.clone())
            .await
            .map_err(|e| AppError::Server(e.to_string()))
    }

    /// Synchronize templates on disk and write `updated_<name>` files.
    ///
    /// A malformed portfolio table fails the whole call before anything is
    /// written. Unreadable or malformed templates are reported per file.
    pub fn sync_files(&self, request: &SyncRequest) -> AppResult<SyncSummary> {
        let table = load_table(&request.portfolio)?;
        info!(
            portfolio = %request.portfolio.display(),
            rows = table.row_count(),
            templates = request.templates.len(),
            "Portfolio loaded"
        );

        // Read failures are kept in place so the report follows argument order.
        let reads: Vec<Result<TemplateFile, FailedFile>> =
            request.templates.iter().map(|p| read_template(p)).collect();
        let readable: Vec<TemplateFile> = reads
            .iter()
            .filter_map(|r| r.as_ref().ok().cloned())
            .collect();

        let mut report = process_batch(&table, &readable)?;
        let mut processed = std::mem::take(&mut report.files).into_iter();
        report.files = reads
            .into_iter()
            .filter_map(|read| match read {
                Ok(_) => processed.next(),
                Err(failed) => Some(FileResult::Failed(failed)),
            })
            .collect();

        let out_dir = request
            .out_dir
            .clone()
            .unwrap_or_else(|| self.config.sync.output_dir.clone());
        let written = write_outputs(&report, &out_dir)?;

        Ok(SyncSummary {
            report,
            out_dir,
            written,
        })
    }
}

fn load_table(path: &Path) -> AppResult<PortfolioTable> {
    let file = File::open(path).map_err(|e| AppError::io(path, e))?;
    Ok(PortfolioTable::from_reader(BufReader::new(file))?)
}

fn read_template(path: &Path) -> Result<TemplateFile, FailedFile> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    std::fs::read(path)
        .map(|contents| TemplateFile::new(name.clone(), contents))
        .map_err(|e| {
            warn!(path = %path.display(), error = %e, "Template unreadable");
            FailedFile {
                error: format!("Error reading {}: {e}", base_name(&name)),
                source_name: name,
            }
        })
}

fn write_outputs(report: &BatchReport, out_dir: &Path) -> AppResult<Vec<PathBuf>> {
    if report.synced().next().is_none() {
        return Ok(Vec::new());
    }
    std::fs::create_dir_all(out_dir).map_err(|e| AppError::io(out_dir, e))?;

    report
        .synced()
        .map(|file| {
            let path = out_dir.join(&file.output_name);
            std::fs::write(&path, &file.contents).map_err(|e| AppError::io(&path, e))?;
            info!(path = %path.display(), updated = file.updated_count, "Wrote template");
            Ok(path)
        })
        .collect()
}
