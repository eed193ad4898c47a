//! qsync - broker order template quantity synchronizer - entry point.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use qsync_app::{AppConfig, AppError, Application, SyncRequest, SyncSummary};
use qsync_core::{CoreError, FileResult, TablePreview};
use tracing::info;

/// Copy portfolio quantities into broker order templates.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via QSYNC_CONFIG env var)
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the browser upload dashboard
    Serve {
        /// Override dashboard.host
        #[arg(long)]
        host: Option<String>,
        /// Override dashboard.port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Synchronize order templates on disk
    Sync {
        /// Curated portfolio CSV (columns: symbol, units)
        #[arg(short, long)]
        portfolio: PathBuf,
        /// Output directory (default: sync.output_dir)
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
        /// Broker JSON order templates
        #[arg(required = true)]
        templates: Vec<PathBuf>,
    },
    /// Print the effective configuration as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    qsync_telemetry::init_logging()?;

    // Determine config path: CLI arg > QSYNC_CONFIG env var > default
    let config_path = args
        .config
        .or_else(|| std::env::var("QSYNC_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    let mut config = AppConfig::load(Some(&config_path))?;
    info!(config_path = %config_path, "Configuration loaded");

    match args.command {
        Command::Serve { host, port } => {
            if let Some(host) = host {
                config.dashboard.host = host;
            }
            if let Some(port) = port {
                config.dashboard.port = port;
            }
            info!("Starting qsync v{}", env!("CARGO_PKG_VERSION"));
            Application::new(config)?.serve().await?;
        }
        Command::Sync {
            portfolio,
            out_dir,
            templates,
        } => {
            let app = Application::new(config)?;
            let request = SyncRequest {
                portfolio,
                templates,
                out_dir,
            };
            match app.sync_files(&request) {
                Ok(summary) => {
                    print_summary(&summary);
                    let failed = summary.report.failed_count();
                    if failed > 0 {
                        bail!("{failed} template(s) could not be processed");
                    }
                }
                Err(AppError::Core(CoreError::MissingColumns { missing, preview })) => {
                    eprintln!(
                        "CSV format incorrect. Columns 'symbol' and 'units' are required (missing: {}).",
                        missing.join(", ")
                    );
                    print_preview(&preview);
                    bail!("portfolio table rejected");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

fn print_summary(summary: &SyncSummary) {
    let report = &summary.report;
    println!("Found {} symbols in the portfolio CSV.", report.symbol_count);
    for warning in &report.units_warnings {
        println!("  warning: {warning}");
    }

    for file in &report.files {
        match file {
            FileResult::Synced(f) => {
                println!(
                    "{} -> {}: updated {} of {} instruments",
                    f.source_name,
                    summary.out_dir.join(&f.output_name).display(),
                    f.updated_count,
                    f.entry_count
                );
                for warning in &f.warnings {
                    println!("  warning: {warning}");
                }
            }
            FileResult::Failed(f) => println!("{}", f.error),
        }
    }
}

fn print_preview(preview: &TablePreview) {
    eprintln!("{}", preview.columns.join(","));
    for row in &preview.rows {
        eprintln!("{}", row.join(","));
    }
}
