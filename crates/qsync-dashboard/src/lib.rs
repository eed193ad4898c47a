//! qsync-dashboard - browser upload surface for qsync.
//!
//! Serves a single HTML page where a user uploads the curated portfolio CSV
//! and one or more broker order templates, then downloads the synchronized
//! templates.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  axum HTTP Server (default 127.0.0.1:8080)                   │
//! │  GET  /                               → upload page          │
//! │  POST /api/sync                       → run batch, store it  │
//! │  GET  /api/runs/{run_id}              → run report           │
//! │  GET  /api/runs/{run_id}/files/{name} → generated template   │
//! │  GET  /health, /metrics                                      │
//! └──────────────────────────┬───────────────────────────────────┘
//!                            │
//!          ┌─────────────────┴─────────────────┐
//!          ▼                                   ▼
//!  qsync_core::process_batch          RunStore (bounded, in memory)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use qsync_dashboard::{run_server, DashboardConfig};
//!
//! let config = DashboardConfig::default();
//! if let Err(e) = run_server(config).await {
//!     tracing::error!(error = %e, "Dashboard server failed");
//! }
//! ```

mod auth;
mod config;
mod error;
mod server;
mod state;
mod types;

pub use config::DashboardConfig;
pub use error::DashboardError;
pub use server::{create_router, run_server, AppState, PORTFOLIO_FIELD, TEMPLATES_FIELD};
pub use state::{DownloadFile, RunStore};
pub use types::{ErrorBody, FileSummary, HealthResponse, RunResponse};
