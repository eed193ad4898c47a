//! qsync application.
//!
//! Wires configuration, logging and the two front ends:
//! - `serve`: the browser upload dashboard
//! - `sync`: batch synchronization of files on disk

pub mod app;
pub mod config;
pub mod error;

pub use app::{Application, SyncRequest, SyncSummary};
pub use config::{AppConfig, SyncConfig};
pub use error::{AppError, AppResult};
