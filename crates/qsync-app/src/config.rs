//! Application configuration.

use std::path::{Path, PathBuf};

use qsync_dashboard::DashboardConfig;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Prefix for environment overrides, e.g. `QSYNC__DASHBOARD__PORT=9000`.
pub const ENV_PREFIX: &str = "QSYNC";
const ENV_SEPARATOR: &str = "__";

/// File-based synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Directory receiving `updated_*` files when `--out-dir` is not given.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

impl AppConfig {
    /// Load configuration: defaults, then the TOML file at `path` (if it
    /// exists), then `QSYNC__SECTION__KEY` environment variables.
    pub fn load(path: Option<&str>) -> AppResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(Path::new(path)).required(false));
        }

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AppError::Config(format!("Failed to load config: {e}")))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AppResult<()> {
        if self.dashboard.max_upload_bytes == 0 {
            return Err(AppError::Config(
                "dashboard.max_upload_bytes must be greater than 0".to_string(),
            ));
        }
        if self.dashboard.max_stored_runs == 0 {
            return Err(AppError::Config(
                "dashboard.max_stored_runs must be greater than 0".to_string(),
            ));
        }
        if self.dashboard.username.is_empty() != self.dashboard.password.is_empty() {
            return Err(AppError::Config(
                "dashboard.username and dashboard.password must be set together".to_string(),
            ));
        }
        Ok(())
    }

    /// Effective configuration as TOML.
    pub fn to_toml(&self) -> AppResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(format!("Failed to render config: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.dashboard.port, 8080);
        assert_eq!(config.sync.output_dir, PathBuf::from("output"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml() {
        let config: AppConfig = toml::from_str(
            r#"
            [dashboard]
            port = 9100
            "#,
        )
        .unwrap();
        assert_eq!(config.dashboard.port, 9100);
        assert_eq!(config.dashboard.host, "127.0.0.1");
        assert_eq!(config.sync.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_half_configured_auth_rejected() {
        let mut config = AppConfig::default();
        config.dashboard.username = "ops".to_string();
        assert!(matches!(config.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AppConfig::default();
        let toml_str = config.to_toml().unwrap();
        assert!(toml_str.contains("[dashboard]"));
        assert!(toml_str.contains("output_dir"));

        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.dashboard.port, config.dashboard.port);
    }

    #[test]
    fn test_missing_file_is_optional() {
        let config = AppConfig::load(Some("does/not/exist.toml")).unwrap();
        assert_eq!(config.dashboard.host, "127.0.0.1");
    }

    #[test]
    fn test_environment_override() {
        std::env::set_var("QSYNC__DASHBOARD__MAX_STORED_RUNS", "7");
        let config = AppConfig::load(None);
        std::env::remove_var("QSYNC__DASHBOARD__MAX_STORED_RUNS");

        assert_eq!(config.unwrap().dashboard.max_stored_runs, 7);
    }
}
