//! File-based synchronization tests.
//!
//! Drives `Application::sync_files` against temporary directories:
//! - generated `updated_*` files
//! - per-file failures that do not stop the batch
//! - repeated file names from different directories
//! - fatal portfolio table errors

use std::fs;
use std::path::{Path, PathBuf};

use qsync_app::{AppConfig, AppError, Application, SyncRequest};
use qsync_core::{CoreError, FileResult};
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio_test::assert_ok;

const PORTFOLIO: &str = "symbol , units ,weightage_pct\n\
                         NIFTYBEES,25,40\n\
                         GOLDBEES,10.0,35\n\
                         LIQUIDBEES,,25\n";

fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn template() -> String {
    serde_json::to_string(&json!([
        {
            "instrument": {"tradingsymbol": "NIFTYBEES", "exchange": "NSE"},
            "params": {"transaction_type": "BUY", "quantity": 1, "order_type": "MARKET"}
        },
        {
            "instrument": {"tradingsymbol": "GOLDBEES", "exchange": "NSE"},
            "params": {"transaction_type": "BUY", "quantity": 1}
        },
        {
            "instrument": {"tradingsymbol": "LIQUIDBEES", "exchange": "NSE"}
        },
        {
            "instrument": {"tradingsymbol": "SILVERBEES", "exchange": "NSE"},
            "params": {"transaction_type": "BUY", "quantity": 3}
        }
    ]))
    .unwrap()
}

fn app() -> Application {
    Application::new(AppConfig::default()).unwrap()
}

#[test]
fn test_sync_writes_updated_templates() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let portfolio = write(input.path(), "curated_portfolio.csv", PORTFOLIO);
    let etf = write(input.path(), "ETF.json", &template());

    let summary = assert_ok!(app().sync_files(&SyncRequest {
        portfolio,
        templates: vec![etf],
        out_dir: Some(output.path().to_path_buf()),
    }));

    assert_eq!(summary.report.symbol_count, 3);
    assert_eq!(summary.written, vec![output.path().join("updated_ETF.json")]);

    let text = fs::read_to_string(output.path().join("updated_ETF.json")).unwrap();
    assert!(text.starts_with("[\n    {\n        \"instrument\""));

    let doc: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(doc[0]["params"]["quantity"], json!(25));
    assert_eq!(doc[0]["params"]["order_type"], json!("MARKET"));
    assert_eq!(doc[1]["params"]["quantity"], json!(10));
    assert!(doc[2].get("params").is_none());
    assert_eq!(doc[3]["params"]["quantity"], json!(3));

    match &summary.report.files[0] {
        FileResult::Synced(f) => {
            assert_eq!(f.updated_count, 2);
            assert_eq!(f.entry_count, 4);
        }
        other => panic!("expected synced file, got {other:?}"),
    }
}

#[test]
fn test_bad_templates_reported_in_argument_order() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let portfolio = write(input.path(), "curated_portfolio.csv", PORTFOLIO);
    let missing = input.path().join("missing.json");
    let broken = write(input.path(), "broken.json", "[{\"instrument\": ");
    let etf = write(input.path(), "ETF 2.0.json", &template());

    let summary = app()
        .sync_files(&SyncRequest {
            portfolio,
            templates: vec![missing, broken, etf],
            out_dir: Some(output.path().to_path_buf()),
        })
        .unwrap();

    let names: Vec<&str> = summary
        .report
        .files
        .iter()
        .map(FileResult::source_name)
        .collect();
    assert_eq!(names, vec!["missing.json", "broken.json", "ETF 2.0.json"]);
    assert_eq!(summary.report.failed_count(), 2);
    assert!(output.path().join("updated_ETF 2.0.json").exists());
    assert!(!output.path().join("updated_broken.json").exists());
}

#[test]
fn test_missing_columns_writes_nothing() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let portfolio = write(input.path(), "bad.csv", "ticker,qty\nNIFTYBEES,25\n");
    let etf = write(input.path(), "ETF.json", &template());
    let out_dir = output.path().join("generated");

    let result = app().sync_files(&SyncRequest {
        portfolio,
        templates: vec![etf],
        out_dir: Some(out_dir.clone()),
    });

    match result {
        Err(AppError::Core(CoreError::MissingColumns { missing, preview })) => {
            assert_eq!(missing, vec!["symbol".to_string(), "units".to_string()]);
            assert_eq!(preview.rows.len(), 1);
        }
        other => panic!("expected MissingColumns, got {other:?}"),
    }
    assert!(!out_dir.exists());
}

#[test]
fn test_missing_portfolio_is_io_error() {
    let input = TempDir::new().unwrap();
    let etf = write(input.path(), "ETF.json", &template());

    let result = app().sync_files(&SyncRequest {
        portfolio: input.path().join("nope.csv"),
        templates: vec![etf],
        out_dir: Some(input.path().to_path_buf()),
    });

    assert!(matches!(result, Err(AppError::Io { .. })));
}

#[test]
fn test_default_output_dir_from_config() {
    let input = TempDir::new().unwrap();
    let portfolio = write(input.path(), "curated_portfolio.csv", PORTFOLIO);
    let etf = write(input.path(), "ETF.json", &template());

    let mut config = AppConfig::default();
    config.sync.output_dir = input.path().join("from-config");
    let app = Application::new(config).unwrap();

    let summary = app
        .sync_files(&SyncRequest {
            portfolio,
            templates: vec![etf],
            out_dir: None,
        })
        .unwrap();

    assert_eq!(summary.out_dir, input.path().join("from-config"));
    assert!(input.path().join("from-config/updated_ETF.json").exists());
}

#[test]
fn test_same_name_in_two_directories_writes_both() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    let portfolio = write(input.path(), "curated_portfolio.csv", PORTFOLIO);
    fs::create_dir(input.path().join("a")).unwrap();
    fs::create_dir(input.path().join("b")).unwrap();
    let first = write(&input.path().join("a"), "ETF.json", &template());
    let second = write(
        &input.path().join("b"),
        "ETF.json",
        r#"[{"instrument": {"tradingsymbol": "GOLDBEES"}, "params": {"quantity": 1}}]"#,
    );

    let summary = assert_ok!(app().sync_files(&SyncRequest {
        portfolio,
        templates: vec![first, second],
        out_dir: Some(output.path().to_path_buf()),
    }));

    assert_eq!(
        summary.written,
        vec![
            output.path().join("updated_ETF.json"),
            output.path().join("updated_ETF (2).json"),
        ]
    );
    assert_eq!(fs::read_dir(output.path()).unwrap().count(), 2);

    let first: Value =
        serde_json::from_str(&fs::read_to_string(output.path().join("updated_ETF.json")).unwrap())
            .unwrap();
    let second: Value = serde_json::from_str(
        &fs::read_to_string(output.path().join("updated_ETF (2).json")).unwrap(),
    )
    .unwrap();
    assert_eq!(first.as_array().unwrap().len(), 4);
    assert_eq!(second[0]["params"]["quantity"], json!(10));
}
