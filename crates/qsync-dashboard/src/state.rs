//! In-memory store of recent runs.
//!
//! Generated templates are kept only so the browser can download them after
//! the sync request returns. The store is bounded; the oldest run is evicted
//! first.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

use qsync_core::BatchReport;

use crate::types::RunResponse;

struct StoredRun {
    processed_at: DateTime<Utc>,
    report: BatchReport,
}

#[derive(Default)]
struct StoreInner {
    order: VecDeque<Uuid>,
    runs: HashMap<Uuid, StoredRun>,
}

/// A generated file ready for download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFile {
    pub name: String,
    pub contents: String,
}

/// Bounded FIFO store of batch reports keyed by run id.
#[derive(Clone)]
pub struct RunStore {
    inner: Arc<RwLock<StoreInner>>,
    capacity: usize,
}

impl RunStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(StoreInner::default())),
            capacity: capacity.max(1),
        }
    }

    /// Store a report and return its API view.
    pub fn insert(&self, report: BatchReport) -> RunResponse {
        let run_id = Uuid::new_v4();
        let processed_at = Utc::now();
        let response = RunResponse::from_report(run_id, processed_at, &report);

        let mut inner = self.inner.write();
        inner.order.push_back(run_id);
        inner.runs.insert(
            run_id,
            StoredRun {
                processed_at,
                report,
            },
        );
        while inner.order.len() > self.capacity {
            if let Some(evicted) = inner.order.pop_front() {
                inner.runs.remove(&evicted);
                debug!(run_id = %evicted, "Evicted stored run");
            }
        }

        response
    }

    pub fn get(&self, run_id: &Uuid) -> Option<RunResponse> {
        let inner = self.inner.read();
        inner
            .runs
            .get(run_id)
            .map(|run| RunResponse::from_report(*run_id, run.processed_at, &run.report))
    }

    pub fn file(&self, run_id: &Uuid, output_name: &str) -> Option<DownloadFile> {
        let inner = self.inner.read();
        let synced = inner.runs.get(run_id)?.report.find_output(output_name)?;
        Some(DownloadFile {
            name: synced.output_name.clone(),
            contents: synced.contents.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qsync_core::{process_batch, PortfolioTable, TemplateFile};

    fn report() -> BatchReport {
        let table = PortfolioTable::from_csv_str("symbol,units\nA,3\n").unwrap();
        let files = vec![TemplateFile::new(
            "ETF.json",
            r#"[{"instrument":{"tradingsymbol":"A"},"params":{"quantity":1}}]"#,
        )];
        process_batch(&table, &files).unwrap()
    }

    #[test]
    fn test_insert_and_fetch_file() {
        let store = RunStore::new(4);
        let run = store.insert(report());

        assert_eq!(run.total_updated, 1);
        let file = store.file(&run.run_id, "updated_ETF.json").unwrap();
        assert!(file.contents.contains("\"quantity\": 3"));
        assert!(store.file(&run.run_id, "ETF.json").is_none());
        assert_eq!(store.get(&run.run_id).unwrap().run_id, run.run_id);
    }

    #[test]
    fn test_oldest_run_evicted() {
        let store = RunStore::new(2);
        let first = store.insert(report());
        let second = store.insert(report());
        let third = store.insert(report());

        assert_eq!(store.inner.read().runs.len(), 2);
        assert!(store.get(&first.run_id).is_none());
        assert!(store.get(&second.run_id).is_some());
        assert!(store.get(&third.run_id).is_some());
    }
}
