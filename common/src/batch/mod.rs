use crate::model::ledger::BatchLedger;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How a batch over an uploaded spreadsheet ended, when it did not abort.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchOutcome {
    /// No row had its `certificado` column set to `no`. Nothing was written.
    NothingPending,
    /// At least one pending row was attempted.
    Completed(BatchReport),
}

/// Summary of a completed batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: String,
    /// Rows whose delivered artifact is a PDF.
    pub converted: usize,
    /// Rows delivered as the rendered office document because every PDF strategy failed.
    pub degraded: usize,
    /// Pending rows that failed and were left pending.
    pub skipped: usize,
    pub output_dir: PathBuf,
    pub spreadsheet: PathBuf,
    pub ledger: BatchLedger,
}

impl BatchReport {
    /// Rows marked as issued in the updated spreadsheet.
    pub fn completed(&self) -> usize {
        self.converted + self.degraded
    }
}
