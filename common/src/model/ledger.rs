use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Organization name → files produced for it, in processing order.
///
/// Only used for the end-of-batch summary; the spreadsheet is the durable record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchLedger {
    entries: BTreeMap<String, Vec<String>>,
}

impl BatchLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, organization: &str, file: impl Into<String>) {
        self.entries
            .entry(organization.to_string())
            .or_default()
            .push(file.into());
    }

    pub fn files_for(&self, organization: &str) -> &[String] {
        self.entries
            .get(organization)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn organizations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn total_files(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
