use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of running the conversion cascade over one rendered document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversionOutcome {
    /// A strategy produced a PDF that passed validation.
    Success { pdf: PathBuf, strategy: String },
    /// Every strategy was tried and none produced a valid PDF.
    Failure { attempted: Vec<String> },
}

/// Final state of a single spreadsheet row that made it through rendering.
///
/// Rows that fail before or during rendering never produce a `RowOutcome`; they stay
/// pending in the spreadsheet and are only visible in the log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowOutcome {
    /// The delivered artifact is a PDF.
    Pdf { file: String, strategy: String },
    /// PDF conversion failed; the rendered office document is delivered instead.
    Degraded { file: String, attempted: Vec<String> },
}

impl RowOutcome {
    pub fn file(&self) -> &str {
        match self {
            RowOutcome::Pdf { file, .. } | RowOutcome::Degraded { file, .. } => file,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, RowOutcome::Degraded { .. })
    }
}
