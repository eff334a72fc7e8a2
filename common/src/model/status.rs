use serde::{Deserialize, Serialize};

/// Issuance state of a certificate as tracked in the spreadsheet's `certificado` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CertificateStatus {
    /// The cell reads `no` (ignoring case and surrounding whitespace).
    Pending,
    /// Anything else, including empty cells.
    Issued,
}

impl CertificateStatus {
    /// Value written back to the spreadsheet for rows that were just issued.
    pub const ISSUED_CELL: &'static str = "si";
    pub const PENDING_CELL: &'static str = "no";

    pub fn from_cell(value: &str) -> Self {
        if value.trim().to_lowercase() == Self::PENDING_CELL {
            CertificateStatus::Pending
        } else {
            CertificateStatus::Issued
        }
    }

    pub fn as_cell(self) -> &'static str {
        match self {
            CertificateStatus::Pending => Self::PENDING_CELL,
            CertificateStatus::Issued => Self::ISSUED_CELL,
        }
    }

    pub fn is_pending(self) -> bool {
        self == CertificateStatus::Pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_no_is_pending() {
        assert!(CertificateStatus::from_cell("no").is_pending());
        assert!(CertificateStatus::from_cell("  NO ").is_pending());
        assert!(CertificateStatus::from_cell("No\t").is_pending());
        assert!(!CertificateStatus::from_cell("si").is_pending());
        assert!(!CertificateStatus::from_cell("").is_pending());
        assert!(!CertificateStatus::from_cell("nope").is_pending());
    }
}
