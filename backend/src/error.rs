//! Error taxonomy for the certificate pipeline.
//!
//! Failures are split by how far they reach:
//!
//! * [`BatchError`] stops the whole upload before (or instead of) producing output.
//!   It is what the HTTP handler turns into a 400 or 500 response.
//! * [`RowError`] is scoped to one spreadsheet row. The run driver logs it, leaves the
//!   row pending and moves on.
//! * [`ConversionError`] is scoped to one conversion strategy. The converter logs it and
//!   falls through to the next strategy; exhausting them all is not an error at all but a
//!   degraded row.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("No se subió archivo Excel")]
    MissingUpload,

    #[error("Error leyendo archivo Excel: {0}")]
    UnreadableSpreadsheet(String),

    #[error("No se encontró la columna '{field}' en el Excel. Columnas disponibles: {available:?}")]
    MissingColumn {
        field: String,
        available: Vec<String>,
    },

    #[error("No se encontró la plantilla '{file_name}' en ninguna ubicación: {searched:?}")]
    TemplateNotFound {
        file_name: String,
        searched: Vec<PathBuf>,
    },

    #[error("Error guardando el Excel actualizado en {path}: {reason}")]
    SpreadsheetWrite { path: PathBuf, reason: String },

    #[error("Error de E/S: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error interno: {0}")]
    Internal(String),
}

impl BatchError {
    /// Whether the failure is caused by the uploaded data (HTTP 400) rather than by
    /// the server (HTTP 500).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BatchError::MissingUpload
                | BatchError::UnreadableSpreadsheet(_)
                | BatchError::MissingColumn { .. }
                | BatchError::TemplateNotFound { .. }
        )
    }
}

#[derive(Debug, Error)]
pub enum RowError {
    #[error("invalid date value '{value}'")]
    InvalidDate { value: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template not found or unreadable: {path}")]
    NotFound { path: PathBuf },

    #[error("unsupported template format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("template package is missing part '{0}'")]
    MissingPart(String),

    #[error("merge field '{0}' has no value in the row context")]
    UnknownField(String),

    #[error("invalid package: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("invalid XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("could not write XML: {0}")]
    XmlWrite(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("strategy unavailable: {0}")]
    Unavailable(String),

    #[error("'{program}' did not finish within {secs}s")]
    Timeout { program: String, secs: u64 },

    #[error("'{program}' exited with {status}")]
    ProcessFailed { program: String, status: String },

    #[error("output {path} missing or too small ({size} bytes, need {min})")]
    InvalidOutput { path: PathBuf, size: u64, min: u64 },

    #[error("could not read rendered document: {0}")]
    Layout(#[from] TemplateError),

    #[error("PDF generation failed: {0}")]
    Pdf(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<genpdf::error::Error> for ConversionError {
    fn from(e: genpdf::error::Error) -> Self {
        ConversionError::Pdf(e.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Build(#[from] config::ConfigError),
}
