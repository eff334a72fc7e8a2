//! # Certificate Batch Driver
//!
//! Runs one uploaded spreadsheet through the whole pipeline:
//!
//! 1. Parse the upload into a table and normalize its headers for the template kind.
//! 2. Pick the pending rows. With none left the batch ends here and writes nothing.
//! 3. Resolve the template and create the output root.
//! 4. For each pending row: build the context, render the template into the
//!    organization folder, run the PDF cascade and mark the row as issued. A failing
//!    row is logged and stays pending.
//! 5. Write the updated table next to the certificates and log a JSON summary.
//!
//! Batches never overlap: a process-wide lock is held for the whole run, so at most one
//! office automation session exists at a time.

use crate::config::AppConfig;
use crate::error::{BatchError, RowError, TemplateError};
use crate::services::convert::{discard, validate_output, Converter};
use crate::services::data_sources::spreadsheet::columns::{normalize_columns, required_columns, CERTIFICADO};
use crate::services::data_sources::spreadsheet::filter::pending_rows;
use crate::services::data_sources::spreadsheet::read::read_table;
use crate::services::data_sources::spreadsheet::record::Record;
use crate::services::data_sources::spreadsheet::write::{updated_file_name, write_table};
use crate::services::data_sources::spreadsheet::Cell;
use crate::services::merge::context::build_context;
use crate::services::output::{OutputTree, FALLBACK_ORGANIZATION};
use crate::services::templates::{self, TemplateKind};
use common::batch::{BatchOutcome, BatchReport};
use common::model::ledger::BatchLedger;
use common::model::merge::{ConversionOutcome, RowOutcome};
use common::model::status::CertificateStatus;
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

static BATCH_LOCK: Mutex<()> = Mutex::new(());

/// The uploaded spreadsheet.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Everything a single row needs besides its record.
struct RowJob<'a> {
    template: &'a Path,
    tree: &'a OutputTree,
    converter: &'a Converter,
    min_final_bytes: u64,
}

/// Template kind as configured, before the template is located.
fn configured_kind(cfg: &AppConfig) -> Result<TemplateKind, BatchError> {
    let configured = cfg
        .template
        .path
        .clone()
        .unwrap_or_else(|| PathBuf::from(&cfg.template.file_name));
    TemplateKind::from_path(&configured).ok_or_else(|| {
        BatchError::Internal(format!(
            "unsupported template type '{}' (expected .docx or .pptx)",
            configured.display()
        ))
    })
}

/// Processes one upload end to end. See the module docs for the steps.
pub fn run_batch(
    cfg: &AppConfig,
    upload: Upload,
    converter: &Converter,
) -> Result<BatchOutcome, BatchError> {
    let _guard = BATCH_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    info!("Processing '{}' ({} bytes)", upload.file_name, upload.bytes.len());

    let mut table = read_table(&upload.file_name, upload.bytes)?;
    let kind = configured_kind(cfg)?;
    let mapping = normalize_columns(&table.headers, required_columns(kind))?;
    table.rename_columns(&mapping);
    info!("Columns: {:?}", table.headers);

    let pending = pending_rows(&table);
    if pending.is_empty() {
        info!("No pending certificates in '{}'", upload.file_name);
        return Ok(BatchOutcome::NothingPending);
    }
    info!("{} of {} rows pending", pending.len(), table.len());

    let template = templates::resolve(&cfg.template)?;
    let tree = OutputTree::new(cfg.output.output_root());
    tree.create_root()?;
    info!("Output folder: {}", tree.root().display());

    let job = RowJob {
        template: &template,
        tree: &tree,
        converter,
        min_final_bytes: cfg.conversion.min_final_bytes,
    };
    let status_col = table.column_index(CERTIFICADO);
    let mut ledger = BatchLedger::new();
    let (mut converted, mut degraded, mut skipped) = (0, 0, 0);

    for row in pending {
        let record = Record::from_table(&table, row);
        info!("Row {}: generating certificate for '{}'", row + 2, record.nombre);

        match process_row(&record, &job) {
            Ok(outcome) => {
                if let Some(col) = status_col {
                    let issued = CertificateStatus::Issued.as_cell().to_string();
                    table.set_cell(row, col, Cell::Text(issued));
                }
                let organization = match record.compania.as_str() {
                    "" => FALLBACK_ORGANIZATION,
                    name => name,
                };
                ledger.record(organization, outcome.file());
                if outcome.is_degraded() {
                    degraded += 1;
                } else {
                    converted += 1;
                }
            }
            Err(e) => {
                error!("Row {} ('{}') skipped: {}", row + 2, record.nombre, e);
                skipped += 1;
            }
        }
    }

    if ledger.is_empty() {
        warn!("No certificate was produced for '{}'", upload.file_name);
    }
    for organization in ledger.organizations() {
        info!(
            "{}: {} certificate(s)",
            organization,
            ledger.files_for(organization).len()
        );
    }

    let file_name = updated_file_name(&upload.file_name, table.source);
    let spreadsheet = write_table(&table, tree.root(), &file_name)?;
    info!("Updated spreadsheet saved to {}", spreadsheet.display());

    let report = BatchReport {
        batch_id: Uuid::new_v4().to_string(),
        converted,
        degraded,
        skipped,
        output_dir: tree.root().to_path_buf(),
        spreadsheet,
        ledger,
    };
    match serde_json::to_string(&report) {
        Ok(summary) => info!("Batch finished: {}", summary),
        Err(e) => warn!("Could not serialize batch summary: {}", e),
    }
    Ok(BatchOutcome::Completed(report))
}

/// Renders and converts one record. On success the row counts as issued, whether a PDF
/// or only the rendered document was delivered.
fn process_row(record: &Record, job: &RowJob<'_>) -> Result<RowOutcome, RowError> {
    let ctx = build_context(record)?;

    let template = record
        .variant
        .as_deref()
        .and_then(|variant| templates::variant_template(job.template, variant))
        .unwrap_or_else(|| job.template.to_path_buf());
    let kind = TemplateKind::from_path(&template).ok_or_else(|| TemplateError::UnsupportedFormat {
        path: template.clone(),
    })?;

    let paths = job.tree.certificate_paths(record, kind)?;
    templates::render(&template, &ctx, &paths.rendered)?;
    info!("Rendered {}", paths.rendered.display());

    let outcome = match job.converter.convert(&paths.rendered, &paths.pdf) {
        ConversionOutcome::Success { pdf, strategy } => match validate_output(&pdf, job.min_final_bytes) {
            Ok(_) => {
                discard(&paths.rendered);
                RowOutcome::Pdf {
                    file: paths.pdf_file_name(),
                    strategy,
                }
            }
            Err(e) => {
                warn!("PDF from {} rejected: {}", strategy, e);
                discard(&pdf);
                RowOutcome::Degraded {
                    file: paths.rendered_file_name(),
                    attempted: vec![strategy],
                }
            }
        },
        ConversionOutcome::Failure { attempted } => {
            discard(&paths.pdf);
            warn!(
                "No PDF for {} (tried {:?}); keeping the rendered document",
                paths.rendered.display(),
                attempted
            );
            RowOutcome::Degraded {
                file: paths.rendered_file_name(),
                attempted,
            }
        }
    };
    Ok(outcome)
}
