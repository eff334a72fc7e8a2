use super::{Cell, SourceFormat, Table};
use crate::error::BatchError;
use chrono::{Datelike, Timelike};
use rust_xlsxwriter::{ExcelDateTime, Format, Workbook, XlsxError};
use std::path::{Path, PathBuf};

const FALLBACK_NAME: &str = "certificados_actualizado.xlsx";

/// File name for the updated spreadsheet: the uploaded name when usable, with workbook
/// formats other than XLSX switched to `.xlsx` since that is what gets written.
pub fn updated_file_name(upload_name: &str, source: SourceFormat) -> String {
    let Some(name) = Path::new(upload_name)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.trim().is_empty() && !n.starts_with('.'))
    else {
        return FALLBACK_NAME.to_string();
    };

    let path = Path::new(name);
    match source {
        SourceFormat::Csv { .. } => name.to_string(),
        SourceFormat::Workbook => {
            let is_xlsx = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));
            if is_xlsx {
                name.to_string()
            } else {
                path.with_extension("xlsx").to_string_lossy().into_owned()
            }
        }
    }
}

/// Writes the whole table to `dir/<file_name>` in the format it was read from.
pub fn write_table(table: &Table, dir: &Path, file_name: &str) -> Result<PathBuf, BatchError> {
    let path = dir.join(file_name);
    let result = match table.source {
        SourceFormat::Csv { delimiter } => write_csv(table, &path, delimiter),
        SourceFormat::Workbook => write_xlsx(table, &path).map_err(|e| e.to_string()),
    };
    result.map_err(|reason| BatchError::SpreadsheetWrite {
        path: path.clone(),
        reason,
    })?;
    Ok(path)
}

fn write_xlsx(table: &Table, path: &Path) -> Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let worksheet = workbook.add_worksheet();

    for (col, header) in table.headers.iter().enumerate() {
        worksheet.write_string(0, col as u16, header)?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        let r = (r + 1) as u32;
        for (c, cell) in row.iter().enumerate() {
            let c = c as u16;
            match cell {
                Cell::Empty => {}
                Cell::Text(s) => {
                    worksheet.write_string(r, c, s)?;
                }
                Cell::Number(n) => {
                    worksheet.write_number(r, c, *n)?;
                }
                Cell::Bool(b) => {
                    worksheet.write_boolean(r, c, *b)?;
                }
                Cell::Date(dt) => {
                    let excel = ExcelDateTime::from_ymd(
                        dt.year() as u16,
                        dt.month() as u8,
                        dt.day() as u8,
                    )?
                    .and_hms(dt.hour() as u16, dt.minute() as u8, dt.second() as u8)?;
                    worksheet.write_datetime_with_format(r, c, &excel, &date_format)?;
                }
            }
        }
    }

    workbook.save(path)?;
    Ok(())
}

fn write_csv(table: &Table, path: &Path, delimiter: u8) -> Result<(), String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| e.to_string())?;
    writer
        .write_record(&table.headers)
        .map_err(|e| e.to_string())?;
    for row in &table.rows {
        writer
            .write_record(row.iter().map(|c| c.to_string()))
            .map_err(|e| e.to_string())?;
    }
    writer.flush().map_err(|e| e.to_string())
}
