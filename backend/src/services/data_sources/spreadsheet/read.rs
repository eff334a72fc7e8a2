use super::{Cell, SourceFormat, Table};
use crate::error::BatchError;
use calamine::{open_workbook_auto_from_rs, Data, DataType, Reader};
use std::io::Cursor;
use std::path::Path;

/// Parses an uploaded spreadsheet. CSV uploads are recognized by extension; everything
/// else goes through calamine, which sniffs XLSX/XLSM/XLS/ODS on its own.
pub fn read_table(file_name: &str, bytes: Vec<u8>) -> Result<Table, BatchError> {
    if bytes.is_empty() {
        return Err(BatchError::UnreadableSpreadsheet(
            "el archivo está vacío".to_string(),
        ));
    }
    let is_csv = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    if is_csv {
        read_csv(&bytes)
    } else {
        read_workbook(bytes)
    }
}

fn read_workbook(bytes: Vec<u8>) -> Result<Table, BatchError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
        .map_err(|e| BatchError::UnreadableSpreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| BatchError::UnreadableSpreadsheet("el libro no tiene hojas".to_string()))?
        .map_err(|e| BatchError::UnreadableSpreadsheet(e.to_string()))?;

    let mut rows = range.rows();
    let headers: Vec<String> = rows
        .next()
        .ok_or_else(|| BatchError::UnreadableSpreadsheet("la hoja está vacía".to_string()))?
        .iter()
        .map(|cell| normalize_header(&cell.to_string()))
        .collect();

    let data = rows.map(|row| row.iter().map(convert_cell).collect()).collect();
    Ok(Table::new(headers, data, SourceFormat::Workbook))
}

fn convert_cell(cell: &Data) -> Cell {
    match cell {
        Data::Empty => Cell::Empty,
        Data::String(s) if s.trim().is_empty() => Cell::Empty,
        Data::String(s) => Cell::Text(s.clone()),
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::Bool(b) => Cell::Bool(*b),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_datetime()
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(cell.to_string())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) => Cell::Empty,
    }
}

fn read_csv(bytes: &[u8]) -> Result<Table, BatchError> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| BatchError::UnreadableSpreadsheet("el CSV no es UTF-8 válido".to_string()))?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let header_line = text.lines().next().unwrap_or_default();
    let delimiter = detect_delimiter(header_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| BatchError::UnreadableSpreadsheet(e.to_string()))?
        .iter()
        .map(normalize_header)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| BatchError::UnreadableSpreadsheet(e.to_string()))?;
        rows.push(
            record
                .iter()
                .map(|value| {
                    if value.trim().is_empty() {
                        Cell::Empty
                    } else {
                        Cell::Text(value.to_string())
                    }
                })
                .collect(),
        );
    }

    Ok(Table::new(headers, rows, SourceFormat::Csv { delimiter }))
}

/// Picks the most frequent of `,`, `;`, tab and `|` in the header line.
pub fn detect_delimiter(header_line: &str) -> u8 {
    [b',', b';', b'\t', b'|']
        .into_iter()
        .max_by_key(|&d| header_line.bytes().filter(|&b| b == d).count())
        .filter(|&d| header_line.as_bytes().contains(&d))
        .unwrap_or(b',')
}

/// Trims whitespace (including no-break spaces) and surrounding quotes from a header cell.
fn normalize_header(cell: &str) -> String {
    let s = cell.trim();
    let s = s
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(s);
    s.replace('\u{00A0}', " ").trim().to_string()
}
