//! In-memory spreadsheet handling for the certificate batch.
//!
//! The uploaded workbook (or CSV) is loaded once into a [`Table`], normalized to the
//! canonical column names, filtered down to pending rows, updated as rows are issued and
//! finally written back next to the generated certificates.
//!
//! - `read`: turns the uploaded bytes into a [`Table`].
//! - `columns`: maps variant header spellings onto canonical names.
//! - `filter`: selects rows whose certificate is still pending.
//! - `record`: typed view over one normalized row.
//! - `write`: persists the updated table.

pub mod columns;
pub mod filter;
pub mod read;
pub mod record;
pub mod write;

use chrono::{NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::fmt;

/// A single spreadsheet value, reduced to what the pipeline cares about.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    Date(NaiveDateTime),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Empty => Ok(()),
            Cell::Text(s) => f.write_str(s),
            // Whole numbers print without a fractional part so `40` hours stays `40`.
            Cell::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => write!(f, "{}", *n as i64),
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Bool(b) => write!(f, "{}", b),
            Cell::Date(dt) if dt.num_seconds_from_midnight() == 0 => {
                write!(f, "{}", dt.format("%Y-%m-%d"))
            }
            Cell::Date(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Where the table came from; decides how it is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Workbook,
    Csv { delimiter: u8 },
}

/// Header row plus data rows of the first worksheet.
#[derive(Debug, Clone)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub source: SourceFormat,
}

static EMPTY: Cell = Cell::Empty;

impl Table {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>, source: SourceFormat) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width.max(row.len()), Cell::Empty);
                row
            })
            .collect();
        Self {
            headers,
            rows,
            source,
        }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn cell(&self, row: usize, col: usize) -> &Cell {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY)
    }

    /// Reads a cell by canonical column name; missing columns read as empty.
    pub fn value(&self, row: usize, column: &str) -> &Cell {
        match self.column_index(column) {
            Some(col) => self.cell(row, col),
            None => &EMPTY,
        }
    }

    pub fn set_cell(&mut self, row: usize, col: usize, value: Cell) {
        if let Some(r) = self.rows.get_mut(row) {
            if col >= r.len() {
                r.resize(col + 1, Cell::Empty);
            }
            r[col] = value;
        }
    }

    /// Applies an `actual header → canonical name` mapping in place.
    pub fn rename_columns(&mut self, mapping: &HashMap<String, String>) {
        for header in &mut self.headers {
            if let Some(canonical) = mapping.get(header.as_str()) {
                *header = canonical.clone();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn numbers_and_dates_render_like_the_spreadsheet_shows_them() {
        assert_eq!(Cell::Number(40.0).to_string(), "40");
        assert_eq!(Cell::Number(12.5).to_string(), "12.5");
        assert_eq!(Cell::Empty.to_string(), "");
        let date = NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(Cell::Date(date).to_string(), "2024-03-07");
    }

    #[test]
    fn short_rows_are_padded_and_missing_columns_read_empty() {
        let table = Table::new(
            vec!["a".into(), "b".into()],
            vec![vec![Cell::Text("x".into())]],
            SourceFormat::Workbook,
        );
        assert_eq!(table.rows[0].len(), 2);
        assert_eq!(table.value(0, "b"), &Cell::Empty);
        assert_eq!(table.value(0, "zzz"), &Cell::Empty);
        assert_eq!(table.value(5, "a"), &Cell::Empty);
    }

    #[test]
    fn rename_only_touches_mapped_headers() {
        let mut table = Table::new(
            vec!["Nombre".into(), "Otro".into()],
            vec![],
            SourceFormat::Workbook,
        );
        let mapping = HashMap::from([("Nombre".to_string(), "nombre".to_string())]);
        table.rename_columns(&mapping);
        assert_eq!(table.headers, ["nombre", "Otro"]);
    }
}
