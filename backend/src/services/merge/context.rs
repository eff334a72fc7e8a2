//! Per-row placeholder context.

use crate::error::RowError;
use crate::services::data_sources::spreadsheet::record::Record;
use crate::services::data_sources::spreadsheet::Cell;
use chrono::{Datelike, Days, NaiveDate, NaiveDateTime};
use common::model::place_holder::PlaceholderKey;

pub const MESES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Flat `key → value` mapping for one record. Every [`PlaceholderKey`] is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderContext {
    values: Vec<(PlaceholderKey, String)>,
}

impl PlaceholderContext {
    pub fn get(&self, key: PlaceholderKey) -> &str {
        self.values
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or_default()
    }

    /// Looks a value up by its template tag (`NOMBRE`, `AÑO`, ...).
    pub fn get_tag(&self, tag: &str) -> Option<&str> {
        PlaceholderKey::from_tag(tag).map(|key| self.get(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (PlaceholderKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }
}

/// Builds the placeholder context for `record`.
///
/// A missing date yields empty `DIA`/`MES`/`AÑO`; a date that cannot be parsed fails
/// the row.
pub fn build_context(record: &Record) -> Result<PlaceholderContext, RowError> {
    let (dia, mes, anio) = match &record.fecha {
        Some(cell) => {
            let date = parse_date(cell)?;
            (
                format!("{:02}", date.day()),
                MESES[date.month0() as usize].to_string(),
                format!("{:04}", date.year()),
            )
        }
        None => (String::new(), String::new(), String::new()),
    };

    let values = vec![
        (PlaceholderKey::Item, record.item.clone()),
        (PlaceholderKey::Nombre, record.nombre.clone()),
        (PlaceholderKey::Cedula, record.cedula.clone()),
        (PlaceholderKey::Dia, dia),
        (PlaceholderKey::Mes, mes),
        (PlaceholderKey::Anio, anio),
        (PlaceholderKey::Compania, record.compania.clone()),
        (PlaceholderKey::Horas, record.horas.clone()),
        (PlaceholderKey::IdFormacion, record.id_formacion.clone()),
    ];
    Ok(PlaceholderContext { values })
}

fn parse_date(cell: &Cell) -> Result<NaiveDate, RowError> {
    let invalid = || RowError::InvalidDate {
        value: cell.to_string(),
    };
    match cell {
        Cell::Date(dt) => Ok(dt.date()),
        Cell::Number(serial) if *serial >= 1.0 => excel_serial_to_date(*serial).ok_or_else(invalid),
        Cell::Text(s) => parse_date_text(s.trim()).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// Spreadsheet serial day numbers count from 1899-12-30.
fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)?.checked_add_days(Days::new(serial.floor() as u64))
}

fn parse_date_text(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
}
