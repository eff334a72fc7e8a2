use super::columns::{
    CEDULA, CERTIFICADO, COMPANIA, FECHA, HORAS, ID_FORMACION, ITEM, NOMBRE, PLANTILLA,
};
use super::{Cell, Table};
use common::model::status::CertificateStatus;

/// Typed view over one normalized spreadsheet row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    /// Zero-based data row index in the table.
    pub row: usize,
    pub item: String,
    pub nombre: String,
    pub cedula: String,
    /// Raw date cell; `None` when the column is absent or the cell is empty.
    pub fecha: Option<Cell>,
    pub compania: String,
    pub status: CertificateStatus,
    pub horas: String,
    pub id_formacion: String,
    /// Template variant selector, when the sheet carries a `plantilla` column.
    pub variant: Option<String>,
}

impl Record {
    pub fn from_table(table: &Table, row: usize) -> Self {
        let text = |column: &str| table.value(row, column).to_string().trim().to_string();
        let fecha = table.value(row, FECHA);
        let variant = text(PLANTILLA);

        Self {
            row,
            item: text(ITEM),
            nombre: text(NOMBRE),
            cedula: text(CEDULA),
            fecha: (!fecha.is_empty()).then(|| fecha.clone()),
            compania: text(COMPANIA),
            status: CertificateStatus::from_cell(&text(CERTIFICADO)),
            horas: text(HORAS),
            id_formacion: text(ID_FORMACION),
            variant: (!variant.is_empty()).then_some(variant),
        }
    }

    /// Tag used in output file names: the explicit variant, else `<hours>_horas`,
    /// else `general`.
    pub fn variant_tag(&self) -> String {
        match (&self.variant, self.horas.is_empty()) {
            (Some(variant), _) => variant.clone(),
            (None, false) => format!("{}_horas", self.horas),
            (None, true) => "general".to_string(),
        }
    }
}

#[cfg(test)]
impl Record {
    /// Pending record carrying only a name, a company and 40 hours.
    pub(crate) fn sample(nombre: &str, compania: &str) -> Self {
        Self {
            row: 0,
            item: String::new(),
            nombre: nombre.to_string(),
            cedula: String::new(),
            fecha: None,
            compania: compania.to_string(),
            status: CertificateStatus::Pending,
            horas: "40".to_string(),
            id_formacion: String::new(),
            variant: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::SourceFormat;
    use super::*;

    fn table(headers: &[&str], row: Vec<Cell>) -> Table {
        Table::new(
            headers.iter().map(|h| h.to_string()).collect(),
            vec![row],
            SourceFormat::Workbook,
        )
    }

    #[test]
    fn reads_required_and_optional_fields() {
        let t = table(
            &[NOMBRE, CEDULA, COMPANIA, CERTIFICADO, HORAS],
            vec![
                Cell::Text(" Ana Pérez ".into()),
                Cell::Number(1020304.0),
                Cell::Text("ACME".into()),
                Cell::Text("no".into()),
                Cell::Number(40.0),
            ],
        );
        let record = Record::from_table(&t, 0);
        assert_eq!(record.nombre, "Ana Pérez");
        assert_eq!(record.cedula, "1020304");
        assert_eq!(record.horas, "40");
        assert_eq!(record.item, "");
        assert_eq!(record.fecha, None);
        assert!(record.status.is_pending());
        assert_eq!(record.variant, None);
        assert_eq!(record.variant_tag(), "40_horas");
    }

    #[test]
    fn explicit_variant_overrides_hours() {
        let t = table(
            &[NOMBRE, HORAS, PLANTILLA],
            vec![
                Cell::Text("Ana".into()),
                Cell::Number(40.0),
                Cell::Text("diplomado".into()),
            ],
        );
        assert_eq!(Record::from_table(&t, 0).variant_tag(), "diplomado");
    }

    #[test]
    fn no_hours_and_no_variant_is_general() {
        let t = table(&[NOMBRE], vec![Cell::Text("Ana".into())]);
        assert_eq!(Record::from_table(&t, 0).variant_tag(), "general");
    }
}
