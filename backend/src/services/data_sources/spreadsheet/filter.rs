use super::columns::CERTIFICADO;
use super::Table;
use common::model::status::CertificateStatus;

/// Indices of rows whose certificate is still pending, in spreadsheet order.
///
/// Expects a normalized table; without a `certificado` column nothing is pending.
pub fn pending_rows(table: &Table) -> Vec<usize> {
    let Some(col) = table.column_index(CERTIFICADO) else {
        return Vec::new();
    };
    (0..table.len())
        .filter(|&row| CertificateStatus::from_cell(&table.cell(row, col).to_string()).is_pending())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::super::{Cell, SourceFormat};
    use super::*;

    fn table(statuses: &[&str]) -> Table {
        Table::new(
            vec!["nombre".into(), CERTIFICADO.into()],
            statuses
                .iter()
                .enumerate()
                .map(|(i, s)| vec![Cell::Text(format!("p{i}")), Cell::Text(s.to_string())])
                .collect(),
            SourceFormat::Workbook,
        )
    }

    #[test]
    fn keeps_order_and_matches_case_folded_no() {
        let t = table(&["si", "no", " NO ", "No", "nope", "", "SI", "no"]);
        assert_eq!(pending_rows(&t), vec![1, 2, 3, 7]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let t = table(&["no", "si", "no"]);
        assert_eq!(pending_rows(&t), pending_rows(&t));
    }

    #[test]
    fn all_issued_yields_nothing() {
        let t = table(&["si", "SI", "Sí"]);
        assert!(pending_rows(&t).is_empty());
    }

    #[test]
    fn numeric_or_empty_status_cells_are_not_pending() {
        let t = Table::new(
            vec![CERTIFICADO.into()],
            vec![vec![Cell::Number(0.0)], vec![Cell::Empty], vec![Cell::Bool(false)]],
            SourceFormat::Workbook,
        );
        assert!(pending_rows(&t).is_empty());
    }
}
