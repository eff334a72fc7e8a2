//! Canonical column schema and header normalization.
//!
//! Spreadsheets arrive with headers typed by hand, so every canonical column accepts a
//! fixed list of spellings. The first spelling (in list order) found among the headers
//! is the one renamed; any other matching header is left untouched.

use crate::error::BatchError;
use crate::services::templates::TemplateKind;
use std::collections::HashMap;

pub const ITEM: &str = "item";
pub const NOMBRE: &str = "nombre";
pub const CEDULA: &str = "cedula";
pub const FECHA: &str = "fecha";
pub const COMPANIA: &str = "compañia";
pub const CERTIFICADO: &str = "certificado";
pub const HORAS: &str = "horas";
pub const ID_FORMACION: &str = "id_formacion";
pub const PLANTILLA: &str = "plantilla";

pub struct CanonicalColumn {
    pub name: &'static str,
    pub spellings: &'static [&'static str],
}

pub const SCHEMA: [CanonicalColumn; 9] = [
    CanonicalColumn {
        name: ITEM,
        spellings: &["item", "Item", "ITEM"],
    },
    CanonicalColumn {
        name: NOMBRE,
        spellings: &["nombre", "Nombre", "NOMBRE"],
    },
    CanonicalColumn {
        name: CEDULA,
        spellings: &["cedula", "Cedula", "CÉDULA", "cédula", "Cédula", "CEDULA"],
    },
    CanonicalColumn {
        name: FECHA,
        spellings: &["fecha", "Fecha", "FECHA"],
    },
    CanonicalColumn {
        name: COMPANIA,
        spellings: &[
            "compañia", "Compañia", "COMPAÑÍA", "compania", "Compania", "empresa", "Empresa",
            "COMPAÑIA",
        ],
    },
    CanonicalColumn {
        name: CERTIFICADO,
        spellings: &["certificado", "Certificado", "CERTIFICADO"],
    },
    CanonicalColumn {
        name: HORAS,
        spellings: &["horas", "Horas", "HORAS"],
    },
    CanonicalColumn {
        name: ID_FORMACION,
        spellings: &[
            "id_formacion",
            "Id_Formacion",
            "ID_FORMACION",
            "id formación",
            "Id Formación",
            "ID FORMACIÓN",
        ],
    },
    CanonicalColumn {
        name: PLANTILLA,
        spellings: &[
            "plantilla", "Plantilla", "PLANTILLA", "variante", "Variante", "VARIANTE",
        ],
    },
];

/// Columns that must be present for the given template kind.
///
/// Presentation templates only print the person, the organization and the hours, so
/// `item`, `fecha` and `id_formacion` are optional for them.
pub fn required_columns(kind: TemplateKind) -> &'static [&'static str] {
    match kind {
        TemplateKind::Document => &[
            ITEM,
            NOMBRE,
            CEDULA,
            FECHA,
            COMPANIA,
            CERTIFICADO,
            HORAS,
            ID_FORMACION,
        ],
        TemplateKind::Presentation => &[NOMBRE, CEDULA, COMPANIA, CERTIFICADO, HORAS],
    }
}

/// Computes the `actual header → canonical name` rename for `headers`.
///
/// Optional columns are mapped when present. Fails on the first required column
/// without any accepted spelling.
pub fn normalize_columns(
    headers: &[String],
    required: &[&str],
) -> Result<HashMap<String, String>, BatchError> {
    let mut mapping = HashMap::new();

    for column in &SCHEMA {
        let found = column
            .spellings
            .iter()
            .find(|spelling| headers.iter().any(|h| h == *spelling));

        match found {
            Some(spelling) => {
                mapping.insert(spelling.to_string(), column.name.to_string());
            }
            None if required.contains(&column.name) => {
                return Err(BatchError::MissingColumn {
                    field: column.name.to_string(),
                    available: headers.to_vec(),
                });
            }
            None => {}
        }
    }

    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn every_spelling_maps_to_its_canonical_column_once() {
        let required = required_columns(TemplateKind::Document);
        for column in &SCHEMA {
            for spelling in column.spellings {
                let mut hs = headers(&[
                    "item",
                    "nombre",
                    "cedula",
                    "fecha",
                    "compañia",
                    "certificado",
                    "horas",
                    "id_formacion",
                ]);
                hs.retain(|h| h != column.name);
                hs.push(spelling.to_string());

                let mapping = normalize_columns(&hs, required).unwrap();
                let hits: Vec<_> = mapping.values().filter(|v| *v == column.name).collect();
                assert_eq!(hits.len(), 1, "spelling {spelling}");
                assert_eq!(mapping.get(*spelling).map(String::as_str), Some(column.name));
            }
        }
    }

    #[test]
    fn missing_required_column_names_the_field() {
        let hs = headers(&["Nombre", "Cédula", "Empresa", "Certificado"]);
        let err = normalize_columns(&hs, required_columns(TemplateKind::Presentation)).unwrap_err();
        match err {
            BatchError::MissingColumn { field, available } => {
                assert_eq!(field, HORAS);
                assert_eq!(available, hs);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn presentation_templates_do_not_need_item_date_or_training_id() {
        let hs = headers(&["NOMBRE", "CEDULA", "Compania", "CERTIFICADO", "Horas"]);
        let mapping = normalize_columns(&hs, required_columns(TemplateKind::Presentation)).unwrap();
        assert_eq!(mapping.len(), 5);
        assert!(normalize_columns(&hs, required_columns(TemplateKind::Document)).is_err());
    }

    #[test]
    fn first_listed_spelling_wins_when_several_are_present() {
        let hs = headers(&["Nombre", "nombre", "cedula", "empresa", "certificado", "horas"]);
        let mapping = normalize_columns(&hs, required_columns(TemplateKind::Presentation)).unwrap();
        assert_eq!(mapping.get("nombre").map(String::as_str), Some(NOMBRE));
        assert!(!mapping.contains_key("Nombre"));
    }

    #[test]
    fn optional_variant_column_is_picked_up() {
        let hs = headers(&["nombre", "cedula", "empresa", "certificado", "horas", "Variante"]);
        let mapping = normalize_columns(&hs, required_columns(TemplateKind::Presentation)).unwrap();
        assert_eq!(mapping.get("Variante").map(String::as_str), Some(PLANTILLA));
    }
}
