use serde::{Deserialize, Serialize};

/// Logical placeholder keys a certificate template can reference.
///
/// Every key is exposed to templates under its upper-case tag (see [`PlaceholderKey::tag`]).
/// Presentation templates may also use the lower-case form, with or without braces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaceholderKey {
    Item,
    Nombre,
    Cedula,
    Dia,
    Mes,
    Anio,
    Compania,
    Horas,
    IdFormacion,
}

impl PlaceholderKey {
    pub const ALL: [PlaceholderKey; 9] = [
        PlaceholderKey::Item,
        PlaceholderKey::Nombre,
        PlaceholderKey::Cedula,
        PlaceholderKey::Dia,
        PlaceholderKey::Mes,
        PlaceholderKey::Anio,
        PlaceholderKey::Compania,
        PlaceholderKey::Horas,
        PlaceholderKey::IdFormacion,
    ];

    /// The literal tag used inside templates.
    pub fn tag(self) -> &'static str {
        match self {
            PlaceholderKey::Item => "ITEM",
            PlaceholderKey::Nombre => "NOMBRE",
            PlaceholderKey::Cedula => "CEDULA",
            PlaceholderKey::Dia => "DIA",
            PlaceholderKey::Mes => "MES",
            PlaceholderKey::Anio => "AÑO",
            PlaceholderKey::Compania => "COMPANIA",
            PlaceholderKey::Horas => "HORAS",
            PlaceholderKey::IdFormacion => "ID_FORMACION",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        PlaceholderKey::ALL.into_iter().find(|key| key.tag() == tag)
    }
}
