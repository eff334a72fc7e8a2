//! Output tree: `<root>/<organization>/certificado_<variant>_<name>.<ext>`.

use crate::services::data_sources::spreadsheet::record::Record;
use crate::services::templates::TemplateKind;
use std::io;
use std::path::{Path, PathBuf};

pub const FALLBACK_ORGANIZATION: &str = "sin_compania";

/// Characters that may not appear in a directory name on any supported platform.
const FORBIDDEN: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Single path component for an organization name.
pub fn organization_dir_name(organization: &str) -> String {
    let name: String = organization
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() || FORBIDDEN.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect();
    match name.as_str() {
        "" | "." | ".." => FALLBACK_ORGANIZATION.to_string(),
        _ => name,
    }
}

/// File stem shared by the rendered document and its PDF.
pub fn certificate_base_name(record: &Record) -> String {
    let raw = format!(
        "certificado_{}_{}",
        record.variant_tag(),
        record.nombre.replace(' ', "_")
    );
    raw.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect::<String>()
        .trim_end()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePaths {
    pub rendered: PathBuf,
    pub pdf: PathBuf,
}

impl CertificatePaths {
    pub fn pdf_file_name(&self) -> String {
        file_name(&self.pdf)
    }

    pub fn rendered_file_name(&self) -> String {
        file_name(&self.rendered)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct OutputTree {
    root: PathBuf,
}

impl OutputTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn create_root(&self) -> io::Result<()> {
        std::fs::create_dir_all(&self.root)
    }

    /// Creates (if needed) and returns the organization's directory.
    pub fn organization_dir(&self, organization: &str) -> io::Result<PathBuf> {
        let dir = self.root.join(organization_dir_name(organization));
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Paths for one record. An existing file with the same name is overwritten later.
    pub fn certificate_paths(&self, record: &Record, kind: TemplateKind) -> io::Result<CertificatePaths> {
        let dir = self.organization_dir(&record.compania)?;
        let base = certificate_base_name(record);
        Ok(CertificatePaths {
            rendered: dir.join(format!("{base}.{}", kind.extension())),
            pdf: dir.join(format!("{base}.pdf")),
        })
    }
}
