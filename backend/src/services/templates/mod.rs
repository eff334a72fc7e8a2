//! # Template Service Module
//!
//! Locates the certificate template and fills it with one row's values.
//!
//! ## Sub-modules:
//! - `package`: reads and writes OOXML zip packages in memory.
//! - `runs`: streams paragraph runs so text can be edited without touching formatting.
//! - `placeholder`: literal token replacement used by slides.
//! - `docx`: `{{ KEY }}` merge fields for Word documents.
//! - `pptx`: run-level token replacement for slide decks.
//! - `layout`: reads text and geometry back for PDF fallbacks.

pub mod docx;
pub mod layout;
pub mod package;
pub mod placeholder;
pub mod pptx;
mod runs;

use crate::config::{downloads_dir, TemplateConfig};
use crate::error::{BatchError, TemplateError};
use crate::services::merge::context::PlaceholderContext;
use log::{debug, info};
use package::Package;
use std::path::{Path, PathBuf};

/// Template family, decided by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKind {
    /// Word document with `{{ KEY }}` merge fields.
    Document,
    /// Slide deck with literal tokens in its runs.
    Presentation,
}

impl TemplateKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "docx" => Some(Self::Document),
            "pptx" => Some(Self::Presentation),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Document => "docx",
            Self::Presentation => "pptx",
        }
    }
}

/// Candidate template paths in search order.
pub fn search_locations(cfg: &TemplateConfig) -> Vec<PathBuf> {
    let mut locations = Vec::new();
    if let Some(path) = &cfg.path {
        locations.push(path.clone());
    }
    if let Some(exe_dir) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        locations.push(exe_dir.join("resources").join(&cfg.file_name));
        locations.push(exe_dir.join(&cfg.file_name));
    }
    if let Ok(cwd) = std::env::current_dir() {
        locations.push(cwd.join(&cfg.file_name));
    }
    locations.push(downloads_dir().join("certificados").join(&cfg.file_name));
    locations
}

/// First existing template among [`search_locations`].
pub fn resolve(cfg: &TemplateConfig) -> Result<PathBuf, BatchError> {
    let searched = search_locations(cfg);
    match searched.iter().find(|p| p.is_file()) {
        Some(found) => {
            info!("Using template {}", found.display());
            Ok(found.clone())
        }
        None => Err(BatchError::TemplateNotFound {
            file_name: cfg.file_name.clone(),
            searched,
        }),
    }
}

/// `<stem>_<variant>.<ext>` next to `base`, if that file exists.
pub fn variant_template(base: &Path, variant: &str) -> Option<PathBuf> {
    let variant = variant.trim();
    if variant.is_empty() || variant.contains(['/', '\\']) || variant.starts_with('.') {
        return None;
    }
    let stem = base.file_stem()?.to_str()?;
    let ext = base.extension()?.to_str()?;
    let candidate = base.with_file_name(format!("{stem}_{variant}.{ext}"));
    if candidate.is_file() {
        Some(candidate)
    } else {
        debug!("No template for variant '{}', using {}", variant, base.display());
        None
    }
}

/// Fills `template` with `ctx` and writes the result to `output`.
pub fn render(
    template: &Path,
    ctx: &PlaceholderContext,
    output: &Path,
) -> Result<TemplateKind, TemplateError> {
    let kind = TemplateKind::from_path(template).ok_or_else(|| TemplateError::UnsupportedFormat {
        path: template.to_path_buf(),
    })?;
    let mut package = Package::open(template)?;
    match kind {
        TemplateKind::Document => docx::render(&mut package, ctx)?,
        TemplateKind::Presentation => pptx::render(&mut package, ctx)?,
    }
    package.save(output)?;
    Ok(kind)
}
