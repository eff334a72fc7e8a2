use crate::error::ConversionError;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::{Document, Size};
use log::debug;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Landscape A4, in millimetres.
pub const PAGE_WIDTH_MM: f64 = 297.0;
pub const PAGE_HEIGHT_MM: f64 = 210.0;

/// Where the TTF families used by the genpdf strategies live.
#[derive(Debug, Clone)]
pub struct FontSource {
    pub dir: PathBuf,
    /// Tried in order; each needs `<name>-Regular.ttf`, `-Bold`, `-Italic` and `-BoldItalic`.
    pub families: Vec<String>,
}

impl FontSource {
    pub fn new(dir: impl Into<PathBuf>, families: Vec<String>) -> Self {
        Self {
            dir: dir.into(),
            families,
        }
    }

    /// Cheap check used before attempting a render.
    pub fn has_candidates(&self) -> bool {
        self.families
            .iter()
            .any(|f| self.dir.join(format!("{f}-Regular.ttf")).is_file())
    }

    /// Loads the first family that is complete in `dir`.
    pub fn load_font(&self) -> Result<FontFamily<FontData>, ConversionError> {
        for family in &self.families {
            match genpdf::fonts::from_files(&self.dir, family, None) {
                Ok(fonts) => return Ok(fonts),
                Err(e) => debug!("Font family '{}' not usable: {}", family, e),
            }
        }
        Err(ConversionError::Unavailable(format!(
            "no font family {:?} in {}",
            self.families,
            self.dir.display()
        )))
    }
}

/// A landscape A4 document with the given title and base font size.
///
/// Without a page decorator the whole page is drawable, which the layout strategy
/// relies on for absolute positioning.
pub fn configure_document(
    fonts: &FontSource,
    title: &str,
    font_size: u8,
) -> Result<Document, ConversionError> {
    let font_family = fonts.load_font()?;
    let mut doc = Document::new(font_family);
    doc.set_title(title);
    doc.set_paper_size(Size::new(PAGE_WIDTH_MM, PAGE_HEIGHT_MM));
    doc.set_font_size(font_size);
    doc.set_line_spacing(1.15);
    Ok(doc)
}

pub fn render_to(doc: Document, output: &Path) -> Result<(), ConversionError> {
    let mut out_file = File::create(output)?;
    doc.render(&mut out_file)?;
    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fonts_make_the_source_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontSource::new(dir.path(), vec!["Arial".into(), "LiberationSans".into()]);
        assert!(!fonts.has_candidates());
        assert!(matches!(
            fonts.load_font().unwrap_err(),
            ConversionError::Unavailable(msg) if msg.contains("LiberationSans")
        ));
    }

    #[test]
    fn a_regular_face_counts_as_a_candidate() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("Arial-Regular.ttf"), b"not really a font").unwrap();
        let fonts = FontSource::new(dir.path(), vec!["Arial".into()]);
        assert!(fonts.has_candidates());
        assert!(fonts.load_font().is_err());
    }
}
