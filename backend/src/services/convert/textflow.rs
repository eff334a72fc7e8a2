use super::pdf::{configure_document, render_to, FontSource};
use super::ConversionStrategy;
use crate::error::ConversionError;
use crate::services::templates::layout;
use genpdf::elements::{Break, Paragraph};
use genpdf::style::{Style, StyledString};
use genpdf::{Alignment, Element, SimplePageDecorator};
use std::path::Path;

/// Last resort: the document's text as a bold title followed by plain paragraphs.
pub struct TextFlow {
    fonts: FontSource,
}

impl TextFlow {
    pub fn new(fonts: FontSource) -> Self {
        Self { fonts }
    }
}

impl ConversionStrategy for TextFlow {
    fn name(&self) -> &str {
        "text-flow"
    }

    fn is_available(&self) -> bool {
        self.fonts.has_candidates()
    }

    fn attempt(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let layout = layout::extract(input)?;
        let mut lines = layout.lines();
        let Some(title) = lines.next() else {
            return Err(ConversionError::Pdf(format!(
                "no text found in {}",
                input.display()
            )));
        };

        let mut doc = configure_document(&self.fonts, title, 12)?;
        let mut decorator = SimplePageDecorator::new();
        decorator.set_margins(20);
        doc.set_page_decorator(decorator);

        doc.push(
            Paragraph::new(StyledString::new(
                title.to_string(),
                Style::new().bold().with_font_size(18),
            ))
            .aligned(Alignment::Center),
        );
        doc.push(Break::new(2));
        for line in lines {
            doc.push(Paragraph::new(line.to_string()).padded(1));
        }
        render_to(doc, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::convert::pdf::fixtures::system_fonts;
    use crate::services::templates::package::tests::package_with;

    #[test]
    fn document_text_flows_into_a_pdf() {
        let Some((_fonts_dir, fonts)) = system_fonts() else {
            eprintln!("no system sans font installed; skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("certificado_8_horas_Ana.docx");
        package_with(&[(
            "word/document.xml",
            "<w:body><w:p><w:r><w:t>Certificado de asistencia</w:t></w:r></w:p><w:p><w:r><w:t>Ana Pérez</w:t></w:r></w:p><w:p><w:r><w:t>8 horas</w:t></w:r></w:p></w:body>",
        )])
        .save(&input)
        .unwrap();
        let output = dir.path().join("certificado_8_horas_Ana.pdf");

        TextFlow::new(fonts).attempt(&input, &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() >= 1000);
    }

    #[test]
    fn empty_document_is_a_failure() {
        let Some((_fonts_dir, fonts)) = system_fonts() else {
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("vacio.docx");
        package_with(&[("word/document.xml", "<w:body><w:p/></w:body>")])
            .save(&input)
            .unwrap();

        let err = TextFlow::new(fonts)
            .attempt(&input, &dir.path().join("vacio.pdf"))
            .unwrap_err();
        assert!(matches!(err, ConversionError::Pdf(_)));
    }
}
