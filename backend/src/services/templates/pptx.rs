//! Token substitution for slide templates.

use super::package::Package;
use super::placeholder::TokenSet;
use super::runs::{self, DRAWING};
use crate::error::TemplateError;
use crate::services::merge::context::PlaceholderContext;

/// `ppt/slides/slideN.xml`, excluding layouts, masters and relationship parts.
pub fn is_slide_part(name: &str) -> bool {
    name.strip_prefix("ppt/slides/slide")
        .and_then(|rest| rest.strip_suffix(".xml"))
        .is_some_and(|n| !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()))
}

/// Slide part names ordered by slide number.
pub fn slide_parts(package: &Package) -> Vec<String> {
    let mut slides: Vec<(u32, String)> = package
        .part_names()
        .filter(|n| is_slide_part(n))
        .filter_map(|n| {
            let number = n
                .trim_start_matches("ppt/slides/slide")
                .trim_end_matches(".xml")
                .parse()
                .ok()?;
            Some((number, n.to_string()))
        })
        .collect();
    slides.sort();
    slides.into_iter().map(|(_, n)| n).collect()
}

/// Replaces tokens run by run on every slide. Only run text changes.
pub fn render(package: &mut Package, ctx: &PlaceholderContext) -> Result<(), TemplateError> {
    if package.part("ppt/presentation.xml").is_none() {
        return Err(TemplateError::MissingPart("ppt/presentation.xml".to_string()));
    }

    let tokens = TokenSet::for_presentation(ctx);
    for name in slide_parts(package) {
        let Some(xml) = package.part(&name) else {
            continue;
        };
        let rewritten = runs::rewrite_paragraphs(xml, DRAWING, |slots| {
            for slot in slots.iter_mut() {
                if let Some(replaced) = tokens.replace(slot) {
                    *slot = replaced;
                }
            }
            Ok(())
        })?;
        package.set_part(&name, rewritten);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::package::tests::package_with;
    use super::*;
    use crate::services::data_sources::spreadsheet::record::Record;
    use crate::services::merge::context::build_context;
    use common::model::status::CertificateStatus;

    fn ctx() -> PlaceholderContext {
        build_context(&Record {
            row: 0,
            item: String::new(),
            nombre: "Ana Pérez".into(),
            cedula: "1020".into(),
            fecha: None,
            compania: "ACME".into(),
            status: CertificateStatus::Pending,
            horas: "40".into(),
            id_formacion: String::new(),
            variant: None,
        })
        .unwrap()
    }

    fn slide(runs: &[&str]) -> String {
        let body: String = runs
            .iter()
            .map(|t| format!(r#"<a:r><a:rPr lang="es-CO" b="1"/><a:t>{t}</a:t></a:r>"#))
            .collect();
        format!(r#"<p:sld><p:cSld><p:spTree><p:sp><p:txBody><a:p>{body}</a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#)
    }

    #[test]
    fn slide_names_are_recognized_and_ordered() {
        let pkg = package_with(&[
            ("ppt/presentation.xml", "<p/>"),
            ("ppt/slides/slide10.xml", ""),
            ("ppt/slides/slide2.xml", ""),
            ("ppt/slides/_rels/slide2.xml.rels", ""),
            ("ppt/slideLayouts/slideLayout1.xml", ""),
        ]);
        assert_eq!(slide_parts(&pkg), ["ppt/slides/slide2.xml", "ppt/slides/slide10.xml"]);
    }

    #[test]
    fn replaces_every_encoding_and_keeps_formatting() {
        let xml = slide(&["{{NOMBRE}}", "{{horas}} h", "CEDULA", "compania"]);
        let mut pkg = package_with(&[
            ("ppt/presentation.xml", "<p/>"),
            ("ppt/slides/slide1.xml", xml.as_str()),
        ]);
        render(&mut pkg, &ctx()).unwrap();

        let out = String::from_utf8(pkg.part("ppt/slides/slide1.xml").unwrap().to_vec()).unwrap();
        assert_eq!(out, slide(&["Ana Pérez", "40 h", "1020", "ACME"]));
    }

    #[test]
    fn words_containing_a_key_survive() {
        let xml = slide(&["NOMBRES Y APELLIDOS: NOMBRE"]);
        let mut pkg = package_with(&[
            ("ppt/presentation.xml", "<p/>"),
            ("ppt/slides/slide1.xml", xml.as_str()),
        ]);
        render(&mut pkg, &ctx()).unwrap();

        let out = String::from_utf8(pkg.part("ppt/slides/slide1.xml").unwrap().to_vec()).unwrap();
        assert_eq!(out, slide(&["NOMBRES Y APELLIDOS: Ana Pérez"]));
    }
}
