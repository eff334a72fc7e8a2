//! Paragraph-level text rewriting over raw OOXML.
//!
//! Word and DrawingML both split a visible paragraph into runs, each carrying its own
//! text element. [`rewrite_paragraphs`] streams a part, collects the text of every run
//! of a paragraph into a slice of slots and hands that slice to a callback, then writes
//! the paragraph back with the (possibly edited) slot contents. Everything else, run
//! properties included, is copied through untouched.
//!
//! Paragraphs may nest (text boxes inside a Word paragraph). The inner paragraph is
//! rewritten first and its text is not part of the outer paragraph's slots.

use crate::error::TemplateError;
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// Element names for one markup vocabulary.
#[derive(Debug, Clone, Copy)]
pub struct Dialect {
    pub paragraph: &'static [u8],
    pub text: &'static [u8],
    /// Add `xml:space="preserve"` to text elements so edited leading/trailing spaces
    /// survive.
    pub preserve_space: bool,
}

/// WordprocessingML (`w:p` / `w:t`).
pub const WORD: Dialect = Dialect {
    paragraph: b"w:p",
    text: b"w:t",
    preserve_space: true,
};

/// DrawingML text bodies used by slides (`a:p` / `a:t`).
pub const DRAWING: Dialect = Dialect {
    paragraph: b"a:p",
    text: b"a:t",
    preserve_space: false,
};

enum Piece {
    Event(Event<'static>),
    Slot(usize),
}

#[derive(Default)]
struct Frame {
    pieces: Vec<Piece>,
    slots: Vec<String>,
    open_slot: Option<usize>,
}

fn write_error(e: impl std::fmt::Display) -> TemplateError {
    TemplateError::XmlWrite(e.to_string())
}

/// Rewrites every paragraph of `xml`, calling `edit` with the text of its runs in
/// document order.
pub fn rewrite_paragraphs<F>(xml: &[u8], dialect: Dialect, mut edit: F) -> Result<Vec<u8>, TemplateError>
where
    F: FnMut(&mut [String]) -> Result<(), TemplateError>,
{
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(xml.len()));
    let mut stack: Vec<Frame> = Vec::new();
    let mut buf = Vec::new();

    loop {
        let event = reader.read_event_into(&mut buf)?.into_owned();
        buf.clear();

        match event {
            Event::Eof => break,
            Event::Start(e) if e.name().as_ref() == dialect.paragraph => {
                stack.push(Frame {
                    pieces: vec![Piece::Event(Event::Start(e))],
                    ..Frame::default()
                });
            }
            Event::End(e) if e.name().as_ref() == dialect.paragraph && !stack.is_empty() => {
                let Some(mut frame) = stack.pop() else { break };
                edit(&mut frame.slots)?;

                let mut events = flatten(frame);
                events.push(Event::End(e));
                match stack.last_mut() {
                    Some(parent) => parent.pieces.extend(events.into_iter().map(Piece::Event)),
                    None => {
                        for ev in events {
                            writer.write_event(ev).map_err(write_error)?;
                        }
                    }
                }
            }
            event => match stack.last_mut() {
                Some(frame) => frame.push(event, dialect)?,
                None => writer.write_event(event).map_err(write_error)?,
            },
        }
    }

    // Unbalanced input: flush whatever is still buffered as-is.
    while let Some(frame) = stack.pop() {
        for ev in flatten(frame) {
            writer.write_event(ev).map_err(write_error)?;
        }
    }

    Ok(writer.into_inner())
}

/// Visits paragraph text without rewriting. Used for layout extraction.
pub fn paragraph_texts(xml: &[u8], dialect: Dialect) -> Result<Vec<String>, TemplateError> {
    let mut texts = Vec::new();
    rewrite_paragraphs(xml, dialect, |slots| {
        texts.push(slots.concat());
        Ok(())
    })?;
    Ok(texts)
}

impl Frame {
    fn push(&mut self, event: Event<'static>, dialect: Dialect) -> Result<(), TemplateError> {
        match event {
            Event::Start(e) if e.name().as_ref() == dialect.text => {
                let e = if dialect.preserve_space {
                    with_preserved_space(e)
                } else {
                    e
                };
                self.pieces.push(Piece::Event(Event::Start(e)));
                self.open_slot = Some(self.slots.len());
                self.pieces.push(Piece::Slot(self.slots.len()));
                self.slots.push(String::new());
            }
            Event::End(e) if e.name().as_ref() == dialect.text => {
                self.open_slot = None;
                self.pieces.push(Piece::Event(Event::End(e)));
            }
            Event::Text(t) if self.open_slot.is_some() => {
                let text = t.unescape()?;
                if let Some(slot) = self.open_slot {
                    self.slots[slot].push_str(&text);
                }
            }
            Event::CData(c) if self.open_slot.is_some() => {
                let text = String::from_utf8_lossy(&c.into_inner()).into_owned();
                if let Some(slot) = self.open_slot {
                    self.slots[slot].push_str(&text);
                }
            }
            other => self.pieces.push(Piece::Event(other)),
        }
        Ok(())
    }
}

fn flatten(frame: Frame) -> Vec<Event<'static>> {
    let Frame { pieces, slots, .. } = frame;
    pieces
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Event(ev) => Some(ev),
            Piece::Slot(i) if slots[i].is_empty() => None,
            Piece::Slot(i) => Some(Event::Text(BytesText::new(&slots[i]).into_owned())),
        })
        .collect()
}

fn with_preserved_space(start: BytesStart<'static>) -> BytesStart<'static> {
    let has_space = start
        .attributes()
        .flatten()
        .any(|a| a.key.as_ref() == b"xml:space");
    if has_space {
        start
    } else {
        let mut start = start;
        start.push_attribute(("xml:space", "preserve"));
        start
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(xml: &str, dialect: Dialect, f: impl FnMut(&mut [String]) -> Result<(), TemplateError>) -> String {
        String::from_utf8(rewrite_paragraphs(xml.as_bytes(), dialect, f).unwrap()).unwrap()
    }

    #[test]
    fn hands_every_run_of_a_paragraph_to_the_callback() {
        let xml = r#"<w:body><w:p><w:r><w:rPr><w:b/></w:rPr><w:t>Hola </w:t></w:r><w:r><w:t>{{NOM</w:t></w:r><w:r><w:t>BRE}}</w:t></w:r></w:p></w:body>"#;
        let mut seen = Vec::new();
        rewrite(xml, WORD, |slots| {
            seen.push(slots.to_vec());
            Ok(())
        });
        assert_eq!(seen, vec![vec!["Hola ", "{{NOM", "BRE}}"]]);
    }

    #[test]
    fn edited_text_is_escaped_and_properties_are_kept() {
        let xml = r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t>X</w:t></w:r></w:p>"#;
        let out = rewrite(xml, WORD, |slots| {
            slots[0] = "A & B".to_string();
            Ok(())
        });
        assert_eq!(
            out,
            r#"<w:p><w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">A &amp; B</w:t></w:r></w:p>"#
        );
    }

    #[test]
    fn drawing_text_is_left_without_space_attribute() {
        let xml = r#"<p:sp><a:p><a:r><a:t>NOMBRE</a:t></a:r></a:p></p:sp>"#;
        let out = rewrite(xml, DRAWING, |slots| {
            slots[0] = "Ana".into();
            Ok(())
        });
        assert_eq!(out, r#"<p:sp><a:p><a:r><a:t>Ana</a:t></a:r></a:p></p:sp>"#);
    }

    #[test]
    fn nested_paragraphs_are_edited_separately() {
        let xml = r#"<w:p><w:r><w:t>outer</w:t></w:r><w:r><w:txbxContent><w:p><w:r><w:t>inner</w:t></w:r></w:p></w:txbxContent></w:r></w:p>"#;
        let mut seen = Vec::new();
        let out = rewrite(xml, WORD, |slots| {
            seen.push(slots.concat());
            for s in slots.iter_mut() {
                *s = s.to_uppercase();
            }
            Ok(())
        });
        assert_eq!(seen, ["inner", "outer"]);
        assert!(out.contains(">INNER<"));
        assert!(out.contains(">OUTER<"));
    }

    #[test]
    fn text_outside_paragraphs_is_untouched() {
        let xml = r#"<?xml version="1.0"?><root a="1"><x>keep &amp; me</x></root>"#;
        let out = rewrite(xml, WORD, |_| panic!("no paragraphs here"));
        assert_eq!(out, xml);
    }

    #[test]
    fn collects_paragraph_texts() {
        let xml = r#"<a:p><a:r><a:t>Uno</a:t></a:r><a:r><a:t> dos</a:t></a:r></a:p><a:p/><a:p><a:r><a:t>tres</a:t></a:r></a:p>"#;
        assert_eq!(paragraph_texts(xml.as_bytes(), DRAWING).unwrap(), ["Uno dos", "tres"]);
    }
}
