//! Text and geometry read back from a rendered document, for redrawing without an
//! office suite.

use super::package::Package;
use super::pptx::slide_parts;
use super::runs::{self, WORD};
use super::TemplateKind;
use crate::error::TemplateError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;

/// Position and size in EMU (914400 per inch).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextBox {
    /// Paragraphs joined with `\n`.
    pub text: String,
    /// `None` for flowing document text.
    pub frame: Option<Rect>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub boxes: Vec<TextBox>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    /// Slide size in EMU; `None` for word-processing documents.
    pub page_size: Option<(i64, i64)>,
    pub pages: Vec<Page>,
}

impl Layout {
    /// Every non-empty line of text in reading order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages
            .iter()
            .flat_map(|p| p.boxes.iter())
            .flat_map(|b| b.text.lines())
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        self.lines().next().is_none()
    }
}

pub fn extract(path: &Path) -> Result<Layout, TemplateError> {
    let kind = TemplateKind::from_path(path).ok_or_else(|| TemplateError::UnsupportedFormat {
        path: path.to_path_buf(),
    })?;
    let package = Package::open(path)?;
    match kind {
        TemplateKind::Document => document_layout(&package),
        TemplateKind::Presentation => presentation_layout(&package),
    }
}

pub fn document_layout(package: &Package) -> Result<Layout, TemplateError> {
    let xml = package
        .part("word/document.xml")
        .ok_or_else(|| TemplateError::MissingPart("word/document.xml".to_string()))?;
    let boxes = runs::paragraph_texts(xml, WORD)?
        .into_iter()
        .filter(|t| !t.trim().is_empty())
        .map(|text| TextBox { text, frame: None })
        .collect();
    Ok(Layout {
        page_size: None,
        pages: vec![Page { boxes }],
    })
}

pub fn presentation_layout(package: &Package) -> Result<Layout, TemplateError> {
    let presentation = package
        .part("ppt/presentation.xml")
        .ok_or_else(|| TemplateError::MissingPart("ppt/presentation.xml".to_string()))?;
    let page_size = slide_size(presentation)?;

    let mut pages = Vec::new();
    for name in slide_parts(package) {
        if let Some(xml) = package.part(&name) {
            pages.push(slide_boxes(xml)?);
        }
    }
    Ok(Layout { page_size, pages })
}

fn int_attr(e: &BytesStart, name: &[u8]) -> Option<i64> {
    e.attributes()
        .flatten()
        .find(|a| a.key.as_ref() == name)
        .and_then(|a| std::str::from_utf8(&a.value).ok()?.trim().parse().ok())
}

fn slide_size(xml: &[u8]) -> Result<Option<(i64, i64)>, TemplateError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if e.name().as_ref() == b"p:sldSz" => {
                return Ok(int_attr(&e, b"cx").zip(int_attr(&e, b"cy")));
            }
            Event::Eof => return Ok(None),
            _ => {}
        }
        buf.clear();
    }
}

#[derive(Default)]
struct ShapeState {
    off: Option<(i64, i64)>,
    ext: Option<(i64, i64)>,
    paragraphs: Vec<String>,
    current: Option<String>,
    in_text: bool,
}

fn slide_boxes(xml: &[u8]) -> Result<Page, TemplateError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut shape: Option<ShapeState> = None;
    let mut boxes = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:sp" => shape = Some(ShapeState::default()),
                b"a:p" => {
                    if let Some(s) = shape.as_mut() {
                        s.current = Some(String::new());
                    }
                }
                b"a:t" => {
                    if let Some(s) = shape.as_mut() {
                        s.in_text = true;
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(s) = shape.as_mut() {
                    match e.name().as_ref() {
                        b"a:off" if s.off.is_none() => {
                            s.off = int_attr(&e, b"x").zip(int_attr(&e, b"y"));
                        }
                        b"a:ext" if s.ext.is_none() => {
                            s.ext = int_attr(&e, b"cx").zip(int_attr(&e, b"cy"));
                        }
                        b"a:br" => {
                            if let Some(p) = s.current.as_mut() {
                                p.push('\n');
                            }
                        }
                        _ => {}
                    }
                }
            }
            Event::Text(t) => {
                if let Some(s) = shape.as_mut().filter(|s| s.in_text) {
                    let text = t.unescape()?;
                    if let Some(p) = s.current.as_mut() {
                        p.push_str(&text);
                    }
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"a:t" => {
                    if let Some(s) = shape.as_mut() {
                        s.in_text = false;
                    }
                }
                b"a:p" => {
                    if let Some(s) = shape.as_mut() {
                        if let Some(p) = s.current.take() {
                            s.paragraphs.push(p);
                        }
                    }
                }
                b"p:sp" => {
                    if let Some(s) = shape.take() {
                        let text = s.paragraphs.join("\n").trim().to_string();
                        if !text.is_empty() {
                            let frame = s.off.zip(s.ext).map(|((x, y), (cx, cy))| Rect { x, y, cx, cy });
                            boxes.push(TextBox { text, frame });
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }
    Ok(Page { boxes })
}
