//! Redraws the rendered document's text boxes on landscape A4 pages.

use super::pdf::{configure_document, render_to, FontSource, PAGE_HEIGHT_MM, PAGE_WIDTH_MM};
use super::ConversionStrategy;
use crate::error::ConversionError;
use crate::services::templates::layout::{self, Layout, Page, Rect};
use genpdf::elements::PageBreak;
use genpdf::render::Area;
use genpdf::style::{Color, Style};
use genpdf::{Context, Element, Mm, Position, RenderResult};
use std::path::Path;

const EMU_PER_MM: f64 = 36_000.0;
/// 4:3 slide, used when the deck does not declare its size.
const DEFAULT_SLIDE_EMU: (i64, i64) = (9_144_000, 6_858_000);
const FILL: f64 = 0.9;

const DARK_BLUE: Color = Color::Rgb(0, 51, 102);
const NAVY: Color = Color::Rgb(0, 0, 128);

const OUTER_INSET: f64 = 6.0;
const INNER_INSET: f64 = 9.0;
const FRAME_STEP: f64 = 0.3;

/// How a text box is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Title,
    Subtitle,
    Signature,
    Body,
}

impl Role {
    /// Boxes arrive sorted top to bottom; the first one is the title.
    pub fn classify(index: usize, text: &str) -> Self {
        let upper = text.to_uppercase();
        if index == 0 || upper.contains("INSTITUTO") || upper.contains("CAMPUSLANDS") {
            Role::Title
        } else if upper.contains("HACE CONSTAR") {
            Role::Subtitle
        } else if upper.contains("RECTOR") || upper.contains("COORDINADOR") {
            Role::Signature
        } else {
            Role::Body
        }
    }

    fn style(self) -> Style {
        match self {
            Role::Title => Style::new().bold().with_font_size(16).with_color(DARK_BLUE),
            Role::Subtitle => Style::new().bold().with_font_size(14),
            Role::Signature => Style::new().bold().with_font_size(10),
            Role::Body => Style::new().with_font_size(11),
        }
    }
}

/// Whether a box is centered on its frame instead of left-aligned.
pub fn is_centered(index: usize, role: Role) -> bool {
    index < 3 || role == Role::Title
}

/// A text box placed on the page, in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub text: String,
    pub role: Role,
    pub centered: bool,
}

/// Maps slide coordinates onto the page: uniformly scaled to 90% of the page and
/// centered.
#[derive(Debug, Clone, Copy)]
pub struct PageTransform {
    scale: f64,
    offset_x: f64,
    offset_y: f64,
}

impl PageTransform {
    pub fn for_slide(size_emu: (i64, i64)) -> Self {
        let slide_w = size_emu.0 as f64 / EMU_PER_MM;
        let slide_h = size_emu.1 as f64 / EMU_PER_MM;
        let scale = (PAGE_WIDTH_MM / slide_w).min(PAGE_HEIGHT_MM / slide_h) * FILL;
        Self {
            scale,
            offset_x: (PAGE_WIDTH_MM - slide_w * scale) / 2.0,
            offset_y: (PAGE_HEIGHT_MM - slide_h * scale) / 2.0,
        }
    }

    pub fn apply(&self, rect: Rect) -> (f64, f64, f64) {
        (
            self.offset_x + rect.x as f64 / EMU_PER_MM * self.scale,
            self.offset_y + rect.y as f64 / EMU_PER_MM * self.scale,
            rect.cx as f64 / EMU_PER_MM * self.scale,
        )
    }
}

/// Positions every box of `page`. Boxes without geometry are stacked down the page.
pub fn place_boxes(page: &Page, transform: PageTransform) -> Vec<PlacedBox> {
    let margin = PAGE_WIDTH_MM * (1.0 - FILL) / 2.0 + 15.0;
    let mut flow_y = 30.0;

    let mut placed: Vec<(f64, f64, f64, &str)> = page
        .boxes
        .iter()
        .map(|b| match b.frame {
            Some(rect) => {
                let (x, y, w) = transform.apply(rect);
                (x, y, w, b.text.as_str())
            }
            None => {
                let y = flow_y;
                flow_y += 9.0 * b.text.lines().count().max(1) as f64 + 4.0;
                (margin, y, PAGE_WIDTH_MM - 2.0 * margin, b.text.as_str())
            }
        })
        .collect();
    placed.sort_by(|a, b| a.1.total_cmp(&b.1));

    placed
        .into_iter()
        .enumerate()
        .map(|(i, (x, y, width, text))| {
            let role = Role::classify(i, text);
            PlacedBox {
                x,
                y,
                width,
                text: text.to_string(),
                role,
                centered: is_centered(i, role),
            }
        })
        .collect()
}

/// One page of absolutely positioned text.
struct Canvas {
    boxes: Vec<PlacedBox>,
    border: bool,
}

impl Canvas {
    fn draw_border(area: &Area<'_>) {
        let frame = |inset: f64, color: Color| {
            let (l, t) = (inset, inset);
            let (r, b) = (PAGE_WIDTH_MM - inset, PAGE_HEIGHT_MM - inset);
            area.draw_line(
                vec![
                    Position::new(l, t),
                    Position::new(r, t),
                    Position::new(r, b),
                    Position::new(l, b),
                    Position::new(l, t),
                ],
                Style::new().with_color(color),
            );
        };
        // Lines have a fixed width; the heavy outer frame is three nested rectangles.
        for step in 0..3 {
            frame(OUTER_INSET + step as f64 * FRAME_STEP, DARK_BLUE);
        }
        frame(INNER_INSET, NAVY);
    }
}

impl Element for Canvas {
    fn render(
        &mut self,
        context: &Context,
        area: Area<'_>,
        _style: Style,
    ) -> Result<RenderResult, genpdf::error::Error> {
        if self.border {
            Self::draw_border(&area);
        }

        for placed in &self.boxes {
            let style = placed.role.style();
            let line_height = style.line_height(&context.font_cache);
            let max_width = Mm::from(placed.width.max(20.0));
            let mut y = Mm::from(placed.y);

            for raw in placed.text.lines() {
                for line in wrap(raw.trim(), |s| style.str_width(&context.font_cache, s) <= max_width) {
                    let x = if placed.centered {
                        let width = style.str_width(&context.font_cache, &line);
                        Mm::from(placed.x) + (Mm::from(placed.width) - width) / 2.0
                    } else {
                        Mm::from(placed.x)
                    };
                    area.print_str(&context.font_cache, Position::new(x, y), style, &line)?;
                    y = y + line_height;
                }
            }
        }

        Ok(RenderResult {
            size: area.size(),
            has_more: false,
        })
    }
}

/// Greedy word wrap; a single word wider than the line is kept whole.
fn wrap(text: &str, fits: impl Fn(&str) -> bool) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if fits(&candidate) || current.is_empty() {
            current = candidate;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Layout rasterization: text and geometry only, no images or shapes.
pub struct LayoutRaster {
    fonts: FontSource,
}

impl LayoutRaster {
    pub fn new(fonts: FontSource) -> Self {
        Self { fonts }
    }

    fn build(&self, layout: &Layout, output: &Path) -> Result<(), ConversionError> {
        let transform = PageTransform::for_slide(layout.page_size.unwrap_or(DEFAULT_SLIDE_EMU));
        let mut doc = configure_document(&self.fonts, "Certificado", 11)?;

        for (i, page) in layout.pages.iter().enumerate() {
            if i > 0 {
                doc.push(PageBreak::new());
            }
            doc.push(Canvas {
                boxes: place_boxes(page, transform),
                border: i == 0,
            });
        }
        render_to(doc, output)
    }
}

impl ConversionStrategy for LayoutRaster {
    fn name(&self) -> &str {
        "layout-raster"
    }

    fn is_available(&self) -> bool {
        self.fonts.has_candidates()
    }

    fn attempt(&self, input: &Path, output: &Path) -> Result<(), ConversionError> {
        let layout = layout::extract(input)?;
        if layout.is_empty() {
            return Err(ConversionError::Pdf(format!(
                "no text found in {}",
                input.display()
            )));
        }
        self.build(&layout, output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConversionConfig;
    use crate::services::convert::pdf::fixtures::system_fonts;
    use crate::services::convert::tests::Fake;
    use crate::services::convert::Converter;
    use crate::services::templates::layout::TextBox;
    use crate::services::templates::package::tests::package_with;
    use common::model::merge::ConversionOutcome;
    use std::path::PathBuf;

    /// One 4:3 slide with a title, a subtitle, a body line and a signature.
    fn deck(dir: &Path) -> PathBuf {
        let shape = |y: i64, text: &str| {
            format!(
                r#"<p:sp><p:spPr><a:xfrm><a:off x="914400" y="{y}"/><a:ext cx="7315200" cy="457200"/></a:xfrm></p:spPr><p:txBody><a:p><a:r><a:t>{text}</a:t></a:r></a:p></p:txBody></p:sp>"#
            )
        };
        let slide = format!(
            "<p:sld><p:cSld><p:spTree>{}{}{}{}</p:spTree></p:cSld></p:sld>",
            shape(457_200, "INSTITUTO TÉCNICO"),
            shape(1_371_600, "HACE CONSTAR QUE"),
            shape(2_286_000, "Ana Pérez asistió a 40 horas de formación"),
            shape(5_029_200, "Coordinador académico"),
        );
        let path = dir.join("certificado_40_horas_Ana.pptx");
        package_with(&[
            ("ppt/presentation.xml", r#"<p:presentation><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#),
            ("ppt/slides/slide1.xml", slide.as_str()),
        ])
        .save(&path)
        .unwrap();
        path
    }

    #[test]
    fn deck_is_redrawn_into_a_pdf() {
        let Some((_fonts_dir, fonts)) = system_fonts() else {
            eprintln!("no system sans font installed; skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let input = deck(dir.path());
        let output = dir.path().join("certificado_40_horas_Ana.pdf");

        LayoutRaster::new(fonts).attempt(&input, &output).unwrap();

        let bytes = std::fs::read(&output).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() as u64 >= ConversionConfig::default().min_attempt_bytes);
    }

    #[test]
    fn cascade_accepts_the_raster_output_after_the_office_strategies_fail() {
        let Some((_fonts_dir, fonts)) = system_fonts() else {
            eprintln!("no system sans font installed; skipping");
            return;
        };
        let dir = tempfile::tempdir().unwrap();
        let input = deck(dir.path());
        let output = dir.path().join("certificado_40_horas_Ana.pdf");
        let converter = Converter::new(
            vec![
                Box::new(Fake::failing("office-automation")),
                Box::new(Fake::failing("libreoffice-headless")),
                Box::new(LayoutRaster::new(fonts)),
            ],
            ConversionConfig::default().min_attempt_bytes,
        );

        match converter.convert(&input, &output) {
            ConversionOutcome::Success { pdf, strategy } => {
                assert_eq!(strategy, "layout-raster");
                assert_eq!(pdf, output);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn roles_follow_keywords_and_position() {
        assert_eq!(Role::classify(0, "Certificado"), Role::Title);
        assert_eq!(Role::classify(4, "Instituto Técnico"), Role::Title);
        assert_eq!(Role::classify(1, "HACE CONSTAR QUE"), Role::Subtitle);
        assert_eq!(Role::classify(5, "Coordinador académico"), Role::Signature);
        assert_eq!(Role::classify(2, "Ana Pérez"), Role::Body);

        assert!(is_centered(2, Role::Body));
        assert!(!is_centered(3, Role::Body));
        assert!(is_centered(7, Role::Title));
    }

    #[test]
    fn slide_is_scaled_into_ninety_percent_of_the_page_and_centered() {
        let t = PageTransform::for_slide(DEFAULT_SLIDE_EMU);
        // 254 x 190.5 mm slide; height is the binding side.
        let (x, y, w) = t.apply(Rect { x: 0, y: 0, cx: 9_144_000, cy: 6_858_000 });
        assert!((y - PAGE_HEIGHT_MM * 0.05).abs() < 1e-6);
        let drawn_w = w;
        assert!((x * 2.0 + drawn_w - PAGE_WIDTH_MM).abs() < 1e-6);
        assert!(drawn_w < PAGE_WIDTH_MM * FILL + 1e-6);
    }

    #[test]
    fn boxes_are_sorted_by_top_before_classification() {
        let page = Page {
            boxes: vec![
                TextBox {
                    text: "Firma Rector".into(),
                    frame: Some(Rect { x: 0, y: 5_000_000, cx: 1_000_000, cy: 100 }),
                },
                TextBox {
                    text: "Certificado de asistencia".into(),
                    frame: Some(Rect { x: 0, y: 100_000, cx: 1_000_000, cy: 100 }),
                },
            ],
        };
        let placed = place_boxes(&page, PageTransform::for_slide(DEFAULT_SLIDE_EMU));
        assert_eq!(placed[0].text, "Certificado de asistencia");
        assert_eq!(placed[0].role, Role::Title);
        assert_eq!(placed[1].role, Role::Signature);
        assert!(placed[0].y < placed[1].y);
    }

    #[test]
    fn flowing_paragraphs_are_stacked() {
        let page = Page {
            boxes: vec![
                TextBox { text: "Uno".into(), frame: None },
                TextBox { text: "Dos\nTres".into(), frame: None },
                TextBox { text: "Cuatro".into(), frame: None },
            ],
        };
        let placed = place_boxes(&page, PageTransform::for_slide(DEFAULT_SLIDE_EMU));
        assert!(placed.windows(2).all(|w| w[0].y < w[1].y));
        assert!(placed[2].y - placed[1].y > placed[1].y - placed[0].y);
    }

    #[test]
    fn wrap_breaks_on_words() {
        let lines = wrap("uno dos tres cuatro", |s| s.len() <= 8);
        assert_eq!(lines, ["uno dos", "tres", "cuatro"]);
        assert_eq!(wrap("supercalifragilistico", |s| s.len() <= 4), ["supercalifragilistico"]);
        assert!(wrap("   ", |_| true).is_empty());
    }
}
