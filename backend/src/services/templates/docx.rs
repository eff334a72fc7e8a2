//! Merge-field rendering for Word templates.

use super::package::Package;
use super::runs::{self, WORD};
use crate::error::TemplateError;
use crate::services::merge::context::PlaceholderContext;
use once_cell::sync::Lazy;
use regex::Regex;

static MERGE_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-zÑñ_][\wÑñ]*)\s*\}\}").expect("merge field pattern is valid")
});

/// Parts that may carry merge fields.
pub fn is_text_part(name: &str) -> bool {
    let xml_in = |prefix: &str| name.starts_with(prefix) && name.ends_with(".xml");
    name == "word/document.xml" || xml_in("word/header") || xml_in("word/footer")
}

/// Resolves every `{{ KEY }}` in the document body, headers and footers.
///
/// Fails on the first field the context does not know; nothing is written in that case.
pub fn render(package: &mut Package, ctx: &PlaceholderContext) -> Result<(), TemplateError> {
    if package.part("word/document.xml").is_none() {
        return Err(TemplateError::MissingPart("word/document.xml".to_string()));
    }

    let names: Vec<String> = package
        .part_names()
        .filter(|n| is_text_part(n))
        .map(str::to_string)
        .collect();

    for name in names {
        let Some(xml) = package.part(&name) else {
            continue;
        };
        let rewritten = runs::rewrite_paragraphs(xml, WORD, |slots| merge_paragraph(slots, ctx))?;
        package.set_part(&name, rewritten);
    }
    Ok(())
}

/// Replaces merge fields across the runs of one paragraph. A field split over several
/// runs is written entirely into the run where it starts.
fn merge_paragraph(slots: &mut [String], ctx: &PlaceholderContext) -> Result<(), TemplateError> {
    let joined = slots.concat();
    if !joined.contains("{{") {
        return Ok(());
    }

    let mut bounds = Vec::with_capacity(slots.len());
    let mut offset = 0;
    for slot in slots.iter() {
        bounds.push((offset, offset + slot.len()));
        offset += slot.len();
    }

    let matches: Vec<_> = MERGE_FIELD.captures_iter(&joined).collect();
    for caps in matches.iter().rev() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let value = lookup(ctx, name.as_str())?;

        let (first, first_off) = locate(&bounds, whole.start(), false);
        let (last, last_off) = locate(&bounds, whole.end(), true);

        if first == last {
            slots[first].replace_range(first_off..last_off, value);
        } else {
            slots[first].replace_range(first_off.., value);
            for slot in &mut slots[first + 1..last] {
                slot.clear();
            }
            slots[last].replace_range(..last_off, "");
        }
    }
    Ok(())
}

fn lookup<'a>(ctx: &'a PlaceholderContext, name: &str) -> Result<&'a str, TemplateError> {
    ctx.get_tag(name)
        .or_else(|| ctx.get_tag(&name.to_uppercase()))
        .ok_or_else(|| TemplateError::UnknownField(name.to_string()))
}

/// Maps a byte offset of the joined paragraph text to `(slot, offset within slot)`,
/// using the slot bounds taken before any edit.
///
/// Start offsets land in the slot that contains the byte; end offsets in the slot that
/// contains the byte just before.
fn locate(bounds: &[(usize, usize)], pos: usize, is_end: bool) -> (usize, usize) {
    for (i, &(begin, end)) in bounds.iter().enumerate() {
        let inside = if is_end {
            pos > begin && pos <= end
        } else {
            pos >= begin && pos < end
        };
        if inside {
            return (i, pos - begin);
        }
    }
    let last = bounds.len().saturating_sub(1);
    (last, bounds.get(last).map_or(0, |(b, e)| e - b))
}
