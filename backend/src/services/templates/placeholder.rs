//! Literal token replacement for presentation templates.

use crate::services::merge::context::PlaceholderContext;

#[derive(Debug, Clone)]
struct Token {
    pattern: String,
    value: String,
    /// Only match when not glued to a letter, digit or `_` on either side.
    bounded: bool,
}

/// A set of literal tokens replaced in one left-to-right pass.
///
/// At every position the longest matching token wins, and replaced text is never
/// scanned again, so a value containing another token is emitted as-is.
#[derive(Debug, Clone, Default)]
pub struct TokenSet {
    tokens: Vec<Token>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a token. `bounded` tokens only match as whole words.
    pub fn push(&mut self, pattern: impl Into<String>, value: impl Into<String>, bounded: bool) {
        let pattern = pattern.into();
        if pattern.is_empty() {
            return;
        }
        self.tokens.push(Token {
            pattern,
            value: value.into(),
            bounded,
        });
        self.tokens
            .sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
    }

    /// The four spellings slides use for every key: `{{KEY}}`, `{{key}}`, `KEY`, `key`.
    pub fn for_presentation(ctx: &PlaceholderContext) -> Self {
        let mut set = Self::new();
        for (key, value) in ctx.iter() {
            let upper = key.tag().to_string();
            let lower = upper.to_lowercase();
            set.push(format!("{{{{{upper}}}}}"), value, false);
            set.push(format!("{{{{{lower}}}}}"), value, false);
            set.push(upper, value, true);
            set.push(lower, value, true);
        }
        set
    }

    /// Returns `None` when nothing matched.
    pub fn replace(&self, text: &str) -> Option<String> {
        let mut out = String::with_capacity(text.len());
        let mut changed = false;
        let mut i = 0;

        while i < text.len() {
            let rest = &text[i..];
            let hit = self.tokens.iter().find(|t| {
                rest.starts_with(t.pattern.as_str())
                    && (!t.bounded || on_word_boundary(text, i, i + t.pattern.len()))
            });
            match hit {
                Some(token) => {
                    out.push_str(&token.value);
                    i += token.pattern.len();
                    changed = true;
                }
                None => {
                    let Some(ch) = rest.chars().next() else { break };
                    out.push(ch);
                    i += ch.len_utf8();
                }
            }
        }

        changed.then_some(out)
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn on_word_boundary(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_word_char) && !after.is_some_and(is_word_char)
}
