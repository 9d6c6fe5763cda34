use std::{fmt, ops::Range};

use crate::util::{from_subscript, from_superscript, subscript_digit, superscript};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Style {
    #[default]
    Plain,
    Superscript,
    Subscript,
    Italic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyledChar {
    pub ch: char,
    pub style: Style,
    /// Byte offset of the character in the text it was read from.
    pub origin: usize,
}

/// Formula text as the host supplies it: characters with a per-character
/// style. Digits are always stored as ASCII; whether they are an arity marker
/// or part of a symbol's name is carried by the style.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StyledText {
    chars: Vec<StyledChar>,
    source_len: usize,
}

impl StyledText {
    pub fn plain(text: &str) -> Self {
        Self::with_spans(text, &[])
    }

    /// Build styled text from plain text plus character-indexed style spans.
    /// Later spans win where spans overlap.
    pub fn with_spans(text: &str, spans: &[(Range<usize>, Style)]) -> Self {
        let chars = text
            .char_indices()
            .enumerate()
            .map(|(i, (origin, ch))| {
                let style = spans
                    .iter()
                    .rev()
                    .find(|(range, _)| range.contains(&i))
                    .map(|(_, style)| *style)
                    .unwrap_or_default();
                fold_unicode_digit(StyledChar { ch, style, origin })
            })
            .collect();
        Self {
            chars,
            source_len: text.len(),
        }
    }

    /// Read the lightweight markup used in proof files: `^12` is a
    /// superscript `12`, `_3` a subscript `3`. Unicode superscript and
    /// subscript digits are accepted as well.
    pub fn from_markup(text: &str) -> Self {
        let mut chars = Vec::new();
        let mut iter = text.char_indices().peekable();

        while let Some((origin, ch)) = iter.next() {
            let style = match ch {
                '^' => Some(Style::Superscript),
                '_' => Some(Style::Subscript),
                _ => None,
            };

            match style {
                Some(style) if iter.peek().is_some_and(|(_, c)| c.is_ascii_digit()) => {
                    while let Some(&(origin, d)) = iter.peek()
                        && d.is_ascii_digit()
                    {
                        chars.push(StyledChar { ch: d, style, origin });
                        iter.next();
                    }
                }
                _ => chars.push(fold_unicode_digit(StyledChar {
                    ch,
                    style: Style::Plain,
                    origin,
                })),
            }
        }

        Self {
            chars,
            source_len: text.len(),
        }
    }

    pub fn chars(&self) -> &[StyledChar] {
        &self.chars
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn is_blank(&self) -> bool {
        self.chars.iter().all(|c| c.ch.is_whitespace())
    }

    /// Byte offset in the source text of the character at `pos`. Positions
    /// past the end map to the end of the source.
    pub fn source_offset(&self, pos: usize) -> usize {
        self.chars
            .get(pos)
            .map(|c| c.origin)
            .unwrap_or(self.source_len)
    }
}

fn fold_unicode_digit(c: StyledChar) -> StyledChar {
    if let Some(d) = from_superscript(c.ch) {
        StyledChar {
            ch: d,
            style: Style::Superscript,
            ..c
        }
    } else if let Some(d) = from_subscript(c.ch) {
        StyledChar {
            ch: d,
            style: Style::Subscript,
            ..c
        }
    } else {
        c
    }
}

impl fmt::Display for StyledText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in &self.chars {
            match c.style {
                Style::Superscript if c.ch.is_ascii_digit() => {
                    write!(f, "{}", superscript(c.ch as usize - '0' as usize))?
                }
                Style::Subscript if c.ch.is_ascii_digit() => write!(f, "{}", subscript_digit(c.ch))?,
                _ => write!(f, "{}", c.ch)?,
            }
        }
        Ok(())
    }
}

impl From<&str> for StyledText {
    fn from(text: &str) -> Self {
        Self::from_markup(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn styles(text: &StyledText) -> Vec<(char, Style)> {
        text.chars().iter().map(|c| (c.ch, c.style)).collect()
    }

    #[test]
    fn markup_styles_digits() {
        let text = StyledText::from_markup("h^12a_3");
        assert_eq!(
            styles(&text),
            vec![
                ('h', Style::Plain),
                ('1', Style::Superscript),
                ('2', Style::Superscript),
                ('a', Style::Plain),
                ('3', Style::Subscript),
            ]
        );
        assert_eq!(text.to_string(), "h¹²a₃");
    }

    #[test]
    fn unicode_digits_are_folded() {
        let text = StyledText::from_markup("h¹a₂");
        assert_eq!(
            styles(&text),
            vec![
                ('h', Style::Plain),
                ('1', Style::Superscript),
                ('a', Style::Plain),
                ('2', Style::Subscript),
            ]
        );
    }

    #[test]
    fn lone_markers_stay_literal() {
        let text = StyledText::from_markup("A_ ^");
        assert_eq!(text.to_string(), "A_ ^");
    }

    #[test]
    fn spans_style_characters() {
        let text = StyledText::with_spans("h1a", &[(1..2, Style::Superscript)]);
        assert_eq!(text.to_string(), "h¹a");
        assert_eq!(text.source_offset(2), 2);
        assert_eq!(text.source_offset(9), 3);
    }

    #[test]
    fn blank_text() {
        assert!(StyledText::plain("  \t").is_blank());
        assert!(!StyledText::plain(" A ").is_blank());
    }
}
