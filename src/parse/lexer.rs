use aho_corasick::{Anchored, Input};

use crate::{
    lang::{GlyphRole, Language},
    parse::styled::{Style, StyledText},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Glyph(GlyphRole),
    Letter(char),
    Digit(char, Style),
    Unknown(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Index of the token's first character in the styled text.
    pub pos: usize,
    /// Number of styled characters the token covers.
    pub len: usize,
}

/// Split styled text into tokens. Glyphs are found by longest match against
/// the language's glyph automaton; anything else is a single character.
/// Whitespace separates tokens and is dropped.
pub fn lex(text: &StyledText, lang: &Language) -> Vec<Token> {
    let chars = text.chars();

    // The automaton runs over a flat string; remember where each character
    // starts so byte offsets can be mapped back to character positions.
    let mut flat = String::new();
    let mut starts = Vec::with_capacity(chars.len() + 1);
    for c in chars {
        starts.push(flat.len());
        flat.push(c.ch);
    }
    starts.push(flat.len());

    let mut tokens = Vec::new();
    let mut pos = 0;
    while pos < chars.len() {
        let c = chars[pos];
        if c.ch.is_whitespace() {
            pos += 1;
            continue;
        }

        if c.style == Style::Plain || c.style == Style::Italic {
            let input = Input::new(&flat)
                .span(starts[pos]..flat.len())
                .anchored(Anchored::Yes);
            if let Some(m) = lang.glyph_matcher().find(input) {
                let end = starts.partition_point(|&s| s < m.end());
                tokens.push(Token {
                    kind: TokenKind::Glyph(lang.glyph_role(m.pattern().as_usize())),
                    pos,
                    len: end - pos,
                });
                pos = end;
                continue;
            }
        }

        let kind = if c.ch.is_ascii_digit() {
            TokenKind::Digit(c.ch, c.style)
        } else if c.ch.is_alphabetic() {
            TokenKind::Letter(c.ch)
        } else {
            TokenKind::Unknown(c.ch)
        };
        tokens.push(Token { kind, pos, len: 1 });
        pos += 1;
    }

    tokens
}
