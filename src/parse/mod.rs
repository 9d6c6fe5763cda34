mod grammar;
mod lexer;
mod stream;
mod styled;

pub use stream::ParseFailure;
pub use styled::StyledText;

use crate::{lang::Language, semant::expr::Expr};

/// Parse every formula in `text`. Formulas may be separated by the
/// language's comma or divider glyphs.
pub fn parse(text: &StyledText, lang: &Language) -> Result<Vec<Expr>, ParseFailure> {
    let tokens = lexer::lex(text, lang);
    if tokens.is_empty() {
        return Err(ParseFailure::Empty);
    }

    let mut stream = stream::Stream::new(&tokens, text.len());
    grammar::expr_list(&mut stream, lang).map_err(|e| e.into_failure())
}

/// Parse text holding exactly one formula.
pub fn parse_one(text: &StyledText, lang: &Language) -> Result<Expr, ParseFailure> {
    let mut exprs = parse(text, lang)?;
    if exprs.len() != 1 {
        // Point at the first separator.
        let position = lexer::lex(text, lang)
            .iter()
            .find(|t| {
                matches!(
                    t.kind,
                    lexer::TokenKind::Glyph(
                        crate::lang::GlyphRole::Comma | crate::lang::GlyphRole::Divider
                    )
                )
            })
            .map(|t| t.pos)
            .unwrap_or(0);
        return Err(ParseFailure::Expected {
            expected: "a single formula",
            position,
        });
    }
    Ok(exprs.remove(0))
}

/// Parse markup text (`h^1a`, `A_1`) holding exactly one formula.
pub fn parse_str(text: &str, lang: &Language) -> Result<Expr, ParseFailure> {
    parse_one(&StyledText::from_markup(text), lang)
}
