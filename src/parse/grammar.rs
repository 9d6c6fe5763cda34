//! Recursive descent over the token stream.
//!
//! ```text
//! list    := expr ((comma | divider) expr)*
//! expr    := formula | formula binary formula      (outer brackets optional)
//! formula := unary formula | quantifier var formula | open formula binary formula close
//!          | contradiction | letter subscripts (superscripts? args)? | term identity term
//! term    := letter subscripts | letter subscripts superscripts args
//! args    := term* | open term (comma term)* close
//! ```

use ustr::Ustr;

use crate::{
    lang::{GlyphRole, Language},
    parse::{
        lexer::TokenKind,
        stream::{ParseError, ParseFailure, ParseResult, Stream},
        styled::Style,
    },
    semant::expr::{Expr, ExprKind},
    util::subscript_digit,
};

pub fn expr_list(s: &mut Stream, lang: &Language) -> ParseResult<Vec<Expr>> {
    let mut exprs = vec![expr(s, lang)?];
    while let Some(TokenKind::Glyph(GlyphRole::Comma | GlyphRole::Divider)) = s.peek() {
        s.pop();
        exprs.push(s.commit(|s| expr(s, lang))?);
    }
    s.commit(|s| s.expect_eof())?;
    Ok(exprs)
}

fn expr(s: &mut Stream, lang: &Language) -> ParseResult<Expr> {
    let first = formula(s, lang)?;

    if lang.outer_brackets_optional()
        && let Some(symbol) = peek_binary(s, lang)
    {
        s.pop();
        let second = s.commit(|s| formula(s, lang))?;
        return Ok(Expr::binary(symbol, first, second));
    }

    Ok(first)
}

fn peek_binary(s: &Stream, lang: &Language) -> Option<Ustr> {
    match s.peek() {
        Some(TokenKind::Glyph(GlyphRole::Connective(i))) if lang.connective(i).arity() == 2 => {
            Some(lang.connective(i).glyph())
        }
        _ => None,
    }
}

fn formula(s: &mut Stream, lang: &Language) -> ParseResult<Expr> {
    let Some(token) = s.peek() else {
        return s.expected("a formula");
    };

    match token {
        TokenKind::Glyph(GlyphRole::Connective(i)) if lang.connective(i).arity() == 1 => {
            s.pop();
            let child = s.commit(|s| formula(s, lang))?;
            Ok(Expr::unary(lang.connective(i).glyph(), child))
        }
        TokenKind::Glyph(GlyphRole::Quantifier(i)) => {
            s.pop();
            let var = s.commit(|s| variable(s, lang))?;
            let body = s.commit(|s| formula(s, lang))?;
            Ok(Expr::quantifier(lang.quantifier(i).glyph(), var, body))
        }
        TokenKind::Glyph(GlyphRole::Open(b)) => {
            s.pop();
            s.commit(|s| bracketed(s, lang, b))
        }
        TokenKind::Glyph(GlyphRole::Contradiction) => {
            s.pop();
            let symbol = lang.contradiction().unwrap_or_default();
            Ok(Expr::leaf(ExprKind::Atom, symbol))
        }
        TokenKind::Glyph(GlyphRole::Close(_)) => Err(ParseError::Commit(ParseFailure::Unbalanced {
            detail: "unmatched closing bracket",
            position: s.position(),
        })),
        TokenKind::Glyph(_) => s.expected("a formula"),
        TokenKind::Letter(c) => letter_formula(s, lang, c),
        TokenKind::Digit(d, _) | TokenKind::Unknown(d) => unknown(s, d),
    }
}

fn bracketed(s: &mut Stream, lang: &Language, open: usize) -> ParseResult<Expr> {
    let left = formula(s, lang)?;
    let Some(symbol) = peek_binary(s, lang) else {
        return s.expected("a binary connective");
    };
    s.pop();
    let right = formula(s, lang)?;
    close(s, open)?;
    Ok(Expr::binary(symbol, left, right))
}

fn close(s: &mut Stream, open: usize) -> ParseResult<()> {
    match s.peek() {
        Some(TokenKind::Glyph(GlyphRole::Close(c))) if c == open => {
            s.pop();
            Ok(())
        }
        Some(TokenKind::Glyph(GlyphRole::Close(_))) => Err(ParseError::Commit(ParseFailure::Unbalanced {
            detail: "mismatched closing bracket",
            position: s.position(),
        })),
        None => Err(ParseError::Commit(ParseFailure::Unbalanced {
            detail: "missing closing bracket",
            position: s.position(),
        })),
        Some(_) => s.expected("a closing bracket"),
    }
}

fn letter_formula(s: &mut Stream, lang: &Language, c: char) -> ParseResult<Expr> {
    let class = lang.letter_class(c);

    match class.schema {
        Some(ExprKind::SchemaSentence) => {
            let symbol = s.commit(|s| symbol(s))?;
            return Ok(Expr::leaf(ExprKind::SchemaSentence, symbol));
        }
        Some(ExprKind::SchemaRelation) => {
            return s.commit(|s| application(s, lang, ExprKind::SchemaRelation));
        }
        _ => {}
    }

    if class.relation {
        s.commit(|s| application(s, lang, ExprKind::Relation))
    } else if class.sentence {
        let symbol = s.commit(|s| symbol(s))?;
        Ok(Expr::leaf(ExprKind::Atom, symbol))
    } else if class.starts_term() {
        s.commit(|s| identity(s, lang))
    } else {
        unknown(s, c)
    }
}

fn identity(s: &mut Stream, lang: &Language) -> ParseResult<Expr> {
    let left = term(s, lang)?;
    s.expect_glyph(GlyphRole::Identity, "an identity sign")?;
    let right = term(s, lang)?;
    let symbol = lang.identity().unwrap_or_default();
    Ok(Expr::relation(symbol, vec![left, right]))
}

/// A relation or function letter with its optional arity marker and
/// arguments. Relations may omit the marker; without arguments a relation
/// letter is a plain sentence letter.
fn application(s: &mut Stream, lang: &Language, kind: ExprKind) -> ParseResult<Expr> {
    let position = s.position();
    let symbol = symbol(s)?;
    let arity = superscript_number(s);
    let args = arguments(s, lang, arity)?;

    if let Some(expected) = arity
        && expected != args.len()
    {
        return Err(ParseError::Commit(ParseFailure::WrongArity {
            symbol,
            expected,
            found: args.len(),
            position,
        }));
    }

    if args.is_empty() && kind == ExprKind::Relation {
        return Ok(Expr::leaf(ExprKind::Atom, symbol));
    }
    Ok(Expr::new(kind, symbol, args))
}

fn arguments(s: &mut Stream, lang: &Language, arity: Option<usize>) -> ParseResult<Vec<Expr>> {
    if let Some(TokenKind::Glyph(GlyphRole::Open(b))) = s.peek()
        && let Ok(args) = s.fallible(|s| bracketed_terms(s, lang, b))
    {
        return Ok(args);
    }

    // Juxtaposed terms; the caller reports a count that disagrees with the
    // arity marker.
    let mut args = Vec::new();
    while arity.is_none_or(|n| args.len() < n)
        && let Some(TokenKind::Letter(c)) = s.peek()
        && lang.letter_class(c).starts_term()
    {
        args.push(term(s, lang)?);
    }
    Ok(args)
}

fn bracketed_terms(s: &mut Stream, lang: &Language, open: usize) -> ParseResult<Vec<Expr>> {
    s.pop();
    let mut args = vec![term(s, lang)?];
    while s.peek() == Some(TokenKind::Glyph(GlyphRole::Comma)) {
        s.pop();
        args.push(term(s, lang)?);
    }
    close(s, open)?;
    Ok(args)
}

fn term(s: &mut Stream, lang: &Language) -> ParseResult<Expr> {
    let Some(TokenKind::Letter(c)) = s.peek() else {
        return s.expected("a term");
    };
    let class = lang.letter_class(c);

    match class.schema {
        Some(kind @ (ExprKind::SchemaTerm | ExprKind::SchemaVariable)) => {
            return Ok(Expr::leaf(kind, symbol(s)?));
        }
        Some(ExprKind::SchemaFunction) => return function(s, lang, ExprKind::SchemaFunction),
        _ => {}
    }

    if class.function && has_arity_marker(s) {
        function(s, lang, ExprKind::Function)
    } else if class.variable {
        Ok(Expr::leaf(ExprKind::Variable, symbol(s)?))
    } else if class.constant {
        Ok(Expr::leaf(ExprKind::Constant, symbol(s)?))
    } else {
        s.expected("a term")
    }
}

fn function(s: &mut Stream, lang: &Language, kind: ExprKind) -> ParseResult<Expr> {
    let position = s.position();
    let symbol = symbol(s)?;
    let Some(arity) = superscript_number(s).filter(|&n| n > 0) else {
        return Err(ParseError::Commit(ParseFailure::Expected {
            expected: "a superscript arity",
            position: s.position(),
        }));
    };
    let args = arguments(s, lang, Some(arity))?;
    if args.len() != arity {
        return Err(ParseError::Commit(ParseFailure::WrongArity {
            symbol,
            expected: arity,
            found: args.len(),
            position,
        }));
    }
    Ok(Expr::new(kind, symbol, args))
}

fn variable(s: &mut Stream, lang: &Language) -> ParseResult<Expr> {
    if let Some(TokenKind::Letter(c)) = s.peek() {
        let class = lang.letter_class(c);
        if class.schema == Some(ExprKind::SchemaVariable) {
            return Ok(Expr::leaf(ExprKind::SchemaVariable, symbol(s)?));
        }
        if class.variable {
            return Ok(Expr::leaf(ExprKind::Variable, symbol(s)?));
        }
    }
    s.expected("a variable")
}

/// Whether the letter under the cursor is followed by superscript digits,
/// possibly after a run of subscripts.
fn has_arity_marker(s: &Stream) -> bool {
    let mut n = 1;
    while let Some(TokenKind::Digit(_, Style::Subscript)) = s.peek_nth(n) {
        n += 1;
    }
    matches!(s.peek_nth(n), Some(TokenKind::Digit(_, Style::Superscript)))
}

/// A letter and its subscript digits, interned as one symbol (`A₁`).
fn symbol(s: &mut Stream) -> ParseResult<Ustr> {
    let Some(TokenKind::Letter(c)) = s.pop() else {
        return s.expected("a letter");
    };
    let mut name = String::from(c);
    while let Some(TokenKind::Digit(d, Style::Subscript)) = s.peek() {
        s.pop();
        name.push(subscript_digit(d));
    }
    Ok(Ustr::from(&name))
}

fn superscript_number(s: &mut Stream) -> Option<usize> {
    let mut digits = String::new();
    while let Some(TokenKind::Digit(d, Style::Superscript)) = s.peek() {
        s.pop();
        digits.push(d);
    }
    digits.parse().ok()
}

fn unknown<T>(s: &Stream, c: char) -> ParseResult<T> {
    Err(ParseError::Commit(ParseFailure::UnknownSymbol {
        symbol: c.to_string(),
        position: s.position(),
    }))
}
