use thiserror::Error;
use ustr::Ustr;

use crate::{
    lang::GlyphRole,
    parse::lexer::{Token, TokenKind},
};

/// Why a formula could not be read. Positions are character indices into
/// the styled text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseFailure {
    #[error("the formula is empty")]
    Empty,
    #[error("unknown symbol `{symbol}`")]
    UnknownSymbol { symbol: String, position: usize },
    #[error("expected {expected}")]
    Expected {
        expected: &'static str,
        position: usize,
    },
    #[error("{detail}")]
    Unbalanced {
        detail: &'static str,
        position: usize,
    },
    #[error("`{symbol}` takes {expected} argument(s) but was given {found}")]
    WrongArity {
        symbol: Ustr,
        expected: usize,
        found: usize,
        position: usize,
    },
    #[error("unknown language `{0}`")]
    UnknownLanguage(Ustr),
}

impl ParseFailure {
    pub fn position(&self) -> Option<usize> {
        match self {
            ParseFailure::UnknownSymbol { position, .. }
            | ParseFailure::Expected { position, .. }
            | ParseFailure::Unbalanced { position, .. }
            | ParseFailure::WrongArity { position, .. } => Some(*position),
            ParseFailure::Empty | ParseFailure::UnknownLanguage(_) => None,
        }
    }
}

#[derive(Debug)]
pub enum ParseError {
    /// Another alternative may still succeed.
    Backtrack(ParseFailure),
    /// Input was consumed past the point of no return.
    Commit(ParseFailure),
}

impl ParseError {
    pub fn into_failure(self) -> ParseFailure {
        match self {
            ParseError::Backtrack(f) | ParseError::Commit(f) => f,
        }
    }
}

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Debug)]
pub struct Stream<'a> {
    tokens: &'a [Token],
    pos: usize,
    end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Checkpoint(usize);

impl<'a> Stream<'a> {
    /// `end` is the character position reported for errors at end of input.
    pub fn new(tokens: &'a [Token], end: usize) -> Self {
        Self {
            tokens,
            pos: 0,
            end,
        }
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.pos)
    }

    pub fn rewind(&mut self, to: Checkpoint) {
        self.pos = to.0;
    }

    pub fn fallible<F, T>(&mut self, mut f: F) -> ParseResult<T>
    where
        F: FnMut(&mut Self) -> ParseResult<T>,
    {
        let check = self.checkpoint();
        let res = f(self);

        if res.is_err() {
            self.rewind(check);
        }

        res
    }

    pub fn commit<F, T>(&mut self, mut f: F) -> ParseResult<T>
    where
        F: FnMut(&mut Self) -> ParseResult<T>,
    {
        f(self).map_err(|e| ParseError::Commit(e.into_failure()))
    }

    pub fn peek(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    pub fn peek_nth(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    pub fn pop(&mut self) -> Option<TokenKind> {
        let kind = self.peek()?;
        self.pos += 1;
        Some(kind)
    }

    /// Character position of the next token.
    pub fn position(&self) -> usize {
        self.tokens.get(self.pos).map(|t| t.pos).unwrap_or(self.end)
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Fail at the next token. A character outside the language is reported
    /// as such rather than as a missing construct.
    pub fn expected<T>(&self, expected: &'static str) -> ParseResult<T> {
        let position = self.position();
        let failure = match self.peek() {
            Some(TokenKind::Unknown(c)) => ParseFailure::UnknownSymbol {
                symbol: c.to_string(),
                position,
            },
            _ => ParseFailure::Expected { expected, position },
        };
        Err(ParseError::Backtrack(failure))
    }

    pub fn expect_glyph(&mut self, role: GlyphRole, expected: &'static str) -> ParseResult<()> {
        if self.peek() == Some(TokenKind::Glyph(role)) {
            self.pop();
            Ok(())
        } else {
            self.expected(expected)
        }
    }

    pub fn expect_eof(&self) -> ParseResult<()> {
        match self.peek() {
            None => Ok(()),
            Some(TokenKind::Glyph(GlyphRole::Close(_))) => {
                Err(ParseError::Commit(ParseFailure::Unbalanced {
                    detail: "unmatched closing bracket",
                    position: self.position(),
                }))
            }
            Some(_) => self.expected("the end of the formula"),
        }
    }
}
