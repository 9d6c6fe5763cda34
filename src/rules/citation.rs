use std::{fmt, str::FromStr};

use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

use crate::{
    derivation::LineLabel,
    strings::{CONTRADICTION_MARKERS, GOAL_MARKERS, RANGE_DASHES},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Line,
    Range,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitedItem {
    Line(LineLabel),
    Range(LineLabel, LineLabel),
}

impl CitedItem {
    pub fn kind(&self) -> ItemKind {
        match self {
            CitedItem::Line(_) => ItemKind::Line,
            CitedItem::Range(..) => ItemKind::Range,
        }
    }
}

/// How an assumption promises to close its subderivation: by reaching the
/// goal, or by reaching a contradiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitMarker {
    Goal,
    Contradiction,
}

impl ExitMarker {
    pub fn from_char(c: char) -> Option<Self> {
        if GOAL_MARKERS.contains(&c) {
            Some(ExitMarker::Goal)
        } else if CONTRADICTION_MARKERS.contains(&c) {
            Some(ExitMarker::Contradiction)
        } else {
            None
        }
    }
}

impl fmt::Display for ExitMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitMarker::Goal => write!(f, "{}", GOAL_MARKERS[0]),
            ExitMarker::Contradiction => write!(f, "{}", CONTRADICTION_MARKERS[0]),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStrategy {
    pub marker: ExitMarker,
    pub rule: Ustr,
    /// A line the closing rule will cite alongside the subderivation.
    pub line: Option<LineLabel>,
}

/// A parsed justification: `3, 4 →E`, `1–2 →I`, `A (g, →I)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Citation {
    pub items: Vec<CitedItem>,
    pub rule: Ustr,
    pub strategy: Option<ExitStrategy>,
}

impl Citation {
    pub fn shape(&self) -> Vec<ItemKind> {
        self.items.iter().map(|i| i.kind()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CitationError {
    #[error("the justification is empty")]
    Empty,
    #[error("the justification names no rule")]
    MissingRule,
    #[error("`{0}` is not a line number")]
    BadLabel(String),
    #[error("a range needs a line number after the dash")]
    OpenRange,
    #[error("the exit strategy `{0}` should look like `(g, →I)` or `(c, ~I)`")]
    BadStrategy(String),
    #[error("unclosed parenthesis in the justification")]
    Unclosed,
}

impl FromStr for Citation {
    type Err = CitationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(CitationError::Empty);
        }

        let (main, strategy) = match s.find('(') {
            Some(open) => {
                let inner = s[open + 1..]
                    .trim_end()
                    .strip_suffix(')')
                    .ok_or(CitationError::Unclosed)?;
                (&s[..open], Some(parse_strategy(inner)?))
            }
            None => (s, None),
        };

        let (items, rule) = items_and_rule(main)?;
        Ok(Citation {
            items,
            rule,
            strategy,
        })
    }
}

/// The rule named by a justification, read even when its exit strategy is
/// malformed.
pub fn cited_rule(text: &str) -> Option<Ustr> {
    let text = text.trim();
    let main = text.find('(').map_or(text, |open| &text[..open]);
    items_and_rule(main).ok().map(|(_, rule)| rule)
}

fn items_and_rule(main: &str) -> Result<(Vec<CitedItem>, Ustr), CitationError> {
    let mut cursor = Cursor { rest: main };
    let mut items = Vec::new();
    loop {
        cursor.skip_whitespace();
        if !cursor.starts_with_digit() {
            break;
        }
        let from = cursor.label()?;
        cursor.skip_whitespace();
        let before_dash = cursor.rest;
        if cursor.eat(|c| RANGE_DASHES.contains(&c)) {
            // A rule name such as `->E` may start with a dash.
            if cursor.rest.starts_with(|c: char| !c.is_whitespace() && !c.is_ascii_digit() && c != ',') {
                cursor.rest = before_dash;
                break;
            }
            cursor.skip_whitespace();
            if !cursor.starts_with_digit() {
                return Err(CitationError::OpenRange);
            }
            let to = cursor.label()?;
            items.push(CitedItem::Range(from, to));
        } else {
            items.push(CitedItem::Line(from));
        }
        cursor.skip_whitespace();
        cursor.eat(|c| c == ',');
    }

    let rule = cursor.rest.trim();
    if rule.is_empty() {
        return Err(CitationError::MissingRule);
    }
    Ok((items, Ustr::from(rule)))
}

fn parse_strategy(inner: &str) -> Result<ExitStrategy, CitationError> {
    let bad = || CitationError::BadStrategy(inner.trim().to_string());

    let (marker, rest) = inner.split_once(',').ok_or_else(bad)?;
    let mut marker_chars = marker.trim().chars();
    let marker = match (marker_chars.next(), marker_chars.next()) {
        (Some(c), None) => ExitMarker::from_char(c).ok_or_else(bad)?,
        _ => return Err(bad()),
    };

    let mut cursor = Cursor { rest: rest.trim() };
    let line = if cursor.starts_with_digit() {
        Some(cursor.label()?)
    } else {
        None
    };

    let rule = cursor.rest.trim();
    if rule.is_empty() {
        return Err(bad());
    }

    Ok(ExitStrategy {
        marker,
        rule: Ustr::from(rule),
        line,
    })
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn starts_with_digit(&self) -> bool {
        self.rest.starts_with(|c: char| c.is_ascii_digit())
    }

    fn eat(&mut self, pred: impl Fn(char) -> bool) -> bool {
        match self.rest.chars().next() {
            Some(c) if pred(c) => {
                self.rest = &self.rest[c.len_utf8()..];
                true
            }
            _ => false,
        }
    }

    /// Digits plus an optional lowercase suffix letter.
    fn label(&mut self) -> Result<LineLabel, CitationError> {
        let digits = self
            .rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(self.rest.len());
        let mut end = digits;
        if let Some(c) = self.rest[digits..].chars().next()
            && c.is_ascii_lowercase()
        {
            end += c.len_utf8();
        }

        let text = &self.rest[..end];
        self.rest = &self.rest[end..];
        text.parse()
            .map_err(|_| CitationError::BadLabel(text.to_string()))
    }
}

impl fmt::Display for Citation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match item {
                CitedItem::Line(l) => write!(f, "{l}")?,
                CitedItem::Range(a, b) => write!(f, "{a}–{b}")?,
            }
        }
        if !self.items.is_empty() {
            write!(f, " ")?;
        }
        write!(f, "{}", self.rule)?;
        if let Some(strategy) = &self.strategy {
            write!(f, " ({}, ", strategy.marker)?;
            if let Some(line) = strategy.line {
                write!(f, "{line}")?;
            }
            write!(f, "{})", strategy.rule)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(n: u32) -> LineLabel {
        LineLabel::new(n, None)
    }

    #[test]
    fn lines_and_rule() {
        let c: Citation = "3,4 →E".parse().unwrap();
        assert_eq!(c.items, vec![CitedItem::Line(label(3)), CitedItem::Line(label(4))]);
        assert_eq!(c.rule, Ustr::from("→E"));
        assert_eq!(c.strategy, None);

        let spaced: Citation = " 3 , 4   →E ".parse().unwrap();
        assert_eq!(spaced, c);

        let ascii: Citation = "3, 4 ->E".parse().unwrap();
        assert_eq!(ascii.items, c.items);
        assert_eq!(ascii.rule, Ustr::from("->E"));
    }

    #[test]
    fn ranges_with_any_dash() {
        for text in ["1-2 →I", "1–2 →I", "1 — 2 →I"] {
            let c: Citation = text.parse().unwrap();
            assert_eq!(c.items, vec![CitedItem::Range(label(1), label(2))]);
        }
        let c: Citation = "1, 2-3, 4a-5 ∨E".parse().unwrap();
        assert_eq!(
            c.shape(),
            vec![ItemKind::Line, ItemKind::Range, ItemKind::Range]
        );
        assert_eq!(c.items[2], CitedItem::Range(LineLabel::new(4, Some('a')), label(5)));
    }

    #[test]
    fn bare_rules() {
        let c: Citation = "PR".parse().unwrap();
        assert!(c.items.is_empty());
        assert_eq!(c.rule, Ustr::from("PR"));
        let c: Citation = "A4".parse().unwrap();
        assert_eq!(c.rule, Ustr::from("A4"));
    }

    #[test]
    fn exit_strategies() {
        let c: Citation = "A (g, →I)".parse().unwrap();
        assert_eq!(
            c.strategy,
            Some(ExitStrategy {
                marker: ExitMarker::Goal,
                rule: Ustr::from("→I"),
                line: None,
            })
        );
        let italic: Citation = "A (𝑐, ~I)".parse().unwrap();
        assert_eq!(italic.strategy.unwrap().marker, ExitMarker::Contradiction);

        let with_line: Citation = "A (g, 3∃E)".parse().unwrap();
        let strategy = with_line.strategy.unwrap();
        assert_eq!(strategy.line, Some(label(3)));
        assert_eq!(strategy.rule, Ustr::from("∃E"));
    }

    #[test]
    fn malformed() {
        assert_eq!("".parse::<Citation>(), Err(CitationError::Empty));
        assert_eq!("3, 4".parse::<Citation>(), Err(CitationError::MissingRule));
        assert_eq!("3- →I".parse::<Citation>(), Err(CitationError::OpenRange));
        assert_eq!("A (g, →I".parse::<Citation>(), Err(CitationError::Unclosed));
        assert!(matches!(
            "A (x, →I)".parse::<Citation>(),
            Err(CitationError::BadStrategy(_))
        ));
        assert!(matches!(
            "A (g)".parse::<Citation>(),
            Err(CitationError::BadStrategy(_))
        ));
    }

    #[test]
    fn rule_survives_a_bad_strategy() {
        assert_eq!(cited_rule("A (g →I)"), Some(Ustr::from("A")));
        assert_eq!(cited_rule("1-2 →I"), Some(Ustr::from("→I")));
        assert_eq!(cited_rule("A (g, →I"), Some(Ustr::from("A")));
        assert_eq!(cited_rule("3, 4"), None);
    }

    #[test]
    fn prints_canonically() {
        let c: Citation = "1 - 2,3 ∃E".parse().unwrap();
        assert_eq!(c.to_string(), "1–2, 3 ∃E");
        let c: Citation = "A (𝑔, 3∃E)".parse().unwrap();
        assert_eq!(c.to_string(), "A (g, 3∃E)");
    }
}
