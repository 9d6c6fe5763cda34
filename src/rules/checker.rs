use tracing::{debug, trace};

use crate::{
    derivation::{Derivation, DerivationLine, LineContent, LineLabel, LineRole},
    diagnostics::Diagnostic,
    parse::{StyledText, parse_one},
    rules::{
        CheckError, RuleShape, Subject,
        citation::{Citation, CitationError, CitedItem, ExitStrategy, cited_rule},
    },
    ruleset::Ruleset,
    semant::{expr::Expr, matcher::BindingSession},
};

/// A line as the host hands it over: nothing is parsed yet.
#[derive(Debug, Clone)]
pub struct RawLine {
    /// Defaults to the 1-based position.
    pub label: Option<LineLabel>,
    pub depth: usize,
    pub text: StyledText,
    pub citation: String,
}

impl RawLine {
    pub fn new(depth: usize, text: &str, citation: &str) -> Self {
        Self {
            label: None,
            depth,
            text: StyledText::from_markup(text),
            citation: citation.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LineReport {
    pub label: LineLabel,
    pub valid: bool,
    /// Empty for a valid line.
    pub diagnostic: Diagnostic,
    pub error: Option<CheckError>,
}

/// A cited line whose formula parsed.
#[derive(Debug, Clone, Copy)]
pub struct Cited<'a> {
    pub index: usize,
    pub label: LineLabel,
    pub formula: &'a Expr,
}

/// Everything a rule looks at while checking one line.
pub struct LineContext<'a> {
    pub ruleset: &'a Ruleset,
    pub derivation: &'a Derivation,
    citations: &'a [Result<Citation, CitationError>],
    pub index: usize,
    pub formula: &'a Expr,
    pub citation: &'a Citation,
    /// Cited lines, in citation order.
    pub lines: Vec<Cited<'a>>,
    /// Cited subderivations as (first line, last line), in citation order.
    pub blocks: Vec<(Cited<'a>, Cited<'a>)>,
}

impl<'a> LineContext<'a> {
    pub fn this_line(&self) -> Cited<'a> {
        Cited {
            index: self.index,
            label: self.derivation.line(self.index).label,
            formula: self.formula,
        }
    }

    pub fn subject(&self, cited: Cited) -> Subject {
        if cited.index == self.index {
            Subject::ThisLine
        } else {
            Subject::Cited(cited.label)
        }
    }

    /// The exit strategy announced by the assumption on line `idx`.
    pub fn strategy(&self, idx: usize) -> Option<ExitStrategy> {
        self.citations[idx].as_ref().ok().and_then(|c| c.strategy)
    }

    pub fn citation_readable(&self, idx: usize) -> bool {
        self.citations[idx].is_ok()
    }

    pub fn show(&self, expr: &Expr) -> String {
        expr.display(self.ruleset.object()).to_string()
    }

    pub fn show_schema(&self, schema: &Expr) -> String {
        schema.display(self.ruleset.meta()).to_string()
    }

    /// A schema with the bindings made so far filled in, when they cover it.
    pub fn describe(&self, schema: &Expr, session: &BindingSession) -> String {
        match session.instantiate(schema) {
            Some(expr) => self.show(&expr),
            None => self.show_schema(schema),
        }
    }
}

/// Checks the lines of one derivation against a ruleset.
pub struct Checker<'r> {
    ruleset: &'r Ruleset,
    derivation: Derivation,
    citations: Vec<Result<Citation, CitationError>>,
}

impl<'r> Checker<'r> {
    pub fn new(ruleset: &'r Ruleset, raw: Vec<RawLine>) -> Self {
        let citations: Vec<Result<Citation, CitationError>> =
            raw.iter().map(|line| line.citation.parse()).collect();

        let lines = raw
            .into_iter()
            .zip(&citations)
            .enumerate()
            .map(|(i, (raw, citation))| {
                let content = if raw.text.is_blank() {
                    LineContent::Blank
                } else {
                    match parse_one(&raw.text, ruleset.object()) {
                        Ok(expr) => LineContent::Parsed(expr),
                        Err(failure) => LineContent::Malformed(failure),
                    }
                };
                // A malformed exit strategy still leaves an assumption.
                let rule = match citation {
                    Ok(c) => Some(c.rule),
                    Err(_) => cited_rule(&raw.citation),
                };
                let role = match rule.and_then(|r| ruleset.rule_named(r)).map(|r| r.shape()) {
                    Some(RuleShape::Premise) => LineRole::Premise,
                    Some(RuleShape::Assumption) => LineRole::Assumption,
                    _ => LineRole::Step,
                };
                DerivationLine {
                    label: raw.label.unwrap_or(LineLabel::new(i as u32 + 1, None)),
                    depth: raw.depth,
                    text: raw.text,
                    content,
                    citation: raw.citation,
                    role,
                }
            })
            .collect();

        Self {
            ruleset,
            derivation: Derivation::new(lines),
            citations,
        }
    }

    pub fn derivation(&self) -> &Derivation {
        &self.derivation
    }

    pub fn check_all(&self) -> Vec<LineReport> {
        (0..self.derivation.len()).map(|i| self.check_line(i)).collect()
    }

    pub fn check_line(&self, idx: usize) -> LineReport {
        let label = self.derivation.line(idx).label;
        let result = self.evaluate(idx);
        match &result {
            Ok(()) => debug!(line = %label, "line is justified"),
            Err(err) => debug!(line = %label, error = %err, "line is not justified"),
        }

        let diagnostic = match &result {
            Ok(()) => Diagnostic::default(),
            Err(err) => Diagnostic::from_error(err, self.ruleset.object()),
        };
        LineReport {
            label,
            valid: result.is_ok(),
            diagnostic,
            error: result.err(),
        }
    }

    fn evaluate(&self, idx: usize) -> Result<(), CheckError> {
        let line = self.derivation.line(idx);
        if let Some(fault) = self.derivation.fault(idx) {
            return Err(fault.clone().into());
        }

        let formula = match &line.content {
            LineContent::Parsed(expr) => expr,
            LineContent::Blank => return Err(CheckError::EmptyLine(line.label)),
            LineContent::Malformed(failure) => {
                return Err(CheckError::ParseFailure {
                    label: line.label,
                    failure: failure.clone(),
                });
            }
        };

        let citation = self.citations[idx].as_ref().map_err(|e| e.clone())?;
        let rule = self.ruleset.resolve(citation)?;
        trace!(line = %line.label, rule = %rule.name(), "resolved citation");

        let (lines, blocks) = self.resolve_items(idx, citation)?;
        let ctx = LineContext {
            ruleset: self.ruleset,
            derivation: &self.derivation,
            citations: &self.citations,
            index: idx,
            formula,
            citation,
            lines,
            blocks,
        };
        rule.applies(&ctx)
    }

    /// Look up every cited line. Failures are reported in a fixed order:
    /// unknown labels, then blank lines, then accessibility, then lines that
    /// do not parse.
    #[allow(clippy::type_complexity)]
    fn resolve_items(
        &self,
        citing: usize,
        citation: &Citation,
    ) -> Result<(Vec<Cited<'_>>, Vec<(Cited<'_>, Cited<'_>)>), CheckError> {
        let lookup = |label: LineLabel| {
            self.derivation
                .line_from_label(label)
                .ok_or(CheckError::UnknownLabel(label))
        };

        enum Item {
            Line(usize),
            Range(usize, usize),
        }
        let items = citation
            .items
            .iter()
            .map(|item| match *item {
                CitedItem::Line(l) => Ok(Item::Line(lookup(l)?)),
                CitedItem::Range(a, b) => Ok(Item::Range(lookup(a)?, lookup(b)?)),
            })
            .collect::<Result<Vec<_>, CheckError>>()?;

        let touched = || {
            items.iter().flat_map(|item| match *item {
                Item::Line(k) => vec![k],
                Item::Range(a, b) => vec![a, b],
            })
        };

        for k in touched() {
            if self.derivation.line(k).content == LineContent::Blank {
                return Err(CheckError::EmptyCitation(self.derivation.line(k).label));
            }
        }

        for item in &items {
            match *item {
                Item::Line(k) => self.derivation.check_accessible(citing, k)?,
                Item::Range(a, b) => self.derivation.is_accessible_subderivation(citing, a, b)?,
            }
        }

        let cited = |k: usize| {
            let line = self.derivation.line(k);
            match &line.content {
                LineContent::Parsed(formula) => Ok(Cited {
                    index: k,
                    label: line.label,
                    formula,
                }),
                LineContent::Malformed(failure) => Err(CheckError::ParseFailure {
                    label: line.label,
                    failure: failure.clone(),
                }),
                LineContent::Blank => Err(CheckError::EmptyCitation(line.label)),
            }
        };

        let mut lines = Vec::new();
        let mut blocks = Vec::new();
        for item in &items {
            match *item {
                Item::Line(k) => lines.push(cited(k)?),
                Item::Range(a, b) => blocks.push((cited(a)?, cited(b)?)),
            }
        }
        Ok((lines, blocks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        derivation::StructureError,
        rules::StrategyError,
        ruleset::Registry,
    };

    fn check(ruleset: &str, lines: Vec<RawLine>) -> Vec<LineReport> {
        let registry = Registry::builtin().unwrap();
        let ruleset = registry.ruleset(ruleset).unwrap();
        Checker::new(ruleset, lines).check_all()
    }

    #[test]
    fn roles_come_from_the_citation() {
        let registry = Registry::builtin().unwrap();
        let checker = Checker::new(
            registry.ruleset("ND").unwrap(),
            vec![
                RawLine::new(0, "A", "PR"),
                RawLine::new(1, "B", "A (g, →I)"),
                RawLine::new(1, "A", "1 R"),
            ],
        );
        let roles: Vec<_> = checker.derivation().lines().iter().map(|l| l.role).collect();
        assert_eq!(roles, vec![LineRole::Premise, LineRole::Assumption, LineRole::Step]);
    }

    #[test]
    fn a_malformed_exit_strategy_keeps_its_subderivation() {
        let reports = check(
            "ND",
            vec![
                RawLine::new(1, "A", "A (g →I)"),
                RawLine::new(1, "A", "1 R"),
                RawLine::new(0, "(A → A)", "1-2 →I"),
            ],
        );
        assert_eq!(
            reports[0].error,
            Some(CheckError::MalformedCitation(CitationError::BadStrategy(
                "g →I".to_string()
            )))
        );
        assert!(reports[1].valid);
        assert_eq!(
            reports[2].error,
            Some(CheckError::Strategy(StrategyError::Unreadable(LineLabel::new(1, None))))
        );
    }

    #[test]
    fn labels_default_to_positions() {
        let mut line = RawLine::new(0, "A", "PR");
        line.label = Some(LineLabel::new(7, Some('a')));
        let reports = check("ND", vec![RawLine::new(0, "B", "PR"), line]);
        assert_eq!(reports[0].label, LineLabel::new(1, None));
        assert_eq!(reports[1].label, LineLabel::new(7, Some('a')));
    }

    #[test]
    fn own_line_problems_come_first() {
        let reports = check(
            "ND",
            vec![RawLine::new(0, "", "PR"), RawLine::new(0, "(A ∧", "9 R")],
        );
        assert_eq!(reports[0].error, Some(CheckError::EmptyLine(LineLabel::new(1, None))));
        assert!(matches!(reports[1].error, Some(CheckError::ParseFailure { .. })));
    }

    #[test]
    fn unknown_labels_before_blank_lines() {
        let reports = check(
            "ND",
            vec![
                RawLine::new(0, "", "PR"),
                RawLine::new(0, "A", "1, 9 ∧I"),
            ],
        );
        assert_eq!(
            reports[1].error,
            Some(CheckError::UnknownLabel(LineLabel::new(9, None)))
        );
    }

    #[test]
    fn citing_a_later_line_is_inaccessible() {
        let reports = check(
            "ND",
            vec![RawLine::new(0, "A", "2 R"), RawLine::new(0, "A", "PR")],
        );
        assert!(matches!(
            reports[0].error,
            Some(CheckError::Scope(StructureError::Inaccessible { .. }))
        ));
    }

    #[test]
    fn valid_lines_have_no_diagnostic() {
        let reports = check("ND", vec![RawLine::new(0, "A", "PR"), RawLine::new(0, "A", "1 R")]);
        assert!(reports.iter().all(|r| r.valid && r.diagnostic.is_empty()));
    }
}
