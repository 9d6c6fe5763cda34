//! Rules as declarative descriptors, and the evaluators that decide whether a
//! line is justified by one.

pub mod checker;
pub mod citation;
pub mod descriptor;
mod generic;
mod special;

use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;
use ustr::Ustr;

use crate::{
    derivation::{LineLabel, StructureError},
    parse::ParseFailure,
    rules::citation::{CitationError, ExitMarker, ItemKind},
    semant::expr::Expr,
};

pub use checker::{Checker, LineReport, RawLine};

/// A schematic form: cited lines match `inputs`, cited subderivations match
/// `subs` as (first line, last line) pairs, and the justified line matches
/// `output`, all under one binding session.
#[derive(Debug, Clone)]
pub struct Form {
    pub inputs: Vec<Expr>,
    pub subs: Vec<(Expr, Expr)>,
    pub output: Expr,
    pub side: Vec<SideCondition>,
}

/// `left` and `right` are interchangeable anywhere inside a formula.
#[derive(Debug, Clone)]
pub struct ReplacementForm {
    pub left: Expr,
    pub right: Expr,
    pub side: Vec<SideCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideCondition {
    /// The variable bound to `variable` is not free in the formula bound to
    /// `within`.
    NotFree { variable: Ustr, within: Ustr },
    /// The variable bound to `variable` is not free in any premise or
    /// assumption in force at the line.
    NotFreeInAssumptions { variable: Ustr },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialRule {
    UniversalElim,
    UniversalIntro,
    ExistentialIntro,
    ExistentialElim,
    IdentityElim,
    UniversalInstanceAxiom,
    FunctionSubstitution,
    RelationSubstitution,
}

impl SpecialRule {
    pub fn cites(self) -> Vec<ItemKind> {
        use ItemKind::*;
        match self {
            SpecialRule::UniversalElim
            | SpecialRule::UniversalIntro
            | SpecialRule::ExistentialIntro => vec![Line],
            SpecialRule::ExistentialElim => vec![Line, Range],
            SpecialRule::IdentityElim => vec![Line, Line],
            SpecialRule::UniversalInstanceAxiom
            | SpecialRule::FunctionSubstitution
            | SpecialRule::RelationSubstitution => vec![],
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleShape {
    Premise,
    Assumption,
    Axiom(Vec<Form>),
    Inference(Vec<Form>),
    /// Closes subderivations whose assumptions announced this rule with
    /// `marker`.
    Closing { forms: Vec<Form>, marker: ExitMarker },
    Replacement(Vec<ReplacementForm>),
    Special(SpecialRule),
}

#[derive(Debug, Clone)]
pub struct Rule {
    name: Ustr,
    aliases: Vec<Ustr>,
    shape: RuleShape,
    cites: Vec<ItemKind>,
}

impl Rule {
    pub fn new(name: Ustr, aliases: Vec<Ustr>, shape: RuleShape) -> Self {
        let cites = match &shape {
            RuleShape::Premise | RuleShape::Assumption | RuleShape::Axiom(_) => vec![],
            RuleShape::Inference(forms) | RuleShape::Closing { forms, .. } => {
                let form = forms.first();
                let lines = form.map(|f| f.inputs.len()).unwrap_or(0);
                let ranges = form.map(|f| f.subs.len()).unwrap_or(0);
                std::iter::repeat_n(ItemKind::Line, lines)
                    .chain(std::iter::repeat_n(ItemKind::Range, ranges))
                    .collect()
            }
            RuleShape::Replacement(_) => vec![ItemKind::Line],
            RuleShape::Special(special) => special.cites(),
        };
        Self {
            name,
            aliases,
            shape,
            cites,
        }
    }

    pub fn name(&self) -> Ustr {
        self.name
    }

    pub fn aliases(&self) -> &[Ustr] {
        &self.aliases
    }

    pub fn shape(&self) -> &RuleShape {
        &self.shape
    }

    /// The kinds of item the rule cites; order is not significant.
    pub fn cites(&self) -> &[ItemKind] {
        &self.cites
    }

    /// Check the line in `ctx` against this rule.
    pub fn applies(&self, ctx: &checker::LineContext) -> Result<(), CheckError> {
        match &self.shape {
            RuleShape::Premise => generic::premise(ctx),
            RuleShape::Assumption => generic::assumption(ctx),
            RuleShape::Axiom(forms) | RuleShape::Inference(forms) => {
                generic::inference(self, forms, ctx)
            }
            RuleShape::Closing { forms, .. } => {
                generic::strategies(self, ctx)?;
                generic::inference(self, forms, ctx)
            }
            RuleShape::Replacement(forms) => generic::replacement(self, forms, ctx),
            RuleShape::Special(special) => special::apply(self, *special, ctx),
        }
    }

    pub fn is_named(&self, name: Ustr) -> bool {
        self.name == name || self.aliases.contains(&name)
    }

    /// Whether a citation with these items fits the rule.
    pub fn accepts_shape(&self, shape: &[ItemKind]) -> bool {
        count_kinds(shape) == count_kinds(&self.cites)
    }

    /// The marker an assumption must use to announce this rule, for rules
    /// that close subderivations.
    pub fn closing_marker(&self) -> Option<ExitMarker> {
        match &self.shape {
            RuleShape::Closing { marker, .. } => Some(*marker),
            RuleShape::Special(SpecialRule::ExistentialElim) => Some(ExitMarker::Goal),
            _ => None,
        }
    }
}

fn count_kinds(shape: &[ItemKind]) -> (usize, usize) {
    let lines = shape.iter().filter(|k| **k == ItemKind::Line).count();
    (lines, shape.len() - lines)
}

/// Say what a rule cites, as in "two lines and a subderivation".
pub fn describe_cites(cites: &[ItemKind]) -> String {
    let (lines, ranges) = count_kinds(cites);
    let mut parts = Vec::new();
    let number = |n: usize| match n {
        1 => "one".to_string(),
        2 => "two".to_string(),
        3 => "three".to_string(),
        n => n.to_string(),
    };
    if lines > 0 {
        parts.push(format!("{} line{}", number(lines), crate::util::plural(lines)));
    }
    if ranges > 0 {
        parts.push(format!(
            "{} subderivation{}",
            number(ranges),
            crate::util::plural(ranges)
        ));
    }
    if parts.is_empty() {
        "nothing".to_string()
    } else {
        parts.join(" and ")
    }
}

/// What part of the derivation a mismatch is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    ThisLine,
    Cited(LineLabel),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub rule: Ustr,
    pub subject: Subject,
    pub found: Expr,
    /// The required form, instantiated as far as the bindings allow.
    pub expected: String,
    /// Literal nodes matched before the failure.
    pub progress: usize,
    pub sufficient: bool,
}

/// Where a variable that must not occur free was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Culprit {
    ThisLine,
    Line(LineLabel),
    Assumption(LineLabel),
    Formula(Expr),
    /// A term would fall under a quantifier binding one of its variables.
    Capture,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StrategyError {
    #[error("an assumption must say how its subderivation will end, as in `A (g, →I)`")]
    Missing,
    #[error("the exit strategy on line {0} could not be read")]
    Unreadable(LineLabel),
    #[error("there is no rule `{0}` to close the subderivation")]
    UnknownRule(Ustr),
    #[error("`{0}` does not close subderivations")]
    NotClosing(Ustr),
    #[error("`{rule}` is announced with `{expected}`")]
    WrongMarker { rule: Ustr, expected: ExitMarker },
    #[error("the subderivation starting at line {top} announced `{announced}`, not `{rule}`")]
    OtherRule {
        top: LineLabel,
        announced: Ustr,
        rule: Ustr,
    },
    #[error("the subderivation starting at line {top} announced line {announced}, not line {cited}")]
    OtherLine {
        top: LineLabel,
        announced: LineLabel,
        cited: LineLabel,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    #[error("line {label} could not be read: {failure}")]
    ParseFailure {
        label: LineLabel,
        failure: ParseFailure,
    },
    #[error("line {0} has no formula")]
    EmptyLine(LineLabel),
    #[error("line {0} is cited but has no formula")]
    EmptyCitation(LineLabel),
    #[error("there is no line {0}")]
    UnknownLabel(LineLabel),
    #[error(transparent)]
    Scope(#[from] StructureError),
    #[error("{}", mismatch_text(.0))]
    FormMismatch(Box<Mismatch>),
    #[error("{variable} must not be free in {}", culprit_text(.culprit))]
    FreeVariableCapture { variable: Ustr, culprit: Culprit },
    #[error("there is no rule `{rule}` in {ruleset}")]
    UnknownRule { rule: Ustr, ruleset: Ustr },
    #[error(transparent)]
    MalformedCitation(#[from] CitationError),
    #[error("{rule} cites {cites}")]
    CitationShape { rule: Ustr, cites: String },
    #[error("{message}")]
    CommonMistake { rule: Ustr, message: String },
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error("{0}")]
    CapabilityLimit(String),
}

fn mismatch_text(m: &Mismatch) -> String {
    let subject = match m.subject {
        Subject::ThisLine => "this line".to_string(),
        Subject::Cited(label) => format!("line {label}"),
    };
    format!(
        "{} requires {subject} to be {}, but it is {}",
        m.rule, m.expected, m.found
    )
}

fn culprit_text(c: &Culprit) -> String {
    match c {
        Culprit::ThisLine => "this line".to_string(),
        Culprit::Line(label) => format!("line {label}"),
        Culprit::Assumption(label) => format!("line {label}, which is still in force"),
        Culprit::Formula(expr) => expr.to_string(),
        Culprit::Capture => "the scope of a quantifier binding it".to_string(),
    }
}

impl CheckError {
    pub fn mismatch(m: Mismatch) -> Self {
        CheckError::FormMismatch(Box::new(m))
    }

    /// How much a failure says about what went wrong. Among failed
    /// candidates the most specific one is reported.
    pub fn specificity(&self) -> usize {
        match self {
            CheckError::FreeVariableCapture { .. } => 1000,
            CheckError::FormMismatch(m) => 10 + 2 * m.progress + m.sufficient as usize,
            CheckError::CapabilityLimit(_) => 0,
            _ => 5,
        }
    }
}

/// Try candidates in order. Returns the first success, or the most specific
/// failure (the earliest among equals), or `empty` when there were no
/// candidates.
pub fn first_success<C, T, F>(
    candidates: impl IntoIterator<Item = C>,
    mut attempt: F,
    empty: CheckError,
) -> Result<T, CheckError>
where
    F: FnMut(C) -> Result<T, CheckError>,
{
    let mut best: Option<CheckError> = None;
    for candidate in candidates {
        match attempt(candidate) {
            Ok(t) => return Ok(t),
            Err(e) => {
                if best
                    .as_ref()
                    .is_none_or(|b| e.specificity() > b.specificity())
                {
                    best = Some(e);
                }
            }
        }
    }
    Err(best.unwrap_or(empty))
}

/// Every ordering of `items`.
pub(crate) fn orderings<T: Clone>(items: &[T]) -> Vec<Vec<T>> {
    let n = items.len();
    items.iter().cloned().permutations(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch(progress: usize, sufficient: bool) -> CheckError {
        CheckError::mismatch(Mismatch {
            rule: Ustr::from("→E"),
            subject: Subject::ThisLine,
            found: Expr::atom("A"),
            expected: "B".to_string(),
            progress,
            sufficient,
        })
    }

    #[test]
    fn first_success_short_circuits() {
        let mut tried = Vec::new();
        let res = first_success(
            [1, 2, 3],
            |n| {
                tried.push(n);
                if n == 2 { Ok(n) } else { Err(mismatch(0, false)) }
            },
            mismatch(0, false),
        );
        assert_eq!(res, Ok(2));
        assert_eq!(tried, vec![1, 2]);
    }

    #[test]
    fn first_success_keeps_the_most_specific_failure() {
        let errors = vec![mismatch(1, false), mismatch(3, false), mismatch(3, true), mismatch(2, true)];
        let res: Result<(), _> = first_success(errors, Err, mismatch(0, false));
        assert_eq!(res, Err(mismatch(3, true)));

        let capture = CheckError::FreeVariableCapture {
            variable: Ustr::from("x"),
            culprit: Culprit::ThisLine,
        };
        let res: Result<(), _> =
            first_success(vec![mismatch(9, true), capture.clone()], Err, mismatch(0, false));
        assert_eq!(res, Err(capture));
    }

    #[test]
    fn no_candidates_gives_the_fallback() {
        let res: Result<(), _> = first_success(Vec::<u8>::new(), |_| Ok(()), mismatch(0, false));
        assert_eq!(res, Err(mismatch(0, false)));
    }

    #[test]
    fn describes_citation_shapes() {
        use ItemKind::*;
        assert_eq!(describe_cites(&[Line, Line]), "two lines");
        assert_eq!(describe_cites(&[Line, Range, Range]), "one line and two subderivations");
        assert_eq!(describe_cites(&[]), "nothing");
    }

    #[test]
    fn orderings_cover_every_permutation() {
        assert_eq!(orderings(&[1, 2, 3]).len(), 6);
        assert_eq!(orderings::<u8>(&[]), vec![Vec::<u8>::new()]);
    }
}
