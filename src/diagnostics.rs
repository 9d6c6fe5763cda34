//! What the checker says about a line: runs of plain and italic text, with
//! formulas in italics.

mod render;

pub use render::{AnnotationTy, Report, render};

use std::fmt;

use crate::{
    lang::Language,
    rules::{CheckError, Culprit, Subject},
    util::ansi::{ANSI_ITALIC, ANSI_RESET},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FragmentStyle {
    Plain,
    Italic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub style: FragmentStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostic {
    fragments: Vec<Fragment>,
}

impl Diagnostic {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, text: impl Into<String>, style: FragmentStyle) -> Self {
        let text = text.into();
        if text.is_empty() {
            return self;
        }
        match self.fragments.last_mut() {
            Some(last) if last.style == style => last.text.push_str(&text),
            _ => self.fragments.push(Fragment { text, style }),
        }
        self
    }

    pub fn plain(self, text: impl Into<String>) -> Self {
        self.push(text, FragmentStyle::Plain)
    }

    pub fn italic(self, text: impl Into<String>) -> Self {
        self.push(text, FragmentStyle::Italic)
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// The text with italic runs set off by ANSI escapes.
    pub fn to_ansi(&self) -> String {
        self.fragments
            .iter()
            .map(|f| match f.style {
                FragmentStyle::Plain => f.text.clone(),
                FragmentStyle::Italic => format!("{ANSI_ITALIC}{}{ANSI_RESET}", f.text),
            })
            .collect()
    }

    pub fn from_error(err: &CheckError, lang: &Language) -> Self {
        let diag = Diagnostic::new();
        match err {
            CheckError::FormMismatch(m) => {
                let subject = match m.subject {
                    Subject::ThisLine => "this line".to_string(),
                    Subject::Cited(label) => format!("line {label}"),
                };
                diag.plain(format!("{} requires {subject} to be ", m.rule))
                    .italic(m.expected.clone())
                    .plain(", but it is ")
                    .italic(m.found.display(lang).to_string())
                    .plain(".")
            }
            CheckError::FreeVariableCapture { variable, culprit } => {
                let diag = diag.plain("The variable ").italic(variable.as_str());
                let diag = match culprit {
                    Culprit::Formula(formula) => diag
                        .plain(" must not be free in ")
                        .italic(formula.display(lang).to_string()),
                    Culprit::Capture => diag.plain(" would be captured by a quantifier"),
                    Culprit::ThisLine => diag.plain(" must not be free in this line"),
                    Culprit::Line(label) => diag.plain(format!(" must not be free in line {label}")),
                    Culprit::Assumption(label) => diag.plain(format!(
                        " must not be free in line {label}, which is still in force"
                    )),
                };
                diag.plain(".")
            }
            CheckError::ParseFailure { label, failure } => {
                diag.plain(format!("Line {label} could not be read: {failure}."))
            }
            other => {
                let mut text = capitalize(&other.to_string());
                if !text.ends_with('.') {
                    text.push('.');
                }
                diag.plain(text)
            }
        }
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for fragment in &self.fragments {
            f.write_str(&fragment.text)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        derivation::LineLabel,
        lang::SENTENTIAL,
        rules::Mismatch,
        semant::expr::Expr,
    };
    use ustr::Ustr;

    #[test]
    fn adjacent_runs_merge() {
        let d = Diagnostic::new().plain("a").plain("b").italic("C").plain("");
        assert_eq!(d.fragments().len(), 2);
        assert_eq!(d.to_string(), "abC");
    }

    #[test]
    fn mismatches_set_formulas_in_italics() {
        let lang = Language::from_toml(SENTENTIAL).unwrap();
        let err = CheckError::mismatch(Mismatch {
            rule: Ustr::from("→I"),
            subject: Subject::ThisLine,
            found: Expr::binary(Ustr::from("→"), Expr::atom("B"), Expr::atom("A")),
            expected: "(A → B)".to_string(),
            progress: 2,
            sufficient: true,
        });
        let d = Diagnostic::from_error(&err, &lang);
        assert_eq!(d.to_string(), "→I requires this line to be (A → B), but it is (B → A).");
        let italics: Vec<_> = d
            .fragments()
            .iter()
            .filter(|f| f.style == FragmentStyle::Italic)
            .map(|f| f.text.as_str())
            .collect();
        assert_eq!(italics, vec!["(A → B)", "(B → A)"]);
    }

    #[test]
    fn other_errors_use_their_message() {
        let lang = Language::from_toml(SENTENTIAL).unwrap();
        let d = Diagnostic::from_error(&CheckError::EmptyCitation(LineLabel::new(4, None)), &lang);
        assert_eq!(d.to_string(), "Line 4 is cited but has no formula.");
        assert_eq!(d.fragments()[0].style, FragmentStyle::Plain);
    }
}
