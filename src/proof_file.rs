//! Derivations stored as TOML, one `[[line]]` table per line.

use std::ops::Range;

use serde::Deserialize;
use thiserror::Error;
use toml::Spanned;

use crate::{
    derivation::{LabelError, LineLabel},
    parse::StyledText,
    rules::RawLine,
};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ProofFileDef {
    #[serde(default)]
    ruleset: Option<String>,
    #[serde(default, rename = "line")]
    lines: Vec<LineDef>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct LineDef {
    #[serde(default)]
    depth: usize,
    #[serde(default)]
    label: Option<Spanned<String>>,
    formula: Spanned<String>,
    citation: Spanned<String>,
}

#[derive(Debug, Error)]
pub enum ProofFileError {
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
    #[error("{source}")]
    BadLabel {
        span: Range<usize>,
        source: LabelError,
    },
}

impl ProofFileError {
    /// Where in the file the problem is, when it can be pinned down.
    pub fn span(&self) -> Option<Range<usize>> {
        match self {
            ProofFileError::Toml(err) => err.span(),
            ProofFileError::BadLabel { span, .. } => Some(span.clone()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProofLine {
    pub raw: RawLine,
    pub formula_span: Range<usize>,
    pub citation_span: Range<usize>,
}

#[derive(Debug, Clone)]
pub struct ProofFile {
    pub ruleset: Option<String>,
    pub lines: Vec<ProofLine>,
}

impl ProofFile {
    pub fn parse(text: &str) -> Result<Self, ProofFileError> {
        let def: ProofFileDef = toml::from_str(text)?;
        let lines = def
            .lines
            .into_iter()
            .map(|line| {
                let label = match &line.label {
                    Some(label) => Some(label.get_ref().parse::<LineLabel>().map_err(|source| {
                        ProofFileError::BadLabel {
                            span: label.span(),
                            source,
                        }
                    })?),
                    None => None,
                };
                Ok(ProofLine {
                    raw: RawLine {
                        label,
                        depth: line.depth,
                        text: StyledText::from_markup(line.formula.get_ref()),
                        citation: line.citation.get_ref().clone(),
                    },
                    formula_span: line.formula.span(),
                    citation_span: line.citation.span(),
                })
            })
            .collect::<Result<_, ProofFileError>>()?;

        Ok(Self {
            ruleset: def.ruleset,
            lines,
        })
    }

    pub fn raw_lines(&self) -> Vec<RawLine> {
        self.lines.iter().map(|l| l.raw.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    #[test]
    fn reads_lines_with_spans() {
        let text = indoc! {r#"
            ruleset = "ND"

            [[line]]
            formula = "(A → B)"
            citation = "PR"

            [[line]]
            depth = 1
            label = "2a"
            formula = "A"
            citation = "A (g, →I)"
        "#};
        let proof = ProofFile::parse(text).unwrap();
        assert_eq!(proof.ruleset.as_deref(), Some("ND"));
        assert_eq!(proof.lines.len(), 2);

        let second = &proof.lines[1];
        assert_eq!(second.raw.depth, 1);
        assert_eq!(second.raw.label, Some(LineLabel::new(2, Some('a'))));
        assert_eq!(&text[second.citation_span.clone()], "\"A (g, →I)\"");
        assert_eq!(proof.lines[0].raw.depth, 0);
        assert_eq!(proof.lines[0].raw.label, None);
    }

    #[test]
    fn bad_labels_point_at_the_label() {
        let text = indoc! {r#"
            [[line]]
            label = "x"
            formula = "A"
            citation = "PR"
        "#};
        match ProofFile::parse(text) {
            Err(ProofFileError::BadLabel { span, .. }) => assert_eq!(&text[span], "\"x\""),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = ProofFile::parse("[[line]]\nformula = \"A\"\ncitation = \"PR\"\ncolor = 1\n");
        assert!(matches!(err, Err(ProofFileError::Toml(_))));
    }
}
