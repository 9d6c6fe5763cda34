//! The line and scope structure of a derivation, independent of any rule.

mod label;
mod scope;

pub use label::{LabelError, LineLabel};
pub use scope::StructureError;

use im::Vector;
use rustc_hash::FxHashMap;

use crate::{
    parse::{ParseFailure, StyledText},
    semant::expr::Expr,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineRole {
    Premise,
    /// Opens a subderivation one level deeper than the enclosing scope.
    Assumption,
    Step,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineContent {
    Blank,
    Parsed(Expr),
    Malformed(ParseFailure),
}

#[derive(Debug, Clone)]
pub struct DerivationLine {
    pub label: LineLabel,
    pub depth: usize,
    pub text: StyledText,
    pub content: LineContent,
    pub citation: String,
    pub role: LineRole,
}

impl DerivationLine {
    pub fn formula(&self) -> Option<&Expr> {
        match &self.content {
            LineContent::Parsed(expr) => Some(expr),
            _ => None,
        }
    }
}

/// Lines plus the scope each line lives in. A scope path lists the
/// assumption lines of every subderivation enclosing a line, outermost
/// first; an assumption's own path ends with itself.
#[derive(Debug, Clone)]
pub struct Derivation {
    lines: Vec<DerivationLine>,
    paths: Vec<Vector<usize>>,
    faults: Vec<Option<StructureError>>,
    by_label: FxHashMap<LineLabel, usize>,
}

impl Derivation {
    pub fn new(lines: Vec<DerivationLine>) -> Self {
        let mut paths = Vec::with_capacity(lines.len());
        let mut faults = Vec::with_capacity(lines.len());
        let mut by_label = FxHashMap::default();
        let mut open: Vector<usize> = Vector::new();

        for (i, line) in lines.iter().enumerate() {
            let d = line.depth;
            let mut fault = None;

            if line.role == LineRole::Assumption && d > 0 {
                while open.len() >= d {
                    open.pop_back();
                }
                if open.len() + 1 < d {
                    fault = Some(StructureError::UnopenedScope {
                        line: line.label,
                        depth: d,
                        open: open.len(),
                    });
                }
                open.push_back(i);
            } else {
                while open.len() > d {
                    open.pop_back();
                }
                if open.len() < d {
                    fault = Some(StructureError::UnopenedScope {
                        line: line.label,
                        depth: d,
                        open: open.len(),
                    });
                }
            }

            // The first line keeps a repeated label.
            if by_label.contains_key(&line.label) {
                fault.get_or_insert(StructureError::DuplicateLabel(line.label));
            } else {
                by_label.insert(line.label, i);
            }

            paths.push(open.clone());
            faults.push(fault);
        }

        Self {
            lines,
            paths,
            faults,
            by_label,
        }
    }

    pub fn lines(&self) -> &[DerivationLine] {
        &self.lines
    }

    pub fn line(&self, idx: usize) -> &DerivationLine {
        &self.lines[idx]
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The scope violation recorded for a line while building, if any.
    pub fn fault(&self, idx: usize) -> Option<&StructureError> {
        self.faults[idx].as_ref()
    }

    pub(crate) fn path(&self, idx: usize) -> &Vector<usize> {
        &self.paths[idx]
    }

    pub fn line_from_label(&self, label: LineLabel) -> Option<usize> {
        self.by_label.get(&label).copied()
    }
}


#[cfg(test)]
mod tests {
    use super::{LineRole::*, test_support::skeleton, *};

    #[test]
    fn paths_follow_assumptions() {
        let d = skeleton(&[(0, Premise), (1, Assumption), (2, Assumption), (2, Step), (1, Step), (0, Step)]);
        assert_eq!(d.path(0), &Vector::new());
        assert_eq!(d.path(1), &Vector::from(vec![1]));
        assert_eq!(d.path(3), &Vector::from(vec![1, 2]));
        assert_eq!(d.path(4), &Vector::from(vec![1]));
        assert_eq!(d.path(5), &Vector::new());
        assert!((0..d.len()).all(|i| d.fault(i).is_none()));
    }

    #[test]
    fn sibling_assumptions_replace_each_other() {
        let d = skeleton(&[(1, Assumption), (1, Step), (1, Assumption), (1, Step)]);
        assert_eq!(d.path(1), &Vector::from(vec![0]));
        assert_eq!(d.path(3), &Vector::from(vec![2]));
    }

    #[test]
    fn lines_deeper_than_open_scopes_are_faulted() {
        let d = skeleton(&[(0, Premise), (1, Step), (2, Assumption)]);
        assert!(matches!(
            d.fault(1),
            Some(StructureError::UnopenedScope { depth: 1, open: 0, .. })
        ));
        assert!(matches!(
            d.fault(2),
            Some(StructureError::UnopenedScope { depth: 2, open: 0, .. })
        ));
    }

    #[test]
    fn duplicate_labels_keep_the_first_line() {
        let mut lines = skeleton(&[(0, Premise), (0, Step)]).lines().to_vec();
        lines[1].label = lines[0].label;
        let d = Derivation::new(lines);
        assert_eq!(d.line_from_label(LineLabel::new(1, None)), Some(0));
        assert!(matches!(d.fault(1), Some(StructureError::DuplicateLabel(_))));
        assert_eq!(d.line_from_label(LineLabel::new(2, None)), None);
    }
}
