use thiserror::Error;

use crate::derivation::{Derivation, LineLabel, LineRole};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("line {line} is at depth {depth} but only {open} subderivation(s) are open there")]
    UnopenedScope {
        line: LineLabel,
        depth: usize,
        open: usize,
    },
    #[error("line {0} repeats the label of an earlier line")]
    DuplicateLabel(LineLabel),
    #[error("line {0} is not an assumption, so it cannot start a subderivation")]
    NotAssumption(LineLabel),
    #[error("the range {top}–{bottom} runs backwards")]
    Reversed { top: LineLabel, bottom: LineLabel },
    #[error("lines {top} and {bottom} are not at the same depth")]
    DepthMismatch { top: LineLabel, bottom: LineLabel },
    #[error("line {line} leaves the subderivation that starts at line {top}")]
    LeavesScope { top: LineLabel, line: LineLabel },
    #[error("line {line} starts a new subderivation after the one at line {top}")]
    SiblingAssumption { top: LineLabel, line: LineLabel },
    #[error("the subderivation starting at line {top} does not end at line {bottom}; its last line is {last}")]
    NotClosed {
        top: LineLabel,
        bottom: LineLabel,
        last: LineLabel,
    },
    #[error("line {cited} is not accessible from line {citing}")]
    Inaccessible { cited: LineLabel, citing: LineLabel },
    #[error("the subderivation {top}–{bottom} is not accessible from line {citing}")]
    InaccessibleBlock {
        top: LineLabel,
        bottom: LineLabel,
        citing: LineLabel,
    },
    #[error("line {0} is a premise inside a subderivation")]
    PremiseInSubderivation(LineLabel),
    #[error("premise {premise} comes after line {step}, which is not a premise")]
    PremiseAfterStep { premise: LineLabel, step: LineLabel },
    #[error("line {0} is an assumption but does not start a subderivation")]
    AssumptionAtTopLevel(LineLabel),
}

impl Derivation {
    fn label(&self, idx: usize) -> LineLabel {
        self.lines[idx].label
    }

    /// Whether the line opens a subderivation.
    pub fn opens_scope(&self, idx: usize) -> bool {
        self.path(idx).last() == Some(&idx)
    }

    /// Whether `cited` is an earlier line in the same or an enclosing scope.
    pub fn is_accessible(&self, citing: usize, cited: usize) -> bool {
        cited < citing && is_prefix(self.path(cited), self.path(citing))
    }

    pub fn check_accessible(&self, citing: usize, cited: usize) -> Result<(), StructureError> {
        if self.is_accessible(citing, cited) {
            Ok(())
        } else {
            Err(StructureError::Inaccessible {
                cited: self.label(cited),
                citing: self.label(citing),
            })
        }
    }

    /// Whether `top..=bottom` is a well-formed subderivation.
    pub fn is_subderivation(&self, top: usize, bottom: usize) -> Result<(), StructureError> {
        let (top_label, bottom_label) = (self.label(top), self.label(bottom));
        if bottom < top {
            return Err(StructureError::Reversed {
                top: top_label,
                bottom: bottom_label,
            });
        }
        if !self.opens_scope(top) {
            return Err(StructureError::NotAssumption(top_label));
        }

        let scope = self.path(top);
        for k in top + 1..=bottom {
            let path = self.path(k);
            if path.len() < scope.len() {
                return Err(StructureError::LeavesScope {
                    top: top_label,
                    line: self.label(k),
                });
            }
            if !is_prefix(scope, path) {
                return Err(StructureError::SiblingAssumption {
                    top: top_label,
                    line: self.label(k),
                });
            }
        }

        if self.path(bottom).len() != scope.len() {
            return Err(StructureError::DepthMismatch {
                top: top_label,
                bottom: bottom_label,
            });
        }
        Ok(())
    }

    /// The last line of the innermost subderivation containing `idx`, or the
    /// last line of the derivation for a line outside every subderivation.
    pub fn last_line_at_scope(&self, idx: usize) -> usize {
        let scope = self.path(idx);
        if scope.is_empty() {
            return self.len() - 1;
        }
        (idx..self.len())
            .take_while(|&k| is_prefix(scope, self.path(k)))
            .last()
            .unwrap_or(idx)
    }

    /// Whether `citing` may cite the subderivation `top..=bottom`: the block
    /// is complete and closed, and the scope around it is still open.
    pub fn is_accessible_subderivation(
        &self,
        citing: usize,
        top: usize,
        bottom: usize,
    ) -> Result<(), StructureError> {
        self.is_subderivation(top, bottom)?;

        let last = self.last_line_at_scope(top);
        if last != bottom {
            return Err(StructureError::NotClosed {
                top: self.label(top),
                bottom: self.label(bottom),
                last: self.label(last),
            });
        }

        let scope = self.path(top);
        let parent = scope.take(scope.len() - 1);
        if citing <= bottom || !is_prefix(&parent, self.path(citing)) {
            return Err(StructureError::InaccessibleBlock {
                top: self.label(top),
                bottom: self.label(bottom),
                citing: self.label(citing),
            });
        }
        Ok(())
    }

    /// Premises and assumptions still in force at `citing`.
    pub fn undischarged_assumptions(&self, citing: usize) -> Vec<usize> {
        (0..citing)
            .filter(|&k| {
                let role = self.lines[k].role;
                (role == LineRole::Premise || role == LineRole::Assumption)
                    && self.is_accessible(citing, k)
            })
            .collect()
    }
}

fn is_prefix(prefix: &im::Vector<usize>, path: &im::Vector<usize>) -> bool {
    prefix.len() <= path.len() && prefix.iter().zip(path.iter()).all(|(a, b)| a == b)
}
