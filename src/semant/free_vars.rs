use thiserror::Error;
use ustr::Ustr;

use crate::semant::expr::Expr;

/// Whether `term` occurs free in `formula`. An occurrence is bound when it
/// sits under a quantifier binding any variable that occurs in `term`.
pub fn is_free_in(term: &Expr, formula: &Expr) -> bool {
    if formula == term {
        return true;
    }
    if let Some((var, body)) = formula.as_quantified() {
        return !term.contains(var) && is_free_in(term, body);
    }
    formula.children().iter().any(|c| is_free_in(term, c))
}

/// How an instance relates to the quantified body it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instantiation {
    /// The variable has no free occurrence; the instance is the body itself.
    Vacuous,
    /// Every free occurrence was replaced by this term.
    Term(Expr),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("the formula is not an instance of the quantified formula")]
    Mismatch,
    #[error("different occurrences of the variable were replaced by different terms")]
    Inconsistent,
    /// The substituted term would be captured by this quantified variable.
    #[error("`{0}` would be captured by a quantifier")]
    Captured(Ustr),
}

/// Decide whether `instance` is `body` with one term substituted for every
/// free occurrence of `variable`.
pub fn instance_term(
    body: &Expr,
    variable: &Expr,
    instance: &Expr,
) -> Result<Instantiation, InstanceError> {
    let mut found = None;
    walk_instance(body, variable, instance, &mut Vec::new(), &mut found)?;
    Ok(match found {
        Some(term) => Instantiation::Term(term),
        None => Instantiation::Vacuous,
    })
}

fn walk_instance(
    body: &Expr,
    variable: &Expr,
    instance: &Expr,
    binders: &mut Vec<Expr>,
    found: &mut Option<Expr>,
) -> Result<(), InstanceError> {
    if body == variable {
        if !instance.is_term() {
            return Err(InstanceError::Mismatch);
        }
        if let Some(captor) = binders.iter().find(|b| instance.contains(b)) {
            return Err(InstanceError::Captured(captor.symbol()));
        }
        return match found.as_ref() {
            Some(term) if term != instance => Err(InstanceError::Inconsistent),
            Some(_) => Ok(()),
            None => {
                *found = Some(instance.clone());
                Ok(())
            }
        };
    }

    if !body.same_head(instance) {
        return Err(InstanceError::Mismatch);
    }

    if let Some((var, inner)) = body.as_quantified() {
        if var != &instance.children()[0] {
            return Err(InstanceError::Mismatch);
        }
        // Rebinding the variable shadows it; nothing below is replaced.
        if var == variable {
            return if inner == &instance.children()[1] {
                Ok(())
            } else {
                Err(InstanceError::Mismatch)
            };
        }
        binders.push(var.clone());
        let res = walk_instance(inner, variable, &instance.children()[1], binders, found);
        binders.pop();
        return res;
    }

    for (b, i) in body.children().iter().zip(instance.children()) {
        walk_instance(b, variable, i, binders, found)?;
    }
    Ok(())
}

/// Whether `after` is `before` with zero or more free occurrences of `from`
/// replaced by `to`.
pub fn is_identity_replacement(before: &Expr, after: &Expr, from: &Expr, to: &Expr) -> bool {
    if before == after {
        return true;
    }
    if before == from && after == to {
        return true;
    }
    if !before.same_head(after) {
        return false;
    }
    if let Some((var, body)) = before.as_quantified() {
        if var != &after.children()[0] || from.contains(var) || to.contains(var) {
            return false;
        }
        return is_identity_replacement(body, &after.children()[1], from, to);
    }
    before
        .children()
        .iter()
        .zip(after.children())
        .all(|(b, a)| is_identity_replacement(b, a, from, to))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{Language, QUANTIFICATIONAL},
        semant::expr::ExprKind,
        parse::parse_str,
    };

    fn q(text: &str) -> Expr {
        parse_str(text, &Language::from_toml(QUANTIFICATIONAL).unwrap()).unwrap()
    }

    fn var(name: &str) -> Expr {
        Expr::leaf(ExprKind::Variable, Ustr::from(name))
    }

    #[test]
    fn freedom() {
        assert!(is_free_in(&var("x"), &q("(Fx ∧ ∀xGx)")));
        assert!(!is_free_in(&var("x"), &q("∀x(Fx → Gx)")));
        assert!(!is_free_in(&var("y"), &q("∀x(Fx → Gx)")));
        assert!(is_free_in(&var("y"), &q("∃x(Fx → Gxy)")));
        // A compound term is bound if any of its variables is.
        assert!(!is_free_in(&q("Fh^1x").children()[0], &q("∀xFh^1x")));
        assert!(is_free_in(&q("Fh^1x").children()[0], &q("∀yFh^1x")));
    }

    #[test]
    fn instances() {
        let all = q("∀x(Fx → Gxb)");
        let (x, body) = all.as_quantified().unwrap();
        assert_eq!(
            instance_term(body, x, &q("(Fa → Gab)")),
            Ok(Instantiation::Term(q("Fa").children()[0].clone()))
        );
        assert_eq!(
            instance_term(body, x, &q("(Fa → Gbb)")),
            Err(InstanceError::Inconsistent)
        );
        assert_eq!(
            instance_term(body, x, &q("(Fa ∧ Gab)")),
            Err(InstanceError::Mismatch)
        );
    }

    #[test]
    fn vacuous_and_shadowed_instances() {
        let all = q("∀x(A ∧ ∀xFx)");
        let (x, body) = all.as_quantified().unwrap();
        assert_eq!(
            instance_term(body, x, &q("(A ∧ ∀xFx)")),
            Ok(Instantiation::Vacuous)
        );
        assert_eq!(
            instance_term(body, x, &q("(A ∧ ∀xFa)")),
            Err(InstanceError::Mismatch)
        );
    }

    #[test]
    fn capture_is_rejected() {
        let all = q("∀x∃yGxy");
        let (x, body) = all.as_quantified().unwrap();
        assert_eq!(
            instance_term(body, x, &q("∃yGyy")),
            Err(InstanceError::Captured(Ustr::from("y")))
        );
        assert!(instance_term(body, x, &q("∃yGzy")).is_ok());
    }

    #[test]
    fn identity_replacements() {
        let a = q("Fa").children()[0].clone();
        let b = q("Fb").children()[0].clone();
        assert!(is_identity_replacement(&q("Gaa"), &q("Gab"), &a, &b));
        assert!(is_identity_replacement(&q("Gaa"), &q("Gbb"), &a, &b));
        assert!(is_identity_replacement(&q("Gaa"), &q("Gaa"), &a, &b));
        assert!(!is_identity_replacement(&q("Gaa"), &q("Gba"), &b, &a));
        assert!(is_identity_replacement(&q("∀xGxa"), &q("∀xGxb"), &a, &b));

        let x = q("Fx").children()[0].clone();
        assert!(!is_identity_replacement(&q("∀xGxa"), &q("∀xGaa"), &x, &a));
    }
}
