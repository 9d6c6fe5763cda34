use thiserror::Error;

use crate::semant::{
    expr::Expr,
    matcher::{BindingSession, matches},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplacementFailure {
    #[error("the line is not the cited line with one part replaced")]
    NotAReplacement,
    /// The shapes fit but the side condition rejected every fitting binding.
    #[error("the replacement violates its side condition")]
    SideCondition(BindingSession),
}

/// Whether `after` is `before` with one subformula occurrence matching `left`
/// replaced by the corresponding instance of `right`. Only this direction is
/// tried; callers wanting both swap `left` and `right`.
pub fn replacement_check(left: &Expr, right: &Expr, before: &Expr, after: &Expr) -> bool {
    replacement_check_with(left, right, before, after, |_| true).is_ok()
}

/// As [`replacement_check`], additionally requiring `side` to accept the
/// bindings of the replaced occurrence. Returns those bindings.
pub fn replacement_check_with<F>(
    left: &Expr,
    right: &Expr,
    before: &Expr,
    after: &Expr,
    side: F,
) -> Result<BindingSession, ReplacementFailure>
where
    F: Fn(&BindingSession) -> bool,
{
    let mut search = Search {
        left,
        right,
        side: &side,
        rejected: None,
    };

    match search.find(before, after) {
        Some(session) => Ok(session),
        None => match search.rejected {
            Some(session) => Err(ReplacementFailure::SideCondition(session)),
            None => Err(ReplacementFailure::NotAReplacement),
        },
    }
}

struct Search<'a> {
    left: &'a Expr,
    right: &'a Expr,
    side: &'a dyn Fn(&BindingSession) -> bool,
    rejected: Option<BindingSession>,
}

impl Search<'_> {
    fn find(&mut self, before: &Expr, after: &Expr) -> Option<BindingSession> {
        let mut session = BindingSession::new();
        if matches(self.left, before, &mut session) && matches(self.right, after, &mut session) {
            if (self.side)(&session) {
                return Some(session);
            }
            self.rejected.get_or_insert(session);
        }

        if !before.same_head(after) {
            return None;
        }

        let differing: Vec<usize> = (0..before.arity())
            .filter(|&i| before.children()[i] != after.children()[i])
            .collect();

        match differing.as_slice() {
            [] => before
                .children()
                .iter()
                .find_map(|c| self.find(c, c)),
            [i] => self.find(&before.children()[*i], &after.children()[*i]),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lang::{Language, META, QUANTIFICATIONAL},
        parse::parse_str,
        semant::free_vars::is_free_in,
    };
    use ustr::Ustr;

    fn meta(text: &str) -> Expr {
        parse_str(text, &Language::from_toml(META).unwrap()).unwrap()
    }

    fn object(text: &str) -> Expr {
        parse_str(text, &Language::from_toml(QUANTIFICATIONAL).unwrap()).unwrap()
    }

    fn either_way(left: &str, right: &str, before: &str, after: &str) -> bool {
        let (left, right) = (meta(left), meta(right));
        let (before, after) = (object(before), object(after));
        replacement_check(&left, &right, &before, &after)
            || replacement_check(&right, &left, &before, &after)
    }

    #[test]
    fn whole_formula_replacement() {
        assert!(either_way("(𝒫 ∧ 𝒬)", "(𝒬 ∧ 𝒫)", "(P ∧ Q)", "(Q ∧ P)"));
        assert!(!either_way("(𝒫 ∧ 𝒬)", "(𝒬 ∧ 𝒫)", "(P ∧ Q)", "(Q ∨ P)"));
    }

    #[test]
    fn nested_replacement() {
        assert!(either_way(
            "~~𝒫",
            "𝒫",
            "(A → ~(B ∨ ~~C))",
            "(A → ~(B ∨ C))"
        ));
        assert!(either_way("~~𝒫", "𝒫", "(A → ~(B ∨ C))", "(A → ~(B ∨ ~~C))"));
    }

    #[test]
    fn only_one_occurrence_changes() {
        assert!(!either_way("~~𝒫", "𝒫", "(~~A ∧ ~~B)", "(A ∧ B)"));
        assert!(either_way("~~𝒫", "𝒫", "(~~A ∧ ~~B)", "(A ∧ ~~B)"));
    }

    #[test]
    fn unchanged_formula_can_be_a_replacement() {
        assert!(either_way("(𝒫 ∧ 𝒬)", "(𝒬 ∧ 𝒫)", "(B → (A ∧ A))", "(B → (A ∧ A))"));
        assert!(!either_way("(𝒫 ∧ 𝒬)", "(𝒬 ∧ 𝒫)", "(B → A)", "(B → A)"));
    }

    #[test]
    fn side_condition_failures_are_reported() {
        let left = meta("∀𝓍(𝒫 ∧ 𝒬)");
        let right = meta("(∀𝓍𝒫 ∧ 𝒬)");
        let x_not_free_in_q = |s: &BindingSession| {
            match (s.get(Ustr::from("𝓍")), s.get(Ustr::from("𝒬"))) {
                (Some(x), Some(q)) => !is_free_in(x, q),
                _ => false,
            }
        };

        let ok = replacement_check_with(
            &left,
            &right,
            &object("∀x(Fx ∧ Ga)"),
            &object("(∀xFx ∧ Ga)"),
            x_not_free_in_q,
        );
        assert!(ok.is_ok());

        let captured = replacement_check_with(
            &left,
            &right,
            &object("∀x(Fx ∧ Gx)"),
            &object("(∀xFx ∧ Gx)"),
            x_not_free_in_q,
        );
        assert!(matches!(captured, Err(ReplacementFailure::SideCondition(_))));
    }
}
