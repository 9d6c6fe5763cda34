use indoc::indoc;
use ustr::Ustr;

use crate::{
    rules::{CheckError, Culprit},
    tests::common::{assert_all_valid, check, error_on},
};

#[test]
fn test_derived_rules() {
    let reports = check(
        "ND+",
        indoc! {"
            (A → B) ; PR
            ~B      ; PR
            ~A      ; 1, 2 MT
            (A ∨ C) ; PR
            C       ; 4, 3 DS
            (B → D) ; PR
            (A → D) ; 6, 1 HS
        "},
    );
    assert_all_valid(&reports);
}

#[test]
fn test_rules_are_inherited() {
    let reports = check(
        "ND+",
        indoc! {"
            (A → B) ; PR
            A       ; PR
            B       ; 1, 2 →E
        "},
    );
    assert_all_valid(&reports);
}

#[test]
fn test_replacement_anywhere_in_the_line() {
    let reports = check(
        "ND+",
        indoc! {"
            (C → (A ∧ B))  ; PR
            (C → (B ∧ A))  ; 1 Com
            (~C ∨ (B ∧ A)) ; 2 Impl
            ~~(~C ∨ (B ∧ A)) ; 3 DN
            (~C ∨ (B ∧ A)) ; 4 DN
        "},
    );
    assert_all_valid(&reports);
}

#[test]
fn test_replacement_must_follow_an_equivalence() {
    let reports = check(
        "ND+",
        indoc! {"
            (A ∧ B) ; PR
            (B ∨ A) ; 1 Com
            (B ∧ A) ; 1 DeM
        "},
    );
    assert!(matches!(error_on(&reports, 2), CheckError::FormMismatch(_)));
    assert!(matches!(error_on(&reports, 3), CheckError::FormMismatch(_)));
}

#[test]
fn test_quantifier_passage_side_condition() {
    let reports = check(
        "NDQ",
        indoc! {"
            (∀xFx ∧ Ga)  ; PR
            ∀x(Fx ∧ Ga)  ; 1 QP
            (∀xFx ∧ Gx)  ; PR
            ∀x(Fx ∧ Gx)  ; 3 QP
        "},
    );
    assert!(reports[0].valid && reports[1].valid && reports[2].valid);
    match error_on(&reports, 4) {
        CheckError::FreeVariableCapture {
            variable,
            culprit: Culprit::Formula(formula),
        } => {
            assert_eq!(*variable, Ustr::from("x"));
            assert_eq!(formula.to_string(), "Gx");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_failed_replacement_names_the_closest_equivalence() {
    let reports = check(
        "NDQ",
        indoc! {"
            (∃xFx → Ga)  ; PR
            ∀x(Fx → Gb)  ; 1 QP
        "},
    );
    let CheckError::FormMismatch(mismatch) = error_on(&reports, 2) else {
        panic!("expected a mismatch");
    };
    assert_eq!(
        mismatch.expected,
        "line 1 with one part (∃𝓍𝒫 → 𝒬) rewritten as ∀𝓍(𝒫 → 𝒬)"
    );
}

#[test]
fn test_quantifier_negation() {
    let reports = check(
        "NDQ",
        indoc! {"
            ~∀xFx ; PR
            ∃x~Fx ; 1 QN
            ∀x~Fx ; 1 QN
        "},
    );
    assert!(reports[1].valid);
    assert!(!reports[2].valid);
}
