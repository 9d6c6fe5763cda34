use indoc::indoc;

use crate::{
    derivation::LineLabel,
    proof_file::ProofFile,
    rules::{CheckError, Checker},
    ruleset::Registry,
};

const CONTRAPOSITION: &str = indoc! {r#"
    ruleset = "ND"

    [[line]]
    formula = "(A → B)"
    citation = "PR"

    [[line]]
    depth = 1
    formula = "~B"
    citation = "A (g, →I)"

    [[line]]
    depth = 2
    formula = "A"
    citation = "A (c, ~I)"

    [[line]]
    depth = 2
    formula = "B"
    citation = "1, 3 →E"

    [[line]]
    depth = 2
    formula = "⊥"
    citation = "4, 2 ⊥I"

    [[line]]
    depth = 1
    formula = "~A"
    citation = "3-5 ~I"

    [[line]]
    formula = "(~B → ~A)"
    citation = "2-6 →I"
"#};

#[test]
fn test_checks_a_proof_file() {
    let registry = Registry::builtin().unwrap();
    let proof = ProofFile::parse(CONTRAPOSITION).unwrap();
    let ruleset = registry.ruleset(proof.ruleset.as_deref().unwrap()).unwrap();
    let reports = Checker::new(ruleset, proof.raw_lines()).check_all();
    assert_eq!(reports.len(), 7);
    assert!(reports.iter().all(|r| r.valid), "{:?}", reports);
}

#[test]
fn test_labels_from_the_file_are_cited() {
    let text = indoc! {r#"
        [[line]]
        label = "1a"
        formula = "A"
        citation = "PR"

        [[line]]
        label = "1b"
        formula = "B"
        citation = "PR"

        [[line]]
        formula = "(A ∧ B)"
        citation = "1a, 1b ∧I"

        [[line]]
        formula = "(B ∧ A)"
        citation = "1b, 1 ∧I"
    "#};
    let registry = Registry::builtin().unwrap();
    let proof = ProofFile::parse(text).unwrap();
    let reports = Checker::new(registry.ruleset("ND").unwrap(), proof.raw_lines()).check_all();

    assert!(reports[2].valid);
    assert_eq!(reports[2].label, LineLabel::new(3, None));
    assert_eq!(
        reports[3].error,
        Some(CheckError::UnknownLabel(LineLabel::new(1, None)))
    );

    let span = proof.lines[3].citation_span.clone();
    assert_eq!(&text[span], "\"1b, 1 ∧I\"");
}

#[test]
fn test_user_ruleset_with_generic_assumptions() {
    let mut registry = Registry::builtin().unwrap();
    registry
        .load_ruleset(indoc! {r#"
            name = "ND-lax"
            description = "ND without exit strategies"
            extends = "ND"
            generic_assumptions = true
        "#})
        .unwrap();

    let proof = indoc! {r#"
        [[line]]
        depth = 1
        formula = "A"
        citation = "A"

        [[line]]
        formula = "(A → A)"
        citation = "1-1 →I"
    "#};
    let lines = ProofFile::parse(proof).unwrap().raw_lines();

    let lax = Checker::new(registry.ruleset("ND-lax").unwrap(), lines.clone()).check_all();
    assert!(lax[0].valid);

    let strict = Checker::new(registry.ruleset("ND").unwrap(), lines).check_all();
    assert!(!strict[0].valid);
}
