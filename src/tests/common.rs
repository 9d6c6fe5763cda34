use crate::{
    derivation::LineLabel,
    rules::{CheckError, Checker, LineReport, RawLine},
    ruleset::Registry,
};

/// Reads a derivation written one line per row as `formula ; citation`,
/// with one leading `|` per level of subderivation.
pub fn derivation(text: &str) -> Vec<RawLine> {
    text.lines()
        .filter(|row| !row.trim().is_empty())
        .map(|row| {
            let mut rest = row.trim_start();
            let mut depth = 0;
            while let Some(inner) = rest.strip_prefix('|') {
                depth += 1;
                rest = inner.trim_start();
            }
            let (formula, citation) = rest
                .split_once(';')
                .unwrap_or_else(|| panic!("row without a citation: {row}"));
            RawLine::new(depth, formula.trim(), citation.trim())
        })
        .collect()
}

/// Checks every line of `text` under the named built-in ruleset.
pub fn check(ruleset: &str, text: &str) -> Vec<LineReport> {
    let registry = Registry::builtin().unwrap();
    let ruleset = registry
        .ruleset(ruleset)
        .unwrap_or_else(|| panic!("no ruleset {ruleset}"));
    Checker::new(ruleset, derivation(text)).check_all()
}

pub fn label(n: u32) -> LineLabel {
    LineLabel::new(n, None)
}

/// Panics with the diagnostics of every line that failed.
pub fn assert_all_valid(reports: &[LineReport]) {
    let failures: Vec<String> = reports
        .iter()
        .filter(|r| !r.valid)
        .map(|r| format!("line {}: {}", r.label, r.diagnostic))
        .collect();
    assert!(failures.is_empty(), "{}", failures.join("\n"));
}

/// The error on line `n`, 1-based.
pub fn error_on(reports: &[LineReport], n: usize) -> &CheckError {
    let report = &reports[n - 1];
    report
        .error
        .as_ref()
        .unwrap_or_else(|| panic!("line {} was accepted", report.label))
}
