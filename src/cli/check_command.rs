use crate::{
    cli::CliError,
    config::FitchConfig,
    diagnostics::{Report, render},
    derivation::LineLabel,
    proof_file::{ProofFile, ProofFileError},
    report::{FileReport, display_report},
    rules::{CheckError, Checker, LineReport, Subject},
    ruleset::Registry,
    span::{Filename, SourceCache, Span},
};
use argh::FromArgs;
use crossterm::{
    cursor::MoveTo,
    execute,
    terminal::{Clear, ClearType},
};
use itertools::Itertools;
use notify::Watcher;
use std::{
    env, io,
    path::{Path, PathBuf},
    sync::mpsc,
};
use tracing::{debug, info};

const FALLBACK_RULESET: &str = "ND";

/// Check the derivations in one or more proof files.
#[derive(FromArgs)]
#[argh(subcommand, name = "check")]
pub struct CheckCommand {
    /// proof files to check.
    #[argh(positional)]
    proofs: Vec<PathBuf>,

    /// ruleset to check against, overriding the proof files.
    #[argh(option, short = 'r')]
    ruleset: Option<String>,

    /// path to fitch.toml config file.
    #[argh(option, short = 'c')]
    config: Option<PathBuf>,

    /// continually recheck on file changes.
    #[argh(switch, short = 'w')]
    watch: bool,
}

/// Everything one pass over the proof files produced.
struct CheckRun {
    sources: SourceCache,
    files: Vec<FileReport>,
    reports: Vec<Report>,
    /// Files that could not be checked at all.
    broken: usize,
}

impl CheckRun {
    fn print(&self, styled: bool, iteration: Option<usize>) -> bool {
        let all_ok = display_report(&self.files, iteration);
        for report in &self.reports {
            println!();
            println!("{}", render(report, &self.sources, styled));
        }
        all_ok && self.broken == 0
    }
}

pub fn run_check(cmd: CheckCommand) -> Result<bool, CliError> {
    let config = match &cmd.config {
        Some(path) => {
            let path = path.canonicalize().map_err(|source| CliError::Io {
                path: path.clone(),
                source,
            })?;
            FitchConfig::from_file(&path)?
        }
        None => FitchConfig::discover()?,
    };

    if !cmd.watch {
        let run = check(&cmd, &config)?;
        return Ok(run.print(config.italic(), None));
    }

    let (tx, rx) = mpsc::channel::<notify::Result<notify::Event>>();
    let mut watcher = notify::recommended_watcher(tx)?;
    // Editors often replace files on save, so watch the directories.
    for dir in watched_dirs(&cmd.proofs, &config) {
        watcher.watch(&dir, notify::RecursiveMode::NonRecursive)?;
    }

    for i in 1.. {
        let _ = rx.try_iter().count();

        // Clear the screen to print the new info
        _ = execute!(io::stdout(), Clear(ClearType::Purge), MoveTo(0, 0));

        match check(&cmd, &config) {
            Ok(run) => {
                run.print(config.italic(), Some(i));
            }
            Err(err) => println!("error: {err}"),
        }

        loop {
            match rx.recv() {
                Ok(Ok(e)) if matches!(e.kind, notify::EventKind::Access(_)) => continue,
                Ok(Ok(e)) => {
                    if e.paths.iter().any(|p| is_watched_file(p, &cmd.proofs, &config)) {
                        break;
                    }
                }
                Ok(Err(err)) => return Err(err.into()),
                Err(_) => return Ok(false),
            }
        }
    }

    Ok(true)
}

fn watched_dirs(proofs: &[PathBuf], config: &FitchConfig) -> Vec<PathBuf> {
    proofs
        .iter()
        .chain(config.rulesets())
        .filter_map(|p| p.canonicalize().ok())
        .filter_map(|p| p.parent().map(Path::to_path_buf))
        .unique()
        .collect()
}

fn is_watched_file(path: &Path, proofs: &[PathBuf], config: &FitchConfig) -> bool {
    proofs
        .iter()
        .chain(config.rulesets())
        .filter_map(|p| p.canonicalize().ok())
        .any(|p| p == path)
}

fn check(cmd: &CheckCommand, config: &FitchConfig) -> Result<CheckRun, CliError> {
    let mut registry = Registry::builtin()?;
    for path in config.rulesets() {
        let name = registry.load_ruleset_file(path)?;
        info!(ruleset = %name, path = %path.display(), "loaded ruleset");
    }

    let root = env::current_dir().unwrap_or_default();
    let mut run = CheckRun {
        sources: SourceCache::new(root),
        files: Vec::new(),
        reports: Vec::new(),
        broken: 0,
    };

    for path in &cmd.proofs {
        let filename = run.sources.add_path(path).map_err(|source| CliError::Io {
            path: path.clone(),
            source,
        })?;
        let text = run.sources.get_text(filename);

        let proof = match ProofFile::parse(text) {
            Ok(proof) => proof,
            Err(err) => {
                run.reports.push(proof_file_report(&err, filename));
                run.broken += 1;
                continue;
            }
        };

        let name = cmd
            .ruleset
            .as_deref()
            .or(proof.ruleset.as_deref())
            .or(config.default_ruleset())
            .unwrap_or(FALLBACK_RULESET);
        let ruleset = registry
            .ruleset(name)
            .ok_or_else(|| CliError::UnknownRuleset(name.to_string()))?;

        if proof.lines.is_empty() {
            run.reports.push(Report::warning(format!(
                "{} has no lines to check",
                filename.as_str()
            )));
        }

        debug!(file = filename.as_str(), ruleset = name, lines = proof.lines.len(), "checking");
        let lines = Checker::new(ruleset, proof.raw_lines()).check_all();

        for idx in (0..lines.len()).filter(|&i| !lines[i].valid) {
            run.reports
                .push(line_report(&proof, &lines, idx, filename, config.italic()));
        }

        run.files.push(FileReport {
            name: filename.as_str().to_string(),
            ruleset: name.to_string(),
            lines,
        });
    }

    Ok(run)
}

fn proof_file_report(err: &ProofFileError, filename: Filename) -> Report {
    let msg = match err {
        ProofFileError::Toml(err) => err.message().to_string(),
        other => other.to_string(),
    };
    let report = Report::error(format!("{} is not a valid proof file", filename.as_str()));
    match err.span() {
        Some(span) => report.with_error(Span::new(filename, span), msg),
        None => Report::error(format!("{}: {msg}", filename.as_str())),
    }
}

fn line_report(
    proof: &ProofFile,
    reports: &[LineReport],
    idx: usize,
    filename: Filename,
    italic: bool,
) -> Report {
    let (line, report) = (&proof.lines[idx], &reports[idx]);
    let span = match &report.error {
        Some(err) if points_at_citation(err, report) => line.citation_span.clone(),
        _ => line.formula_span.clone(),
    };
    let msg = if italic {
        report.diagnostic.to_ansi()
    } else {
        report.diagnostic.to_string()
    };
    let mut out = Report::error(format!("line {} is not justified", report.label))
        .with_error(Span::new(filename, span), msg);

    if let Some(cited) = report.error.as_ref().and_then(|e| cited_line(e, report))
        && let Some(k) = reports.iter().position(|r| r.label == cited)
    {
        out = out.with_info(
            Span::new(filename, proof.lines[k].formula_span.clone()),
            format!("line {cited}"),
        );
    }
    out
}

/// The other line a failure is about, if there is one.
fn cited_line(err: &CheckError, report: &LineReport) -> Option<LineLabel> {
    match err {
        CheckError::FormMismatch(m) => match m.subject {
            Subject::Cited(label) => Some(label),
            Subject::ThisLine => None,
        },
        CheckError::ParseFailure { label, .. } if *label != report.label => Some(*label),
        CheckError::EmptyCitation(label) => Some(*label),
        _ => None,
    }
}

/// Whether the fault lies in what the line cites rather than in what it
/// asserts.
fn points_at_citation(err: &CheckError, report: &LineReport) -> bool {
    match err {
        CheckError::ParseFailure { label, .. } => *label != report.label,
        CheckError::EmptyLine(_) | CheckError::FreeVariableCapture { .. } => false,
        CheckError::FormMismatch(m) => m.subject != Subject::ThisLine,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::AnnotationTy;
    use indoc::indoc;

    const PROOF: &str = indoc! {r#"
        [[line]]
        formula = "(A → B)"
        citation = "PR"

        [[line]]
        formula = "C"
        citation = "PR"

        [[line]]
        formula = "B"
        citation = "1, 2 →E"

        [[line]]
        formula = "B"
        citation = "1 →E"
    "#};

    fn reports() -> (ProofFile, Vec<LineReport>) {
        let registry = Registry::builtin().unwrap();
        let proof = ProofFile::parse(PROOF).unwrap();
        let lines = Checker::new(registry.ruleset("ND").unwrap(), proof.raw_lines()).check_all();
        (proof, lines)
    }

    #[test]
    fn mismatches_in_cited_lines_point_at_both_lines() {
        let (proof, lines) = reports();
        let file = Filename::new("proof.toml");
        let report = line_report(&proof, &lines, 2, file, false);

        assert_eq!(report.msg, "line 3 is not justified");
        let [error, info] = report.annotations.as_slice() else {
            panic!("expected two annotations");
        };
        assert_eq!(error.ty, AnnotationTy::Error);
        assert_eq!(&PROOF[error.span.range()], "\"1, 2 →E\"");
        assert_eq!(info.ty, AnnotationTy::Info);
        assert_eq!(&PROOF[info.span.range()], "\"C\"");
        assert_eq!(info.msg, "line 2");
    }

    #[test]
    fn citation_shape_points_at_the_citation() {
        let (proof, lines) = reports();
        let report = line_report(&proof, &lines, 3, Filename::new("proof.toml"), false);
        assert_eq!(report.annotations.len(), 1);
        assert_eq!(&PROOF[report.annotations[0].span.range()], "\"1 →E\"");
        assert_eq!(report.annotations[0].msg, "→E cites two lines.");
    }
}
