use crate::{
    rules::LineReport,
    util::{
        ansi::{ANSI_BOLD, ANSI_GREEN, ANSI_RED, ANSI_RESET},
        plural,
    },
};

/// The outcome of checking one proof file.
pub struct FileReport {
    pub name: String,
    pub ruleset: String,
    pub lines: Vec<LineReport>,
}

impl FileReport {
    pub fn error_count(&self) -> usize {
        self.lines.iter().filter(|l| !l.valid).count()
    }
}

/// Print the summary for a check run. Returns whether every line was
/// justified.
pub fn display_report(files: &[FileReport], iteration: Option<usize>) -> bool {
    let line_count: usize = files.iter().map(|f| f.lines.len()).sum();
    let error_count: usize = files.iter().map(|f| f.error_count()).sum();
    let correct_count = line_count - error_count;

    match iteration {
        Some(i) => println!(
            "Checked {line_count} line{} in {} file{} (run {i}):",
            plural(line_count),
            files.len(),
            plural(files.len())
        ),
        None => println!(
            "Checked {line_count} line{} in {} file{}:",
            plural(line_count),
            files.len(),
            plural(files.len())
        ),
    }

    println!(
        " {ANSI_GREEN}✓{ANSI_RESET} {ANSI_BOLD}{correct_count}{ANSI_RESET} line{} justified.",
        plural(correct_count)
    );
    if error_count > 0 {
        println!(
            " {ANSI_RED}✗{ANSI_RESET} {ANSI_BOLD}{error_count}{ANSI_RESET} line{} with errors.",
            plural(error_count)
        );
        for file in files.iter().filter(|f| f.error_count() > 0) {
            print!("     - {} ({}):", file.name, file.ruleset);
            for line in file.lines.iter().filter(|l| !l.valid) {
                print!(" {}", line.label);
            }
            println!();
        }
    }

    let all_ok = error_count == 0;

    if all_ok && line_count > 0 {
        println!();
        println!("🎉 Every line is justified! 🎉");
    }

    all_ok
}
