use crate::{
    cli::CliError,
    lang::Language,
    parse::{StyledText, parse},
    ruleset::Registry,
    semant::expr::Expr,
    util::ansi::{ANSI_BOLD, ANSI_GRAY, ANSI_RED, ANSI_RESET},
};
use argh::FromArgs;

/// Parse formulas and print how they were read.
#[derive(FromArgs)]
#[argh(subcommand, name = "parse")]
pub struct ParseCommand {
    /// the formula text; `^` and `_` mark superscripts and subscripts.
    #[argh(positional)]
    formula: String,

    /// the language to read it in: sentential, quantificational or meta.
    #[argh(option, short = 'l', default = "String::from(\"quantificational\")")]
    language: String,
}

pub fn run_parse(cmd: ParseCommand) -> Result<bool, CliError> {
    let registry = Registry::builtin()?;
    let lang = registry
        .language(&cmd.language)
        .ok_or_else(|| CliError::UnknownLanguage(cmd.language.clone()))?;

    let text = StyledText::from_markup(&cmd.formula);
    match parse(&text, lang) {
        Ok(exprs) => {
            for expr in exprs {
                println!("{ANSI_BOLD}{}{ANSI_RESET}", expr.display(lang));
                print!("{}", tree(&expr, lang));
            }
            Ok(true)
        }
        Err(err) => {
            println!("{ANSI_RED}{ANSI_BOLD}error:{ANSI_RESET} {err}");
            Ok(false)
        }
    }
}

fn tree(expr: &Expr, lang: &Language) -> String {
    let mut out = String::new();
    write_node(expr, lang, 0, &mut out);
    out
}

fn write_node(expr: &Expr, lang: &Language, depth: usize, out: &mut String) {
    let indent = "  ".repeat(depth);
    let kind = format!("{:?}", expr.kind());
    if expr.children().is_empty() {
        out.push_str(&format!("{indent}{} {ANSI_GRAY}{kind}{ANSI_RESET}\n", expr.symbol()));
    } else {
        out.push_str(&format!(
            "{indent}{} {ANSI_GRAY}{kind} {}{ANSI_RESET}\n",
            expr.symbol(),
            expr.display(lang)
        ));
        for child in expr.children() {
            write_node(child, lang, depth + 1, out);
        }
    }
}
